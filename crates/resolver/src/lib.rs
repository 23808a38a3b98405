//! Zip-code resolution pipeline: provider adapters over a shared transport,
//! a first-success fan-out across them, and the key-degradation loop that
//! retries broader keys when a round comes back empty.

pub mod degradation;
pub mod fanout;
pub mod http;
pub mod providers;

pub use degradation::{resolve_with_degradation, ResolveError};
pub use fanout::{FanOutResolver, RoundError, RoundResolver};
pub use http::{FetchError, Fetcher, ReqwestFetcher};
pub use providers::{default_providers, AddressProvider, JsonProvider, ProviderResult};
