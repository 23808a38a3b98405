//! Domain-level building blocks shared across the API and resolver crates.
//!
//! Holds the canonical lookup key and address shapes, the response cache
//! that fronts the resolution pipeline, and the environment/telemetry
//! plumbing every binary boots through.

pub mod config;
pub mod model;
pub mod services;

pub use model::*;
pub use services::cache::ResponseCache;
