pub mod cache_gate;

pub use cache_gate::CacheGate;
