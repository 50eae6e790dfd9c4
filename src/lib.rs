pub mod blockchain;
pub mod cache;
pub mod compute;
pub mod config;
pub mod contracts;
pub mod db;
pub mod models;
pub mod providers;
pub mod state;
pub mod validation;
pub mod warmer;

#[cfg(test)]
pub mod tests;

// Re-export specific items for convenience
pub use cache::{CacheAside, CacheKey, CacheStore, CacheTtlInfo, TtlPair};
pub use compute::ComputeError;
pub use config::Config;
pub use db::connection;
pub use db::migration;
pub use state::{AppState, Backends};
pub use validation::{validate_address, ValidationError};
