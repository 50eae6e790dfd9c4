pub mod client;
pub mod models;
pub mod notifier;
pub mod polling;
pub mod processor;
pub mod worker_pool;

// Re-exports for convenience
pub use client::{GatewayClient, LedgerArg, LedgerError, LedgerReader, StorageKey};
pub use notifier::{EventNotifier, LiveEvent};
pub use polling::{start_event_polling, EventFeed};
pub use processor::EventIngestor;
pub use worker_pool::WorkerPool;
