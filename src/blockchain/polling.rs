use crate::blockchain::client::{GatewayClient, LedgerError};
use crate::models::PairEvent;
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const FETCH_RETRIES: usize = 3;

/// Source of pair events, read in batches from a cursor
#[async_trait]
pub trait EventFeed: Send + Sync {
    async fn fetch_events(&self, from: u64, size: usize) -> Result<Vec<PairEvent>, LedgerError>;
}

#[async_trait]
impl EventFeed for GatewayClient {
    async fn fetch_events(&self, from: u64, size: usize) -> Result<Vec<PairEvent>, LedgerError> {
        self.get_events(from, size).await
    }
}

/// Poll the feed and push events to the ingestion workers until cancelled.
///
/// The cursor only advances past a batch once every event in it has been
/// queued. A fetch is retried with backoff, then the same batch is tried
/// again on the next tick.
pub async fn start_event_polling(
    feed: Arc<dyn EventFeed>,
    sender: mpsc::Sender<PairEvent>,
    poll_interval: Duration,
    batch_size: usize,
    shutdown: CancellationToken,
) {
    info!("Starting event polling every {:?}", poll_interval);

    let mut cursor: u64 = 0;
    let mut ticker = interval(poll_interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let fetch = || feed.fetch_events(cursor, batch_size);
                let fetched = fetch
                    .retry(ExponentialBuilder::default().with_max_times(FETCH_RETRIES))
                    .notify(|e: &LedgerError, after: Duration| {
                        warn!("Event fetch from {} failed, retrying in {:?}: {}", cursor, after, e)
                    })
                    .await;
                let events = match fetched {
                    Ok(events) => events,
                    Err(e) => {
                        error!("Failed to fetch events from {}: {}", cursor, e);
                        continue;
                    }
                };

                if events.is_empty() {
                    continue;
                }

                let count = events.len();
                for event in events {
                    if sender.send(event).await.is_err() {
                        info!("Ingestion channel closed, stopping event polling");
                        return;
                    }
                }

                cursor += count as u64;
                debug!("Queued {} events, cursor at {}", count, cursor);
            }
            _ = shutdown.cancelled() => {
                info!("Shutting down event polling");
                break;
            }
        }
    }
}
