use crate::blockchain::processor::EventIngestor;
use crate::models::PairEvent;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Ingestion workers sharing one event channel
pub struct WorkerPool {
    workers: Vec<WorkerHandle>,
    sender: mpsc::Sender<PairEvent>,
}

struct WorkerHandle {
    id: usize,
    handle: JoinHandle<()>,
}

impl WorkerPool {
    pub fn new(
        ingestor: Arc<EventIngestor>,
        worker_count: usize,
        capacity: usize,
        shutdown: CancellationToken,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(capacity);
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..worker_count.max(1))
            .map(|id| {
                let worker = Worker {
                    id,
                    ingestor: ingestor.clone(),
                    receiver: receiver.clone(),
                    shutdown: shutdown.clone(),
                };
                let handle = tokio::spawn(async move { worker.run().await });
                WorkerHandle { id, handle }
            })
            .collect();

        Self { workers, sender }
    }

    pub fn get_sender(&self) -> mpsc::Sender<PairEvent> {
        self.sender.clone()
    }

    /// Drop the pool's sender and wait for every worker to drain and exit
    pub async fn join(self) {
        drop(self.sender);
        for worker in self.workers {
            if let Err(e) = worker.handle.await {
                error!("Worker {} panicked: {}", worker.id, e);
            }
        }
    }
}

struct Worker {
    id: usize,
    ingestor: Arc<EventIngestor>,
    receiver: Arc<Mutex<mpsc::Receiver<PairEvent>>>,
    shutdown: CancellationToken,
}

impl Worker {
    async fn run(&self) {
        info!("Worker {} started", self.id);

        loop {
            let event = {
                let mut receiver = self.receiver.lock().await;
                tokio::select! {
                    event = receiver.recv() => event,
                    _ = self.shutdown.cancelled() => None,
                }
            };

            let Some(event) = event else {
                break;
            };

            // A failed event is dropped; the next one may touch other pairs
            match self.ingestor.process(&event).await {
                Ok(Some(_)) => debug!("Worker {} ingested swap on {}", self.id, event.pair_address()),
                Ok(None) => debug!("Worker {} forwarded event on {}", self.id, event.pair_address()),
                Err(e) => error!(
                    "Worker {} failed to process event on {}: {}",
                    self.id,
                    event.pair_address(),
                    e
                ),
            }
        }

        info!("Worker {} shutting down", self.id);
    }
}
