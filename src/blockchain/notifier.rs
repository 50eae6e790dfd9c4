use crate::models::PairEvent;
use tokio::sync::broadcast;
use tracing::debug;

/// Raw swap events forwarded to live subscribers
#[derive(Debug, Clone)]
pub struct LiveEvent {
    pub event: PairEvent,
}

pub struct EventNotifier {
    sender: broadcast::Sender<LiveEvent>,
}

impl EventNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.sender.subscribe()
    }

    /// Fire and forget; having no subscriber is normal
    pub fn notify(&self, event: &PairEvent) {
        let live = LiveEvent { event: event.clone() };
        if self.sender.send(live).is_err() {
            debug!("No live subscribers for event on pair {}", event.pair_address());
        }
    }
}

impl Default for EventNotifier {
    fn default() -> Self {
        Self::new(256)
    }
}
