use dashmap::DashMap;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use crate::schema::ApplicationEvent;

const CHANNEL_CAPACITY: usize = 64;

/// Per-match broadcast channels for the live applicant list. A channel exists
/// only while someone is subscribed to it.
#[derive(Default)]
pub struct ApplicationFeed {
    channels: DashMap<Uuid, broadcast::Sender<ApplicationEvent>>,
}

impl ApplicationFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, match_id: Uuid) -> broadcast::Receiver<ApplicationEvent> {
        self.channels
            .entry(match_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Returns how many subscribers received the event.
    pub fn publish(&self, match_id: Uuid, event: ApplicationEvent) -> usize {
        // The shard guard must be released before `release` takes it again.
        let sent = match self.channels.get(&match_id) {
            Some(tx) => tx.send(event).ok(),
            None => return 0,
        };

        match sent {
            Some(n) => n,
            None => {
                self.release(match_id);
                0
            }
        }
    }

    /// Drops the channel for `match_id` once nobody listens to it.
    pub fn release(&self, match_id: Uuid) {
        self.channels
            .remove_if(&match_id, |_, tx| tx.receiver_count() == 0);
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

/// Waits for the next event. A subscriber that fell behind skips what it
/// missed and keeps listening; `None` only once the channel is closed.
pub async fn next_event(
    rx: &mut broadcast::Receiver<ApplicationEvent>,
) -> Option<ApplicationEvent> {
    loop {
        match rx.recv().await {
            Ok(event) => return Some(event),
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!("Feed subscriber lagged, skipped {} events", skipped);
            }
            Err(RecvError::Closed) => return None,
        }
    }
}
