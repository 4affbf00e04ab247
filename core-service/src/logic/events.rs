//! Event Bus - In-process publish/subscribe between views
//!
//! The bus is an explicit value handed to every publisher and subscriber.
//! Each subscriber owns an unbounded queue, so publishing never blocks and
//! works from sync code (the history store publishes from inside `append`).

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::logic::history::HistoryEntry;

/// Events exchanged between the history store and the views
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The persisted history changed; listeners should reload it
    HistoryUpdated,
    /// The user picked a history entry to re-open
    EntrySelected(HistoryEntry),
}

#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<AppEvent>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new listener
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<AppEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Deliver `event` to every live subscriber; returns how many received it.
    /// Subscribers whose receiver was dropped are pruned here.
    pub fn publish(&self, event: AppEvent) -> usize {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());

        if subscribers.is_empty() {
            log::debug!("No subscribers, event dropped: {:?}", event);
        }

        subscribers.len()
    }
}
