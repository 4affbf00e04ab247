//! History Panel - List of previous analyses
//!
//! Holds a copy of the stored list for display. Reloads from storage on
//! every `HistoryUpdated` event and refreshes the relative time labels on a
//! timer without touching storage.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::constants::TIME_REFRESH_INTERVAL_SECS;
use crate::logic::events::{AppEvent, EventBus};
use crate::logic::history::{HistoryItem, HistoryStore};

pub struct HistoryPanel {
    store: Arc<HistoryStore>,
    bus: EventBus,
    events: mpsc::UnboundedReceiver<AppEvent>,
    items: Vec<HistoryItem>,
}

impl HistoryPanel {
    pub fn new(store: Arc<HistoryStore>, bus: EventBus) -> Self {
        let events = bus.subscribe();
        let items = store.load_all();
        Self { store, bus, events, items }
    }

    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn reload(&mut self) {
        self.items = self.store.load_all();
    }

    /// Recompute display times from the cached timestamps
    pub fn refresh_times(&mut self) {
        for item in &mut self.items {
            item.time = self.store.relative_time(item.entry.timestamp);
        }
    }

    /// Publish the entry with `id` for the result view. False if unknown.
    /// Queued updates are applied first so entries written since the last
    /// reload can be selected.
    pub fn select(&mut self, id: &str) -> bool {
        self.poll_events();
        match self.items.iter().find(|item| item.entry.id == id) {
            Some(item) => {
                log::debug!("History entry selected: {}", id);
                self.bus.publish(AppEvent::EntrySelected(item.entry.clone()));
                true
            }
            None => {
                log::warn!("History entry {} not found", id);
                false
            }
        }
    }

    /// Apply queued events. Returns true if the list was reloaded.
    pub fn poll_events(&mut self) -> bool {
        let mut changed = false;
        while let Ok(event) = self.events.try_recv() {
            if matches!(event, AppEvent::HistoryUpdated) {
                changed = true;
            }
        }
        if changed {
            self.reload();
        }
        changed
    }

    /// Keep the list fresh until `shutdown` resolves, calling `on_change`
    /// after every reload or time refresh.
    pub async fn run_until<F, S>(mut self, shutdown: S, mut on_change: F)
    where
        F: FnMut(&[HistoryItem]),
        S: Future<Output = ()>,
    {
        let period = Duration::from_secs(TIME_REFRESH_INTERVAL_SECS);
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        tokio::pin!(shutdown);

        on_change(&self.items);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    self.refresh_times();
                    on_change(&self.items);
                }
                event = self.events.recv() => match event {
                    Some(AppEvent::HistoryUpdated) => {
                        self.reload();
                        on_change(&self.items);
                    }
                    Some(AppEvent::EntrySelected(_)) => {}
                    None => break,
                },
            }
        }
    }
}
