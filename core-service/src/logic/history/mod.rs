//! History Module - Persisted list of past analyses
//!
//! # Architecture
//! - `types.rs`: `HistoryEntry`, `HistoryItem`, title helpers
//! - `storage.rs`: `KeyValueStore` backends (file, SQLite, memory)
//! - `relative_time.rs`: "N minutes ago" labels
//! - `clock.rs`: injectable time source
//!
//! # Failure Strategy
//! Storage is never allowed to break the analysis flow. A stored value that
//! is not a JSON array is logged and treated as empty (on append) or replaced
//! by the default entries (on load). Single elements that fail to decode are
//! skipped, keeping the rest. Failed writes are logged and dropped.
//!
//! The read-modify-write in `append` is serialized inside one process only.
//! Two processes sharing a data directory can still lose each other's inserts.

pub mod clock;
pub mod relative_time;
pub mod storage;
pub mod types;
#[cfg(test)]
mod tests;

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::constants::{HISTORY_LIMIT, HISTORY_STORAGE_KEY};
use crate::logic::detection::DetectionResult;
use crate::logic::events::{AppEvent, EventBus};

#[cfg(test)]
pub use clock::ManualClock;
pub use clock::{Clock, SystemClock};
pub use relative_time::format_relative_time;
pub use storage::{KeyValueStore, StorageError};
pub use types::{make_title, message_title, HistoryEntry, HistoryItem};

// ============================================================================
// CONSTANTS
// ============================================================================

const HOUR_MS: i64 = 60 * 60 * 1000;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Placeholder entries written on first use: (id, title, age)
const DEFAULT_ENTRIES: [(&str, &str, i64); 5] = [
    ("1", "Security Analysis Q4", 2 * HOUR_MS),
    ("2", "Authentication Setup", DAY_MS),
    ("3", "Integration Help", 2 * DAY_MS),
    ("4", "Password Management", 3 * DAY_MS),
    ("5", "2FA Configuration", 7 * DAY_MS),
];

// ============================================================================
// HISTORY STORE
// ============================================================================

pub struct HistoryStore {
    backend: Arc<dyn KeyValueStore>,
    bus: EventBus,
    clock: Arc<dyn Clock>,
    write_lock: Mutex<()>,
    limit: usize,
}

impl HistoryStore {
    pub fn new(backend: Arc<dyn KeyValueStore>, bus: EventBus) -> Self {
        Self::with_clock(backend, bus, Arc::new(SystemClock))
    }

    pub fn with_clock(backend: Arc<dyn KeyValueStore>, bus: EventBus, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend,
            bus,
            clock,
            write_lock: Mutex::new(()),
            limit: HISTORY_LIMIT,
        }
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Relative label for `timestamp` as of now
    pub fn relative_time(&self, timestamp: i64) -> String {
        format_relative_time(timestamp, self.now_millis())
    }

    /// Record a new entry at the front of the list and notify listeners
    pub fn append(
        &self,
        title: &str,
        result: Option<DetectionResult>,
        filename: Option<String>,
    ) -> HistoryEntry {
        let entry = {
            let _guard = self.write_lock.lock();

            let mut entries = match self.read_entries() {
                Ok(Some(entries)) => entries,
                Ok(None) => Vec::new(),
                Err(e) => {
                    log::error!("Error parsing stored history, starting fresh: {}", e);
                    Vec::new()
                }
            };

            let timestamp = self.now_millis();
            let entry = HistoryEntry {
                id: unique_id(timestamp, &entries),
                title: if title.is_empty() { "New Chat".to_string() } else { title.to_string() },
                timestamp,
                result,
                filename,
            };

            entries.insert(0, entry.clone());
            entries.truncate(self.limit);

            if let Err(e) = self.write_entries(&entries) {
                log::error!("Error saving history: {}", e);
            }

            entry
        };

        log::info!("History entry added: {} ({})", entry.title, entry.id);
        self.bus.publish(AppEvent::HistoryUpdated);
        entry
    }

    /// All entries, newest first, with display times computed now.
    /// Seeds the default entries when nothing readable is stored.
    pub fn load_all(&self) -> Vec<HistoryItem> {
        let entries = {
            let _guard = self.write_lock.lock();

            match self.read_entries() {
                Ok(Some(entries)) => entries,
                Ok(None) => self.seed_defaults(),
                Err(e) => {
                    log::error!("Error loading history from storage: {}", e);
                    self.seed_defaults()
                }
            }
        };

        let now = self.now_millis();
        entries
            .into_iter()
            .map(|entry| HistoryItem {
                time: format_relative_time(entry.timestamp, now),
                entry,
            })
            .collect()
    }

    /// Drop the stored list. The next `load_all` re-seeds.
    pub fn clear(&self) {
        {
            let _guard = self.write_lock.lock();
            if let Err(e) = self.backend.remove(HISTORY_STORAGE_KEY) {
                log::error!("Error clearing history: {}", e);
            }
        }

        log::info!("History cleared");
        self.bus.publish(AppEvent::HistoryUpdated);
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    /// Fails only when the stored value is not a JSON array. Elements that
    /// do not decode as entries are skipped so the rest of the list survives.
    fn read_entries(&self) -> Result<Option<Vec<HistoryEntry>>, StorageError> {
        let Some(raw) = self.backend.get(HISTORY_STORAGE_KEY)? else {
            return Ok(None);
        };

        let values: Vec<serde_json::Value> = serde_json::from_str(&raw)?;
        let entries = values
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value::<HistoryEntry>(value) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("Skipping unreadable history entry #{}: {}", index, e);
                    None
                }
            })
            .collect();

        Ok(Some(entries))
    }

    fn write_entries(&self, entries: &[HistoryEntry]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(entries)?;
        self.backend.set(HISTORY_STORAGE_KEY, &raw)
    }

    /// Caller holds `write_lock`
    fn seed_defaults(&self) -> Vec<HistoryEntry> {
        let now = self.now_millis();
        let entries: Vec<HistoryEntry> = DEFAULT_ENTRIES
            .iter()
            .map(|(id, title, age)| HistoryEntry {
                id: id.to_string(),
                title: title.to_string(),
                timestamp: now - age,
                result: None,
                filename: None,
            })
            .collect();

        if let Err(e) = self.write_entries(&entries) {
            log::error!("Error saving default history: {}", e);
        }

        log::info!("History seeded with {} default entries", entries.len());
        entries
    }
}

/// Id from the creation millisecond, suffixed if that id is already taken
fn unique_id(timestamp: i64, existing: &[HistoryEntry]) -> String {
    let taken: HashSet<&str> = existing.iter().map(|e| e.id.as_str()).collect();

    let base = timestamp.to_string();
    if !taken.contains(base.as_str()) {
        return base;
    }

    let mut n = 1;
    loop {
        let candidate = format!("{}-{}", base, n);
        if !taken.contains(candidate.as_str()) {
            return candidate;
        }
        n += 1;
    }
}
