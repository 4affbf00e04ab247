use std::sync::Arc;

use super::storage::{FileStore, KeyValueStore, MemoryStore};
use super::{HistoryStore, ManualClock};
use crate::constants::{HISTORY_LIMIT, HISTORY_STORAGE_KEY};
use crate::logic::detection::DetectionResult;
use crate::logic::events::{AppEvent, EventBus};

const NOW: i64 = 1_760_000_000_000;

fn store_with(backend: Arc<dyn KeyValueStore>) -> (HistoryStore, Arc<ManualClock>, EventBus) {
    let bus = EventBus::new();
    let clock = Arc::new(ManualClock::new(NOW));
    let store = HistoryStore::with_clock(backend, bus.clone(), clock.clone());
    (store, clock, bus)
}

fn memory_store() -> (HistoryStore, Arc<ManualClock>, Arc<MemoryStore>) {
    let backend = Arc::new(MemoryStore::new());
    let (store, clock, _) = store_with(backend.clone());
    (store, clock, backend)
}

fn sample_result(score: f64) -> DetectionResult {
    serde_json::from_value(serde_json::json!({
        "score": score,
        "anomaly_string": "No Anomaly",
        "malware_flag": false,
        "components": { "visual_score": 0.7, "metadata_keys": 3 }
    }))
    .unwrap()
}

#[test]
fn test_missing_value_seeds_defaults() {
    let (store, _, backend) = memory_store();

    let items = store.load_all();
    let titles: Vec<&str> = items.iter().map(|i| i.entry.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Security Analysis Q4",
            "Authentication Setup",
            "Integration Help",
            "Password Management",
            "2FA Configuration",
        ]
    );
    assert!(items.iter().all(|i| i.entry.result.is_none()));
    assert_eq!(items[0].time, "2 hours ago");
    assert_eq!(items[1].time, "1 day ago");
    assert_eq!(items[4].time, "1 week ago");

    // Defaults are persisted
    assert!(backend.get(HISTORY_STORAGE_KEY).unwrap().is_some());
}

#[test]
fn test_seeding_is_idempotent() {
    let (store, clock, _) = memory_store();

    let first: Vec<_> = store.load_all().into_iter().map(|i| i.entry).collect();
    clock.advance(5_000);
    let second: Vec<_> = store.load_all().into_iter().map(|i| i.entry).collect();

    assert_eq!(first.len(), 5);
    assert_eq!(first, second);
}

#[test]
fn test_corrupt_value_seeds_defaults() {
    let (store, _, backend) = memory_store();
    backend.set(HISTORY_STORAGE_KEY, "{not json").unwrap();

    let items = store.load_all();
    assert_eq!(items.len(), 5);

    let again = store.load_all();
    assert_eq!(
        items.iter().map(|i| &i.entry).collect::<Vec<_>>(),
        again.iter().map(|i| &i.entry).collect::<Vec<_>>()
    );
}

#[test]
fn test_stored_empty_list_is_not_reseeded() {
    let (store, _, backend) = memory_store();
    backend.set(HISTORY_STORAGE_KEY, "[]").unwrap();

    assert!(store.load_all().is_empty());
}

#[test]
fn test_append_puts_new_entry_first() {
    let (store, clock, _) = memory_store();
    let defaults = store.load_all();

    clock.advance(1_000);
    let entry = store.append("clip.mp4", Some(sample_result(0.8)), Some("clip.mp4".to_string()));

    let items = store.load_all();
    assert_eq!(items.len(), defaults.len() + 1);
    assert_eq!(items[0].entry, entry);
    assert_eq!(items[0].time, "Just now");
    assert_eq!(entry.id, (NOW + 1_000).to_string());
    assert_eq!(entry.timestamp, NOW + 1_000);

    let rest: Vec<_> = items[1..].iter().map(|i| &i.entry).collect();
    let before: Vec<_> = defaults.iter().map(|i| &i.entry).collect();
    assert_eq!(rest, before);
}

#[test]
fn test_append_caps_at_limit_dropping_oldest() {
    let (store, clock, backend) = memory_store();
    backend.set(HISTORY_STORAGE_KEY, "[]").unwrap();

    for n in 0..HISTORY_LIMIT {
        clock.advance(1);
        store.append(&format!("file_{}.png", n), None, None);
    }
    let full = store.load_all();
    assert_eq!(full.len(), HISTORY_LIMIT);
    assert_eq!(full.last().unwrap().entry.title, "file_0.png");

    clock.advance(1);
    store.append("file_50.png", None, None);

    let items = store.load_all();
    assert_eq!(items.len(), HISTORY_LIMIT);
    assert_eq!(items[0].entry.title, "file_50.png");
    assert_eq!(items.last().unwrap().entry.title, "file_1.png");
    assert!(items.iter().all(|i| i.entry.title != "file_0.png"));
}

#[test]
fn test_append_over_corrupt_storage_starts_fresh() {
    let (store, _, backend) = memory_store();
    backend.set(HISTORY_STORAGE_KEY, "garbage").unwrap();

    store.append("a.png", None, None);

    let items = store.load_all();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].entry.title, "a.png");
}

#[test]
fn test_same_millisecond_ids_are_unique() {
    let (store, _, backend) = memory_store();
    backend.set(HISTORY_STORAGE_KEY, "[]").unwrap();

    let a = store.append("a", None, None);
    let b = store.append("b", None, None);
    let c = store.append("c", None, None);

    assert_eq!(a.id, NOW.to_string());
    assert_eq!(b.id, format!("{}-1", NOW));
    assert_eq!(c.id, format!("{}-2", NOW));
}

#[test]
fn test_empty_title_defaults() {
    let (store, _, _) = memory_store();
    let entry = store.append("", None, None);
    assert_eq!(entry.title, "New Chat");
}

#[test]
fn test_append_publishes_change() {
    let backend = Arc::new(MemoryStore::new());
    let (store, _, bus) = store_with(backend);
    let mut rx = bus.subscribe();

    store.append("a.png", None, None);

    assert!(matches!(rx.try_recv(), Ok(AppEvent::HistoryUpdated)));
}

#[test]
fn test_clear_reseeds_on_next_load() {
    let (store, _, backend) = memory_store();
    let entry = store.append("a.png", Some(sample_result(0.3)), Some("a.png".to_string()));

    store.clear();
    assert!(backend.get(HISTORY_STORAGE_KEY).unwrap().is_none());

    let items = store.load_all();
    assert_eq!(items.len(), 5);
    assert!(items.iter().all(|i| i.entry.id != entry.id));
}

#[test]
fn test_result_survives_file_backend() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(FileStore::new(dir.path().to_path_buf()));
    let (store, _, _) = store_with(backend.clone());

    let result = sample_result(0.65);
    let entry = store.append("clip.mp4", Some(result.clone()), Some("clip.mp4".to_string()));

    // Fresh store over the same directory
    let (reopened, _, _) = store_with(backend);
    let items = reopened.load_all();
    let loaded = &items.iter().find(|i| i.entry.id == entry.id).unwrap().entry;
    assert_eq!(loaded.result, Some(result));
    assert_eq!(loaded.filename.as_deref(), Some("clip.mp4"));
}

#[test]
fn test_extreme_stored_timestamp_loads() {
    let (store, _, backend) = memory_store();
    backend
        .set(
            HISTORY_STORAGE_KEY,
            r#"[{"id":"old","title":"t","timestamp":-9223372036854775808},
                {"id":"new","title":"t","timestamp":9223372036854775807}]"#,
        )
        .unwrap();

    let items = store.load_all();
    assert_eq!(items.len(), 2);
    assert!(items[0].time.ends_with("weeks ago"));
    assert_eq!(items[1].time, "Just now");
}

#[test]
fn test_unreadable_element_keeps_the_rest() {
    let (store, _, backend) = memory_store();
    backend
        .set(
            HISTORY_STORAGE_KEY,
            r#"[{"id":"1","title":"keep me","timestamp":1759999990000},
                {"id":"2","title":"float time","timestamp":1759999990000.0},
                {"id":"3","title":"no timestamp"},
                42]"#,
        )
        .unwrap();

    let titles: Vec<String> = store.load_all().into_iter().map(|i| i.entry.title).collect();
    assert_eq!(titles, vec!["keep me", "float time"]);

    // Nothing was re-seeded over the user's entries
    let raw = backend.get(HISTORY_STORAGE_KEY).unwrap().unwrap();
    assert!(raw.contains("keep me"));
    assert!(!raw.contains("Security Analysis Q4"));

    // The next append writes back only the readable entries
    store.append("b.png", None, None);
    let titles: Vec<String> = store.load_all().into_iter().map(|i| i.entry.title).collect();
    assert_eq!(titles, vec!["b.png", "keep me", "float time"]);
}

#[test]
fn test_display_time_is_not_persisted() {
    let (store, _, backend) = memory_store();
    store.load_all();

    let raw = backend.get(HISTORY_STORAGE_KEY).unwrap().unwrap();
    assert!(!raw.contains("\"time\""));
    assert!(raw.contains("\"timestamp\""));
}
