//! History Types

use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::TITLE_MAX_CHARS;
use crate::logic::detection::DetectionResult;

const TRUNCATION_MARKER: &str = "...";
const DEFAULT_TITLE: &str = "New Chat";
const MESSAGE_TITLE_WORDS: usize = 6;

/// Một bản ghi lịch sử phân tích (hoặc tin nhắn chat)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub title: String,
    /// Creation time, epoch milliseconds
    #[serde(deserialize_with = "epoch_millis")]
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<DetectionResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl HistoryEntry {
    pub fn has_result(&self) -> bool {
        self.result.is_some()
    }

    /// Name shown when the entry is re-opened
    pub fn display_name(&self) -> &str {
        self.filename.as_deref().unwrap_or(&self.title)
    }
}

/// Accepts any JSON number; fractional milliseconds are dropped and
/// out-of-range values clamp to the `i64` range.
fn epoch_millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let number = serde_json::Number::deserialize(deserializer)?;
    if let Some(millis) = number.as_i64() {
        return Ok(millis);
    }
    match number.as_f64() {
        Some(millis) if millis.is_finite() => Ok(millis as i64),
        _ => Err(serde::de::Error::custom("timestamp is not a finite number")),
    }
}

/// Entry plus its relative display time. Only the entry is ever persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryItem {
    #[serde(flatten)]
    pub entry: HistoryEntry,
    pub time: String,
}

/// Title for a file analysis: the filename, cut to 50 characters
pub fn make_title(filename: &str) -> String {
    truncate_title(filename)
}

/// Title for a chat message: its first six words, cut to 50 characters
pub fn message_title(message: &str) -> String {
    let words: Vec<&str> = message.split_whitespace().take(MESSAGE_TITLE_WORDS).collect();
    truncate_title(&words.join(" "))
}

fn truncate_title(text: &str) -> String {
    if text.is_empty() {
        return DEFAULT_TITLE.to_string();
    }

    if text.chars().count() <= TITLE_MAX_CHARS {
        return text.to_string();
    }

    let keep = TITLE_MAX_CHARS - TRUNCATION_MARKER.len();
    let mut title: String = text.chars().take(keep).collect();
    title.push_str(TRUNCATION_MARKER);
    title
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_filename_is_truncated() {
        let filename = format!("{}.mp4", "a".repeat(56));
        assert_eq!(filename.chars().count(), 60);

        let title = make_title(&filename);
        assert_eq!(title.chars().count(), 50);
        assert!(title.ends_with("..."));
        assert_eq!(&title[..47], &filename[..47]);
    }

    #[test]
    fn test_short_and_exact_titles_kept() {
        assert_eq!(make_title("photo.jpg"), "photo.jpg");

        let exact = "b".repeat(50);
        assert_eq!(make_title(&exact), exact);
    }

    #[test]
    fn test_multibyte_truncation() {
        let filename = "ảnh".repeat(20);
        let title = make_title(&filename);
        assert_eq!(title.chars().count(), 50);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn test_message_title() {
        assert_eq!(
            message_title("  How do I   enable two factor authentication for my team  "),
            "How do I enable two factor"
        );
        assert_eq!(message_title("   "), "New Chat");
    }

    #[test]
    fn test_entry_serialization_omits_absent_fields() {
        let entry = HistoryEntry {
            id: "1".to_string(),
            title: "Integration Help".to_string(),
            timestamp: 1_700_000_000_000,
            result: None,
            filename: None,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "id": "1", "title": "Integration Help", "timestamp": 1_700_000_000_000i64 })
        );
    }

    #[test]
    fn test_display_name_prefers_filename() {
        let mut entry = HistoryEntry {
            id: "1".to_string(),
            title: "short...".to_string(),
            timestamp: 0,
            result: None,
            filename: Some("full_name.png".to_string()),
        };
        assert_eq!(entry.display_name(), "full_name.png");
        entry.filename = None;
        assert_eq!(entry.display_name(), "short...");
    }

    #[test]
    fn test_timestamp_accepts_any_number() {
        let float: HistoryEntry =
            serde_json::from_str(r#"{"id":"a","title":"t","timestamp":1759999990000.7}"#).unwrap();
        assert_eq!(float.timestamp, 1_759_999_990_000);

        let huge: HistoryEntry =
            serde_json::from_str(r#"{"id":"b","title":"t","timestamp":18446744073709551615}"#).unwrap();
        assert_eq!(huge.timestamp, i64::MAX);

        let text = serde_json::from_str::<HistoryEntry>(r#"{"id":"c","title":"t","timestamp":"yesterday"}"#);
        assert!(text.is_err());
    }
}
