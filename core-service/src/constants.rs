//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! To change the default detection API server, only edit this file.

use std::path::PathBuf;
use std::time::Duration;

/// Default detection API base URL
///
/// This is the fallback when `DEEPSECURE_API_URL` is not set.
/// The `/detect` and `/api/health` paths are appended to it.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Storage key holding the serialized history list
pub const HISTORY_STORAGE_KEY: &str = "deepsecure_previous_chats";

/// Maximum number of history entries kept
pub const HISTORY_LIMIT: usize = 50;

/// Maximum title length (in characters) before truncation
pub const TITLE_MAX_CHARS: usize = 50;

/// Interval for refreshing relative "N minutes ago" labels (seconds)
pub const TIME_REFRESH_INTERVAL_SECS: u64 = 60;

/// Upload size the detection API accepts (100 MB)
pub const ADVERTISED_MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "DeepSecure";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get detection API base URL from environment or use default
pub fn get_api_url() -> String {
    std::env::var("DEEPSECURE_API_URL")
        .map(|s| s.trim_end_matches('/').to_string())
        .unwrap_or_else(|_| DEFAULT_API_URL.to_string())
}

/// Get request timeout from environment. Unset means no timeout.
pub fn get_api_timeout() -> Option<Duration> {
    std::env::var("DEEPSECURE_API_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

/// Get data directory from environment or use the platform default
pub fn get_data_dir() -> PathBuf {
    std::env::var("DEEPSECURE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_NAME)
        })
}

/// Get storage backend name from environment ("file" or "sqlite")
pub fn get_storage_backend() -> String {
    std::env::var("DEEPSECURE_STORAGE")
        .map(|s| s.to_lowercase())
        .unwrap_or_else(|_| "file".to_string())
}
