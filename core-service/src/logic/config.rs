//! Runtime configuration
//!
//! Gathers the env-backed defaults from `constants` into one value that the
//! command layer hands to the client and the history backend.

use std::path::PathBuf;
use std::time::Duration;

use crate::constants;

/// Which key-value backend holds the history list
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StorageKind {
    /// One JSON file per key under the data directory
    File,
    /// SQLite `kv` table under the data directory
    Sqlite,
    /// Process memory only (nothing survives exit)
    Memory,
}

impl StorageKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "sqlite" => StorageKind::Sqlite,
            "memory" => StorageKind::Memory,
            "file" => StorageKind::File,
            other => {
                log::warn!("Unknown storage backend '{}', falling back to file", other);
                StorageKind::File
            }
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Detection API base URL (without `/detect`)
    pub api_url: String,

    /// Optional request timeout; `None` waits indefinitely
    pub api_timeout: Option<Duration>,

    /// Directory holding persisted history
    pub data_dir: PathBuf,

    /// History backend
    pub storage: StorageKind,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            api_url: constants::get_api_url(),
            api_timeout: constants::get_api_timeout(),
            data_dir: constants::get_data_dir(),
            storage: StorageKind::from_name(&constants::get_storage_backend()),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: constants::DEFAULT_API_URL.to_string(),
            api_timeout: None,
            data_dir: PathBuf::from("."),
            storage: StorageKind::File,
        }
    }
}
