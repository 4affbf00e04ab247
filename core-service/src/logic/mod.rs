//! Logic Module - Business Logic
//!
//! - `config` - Runtime configuration (API endpoint, storage backend)
//! - `detection` - Detection API client and result types
//! - `history` - Persisted analysis history
//! - `events` - In-process event bus shared by the views
//! - `views` - Authenticator and history panel state, result rendering

pub mod config;
pub mod detection;
pub mod events;
pub mod history;
pub mod views;
