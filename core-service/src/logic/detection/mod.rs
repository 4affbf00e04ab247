//! Detection Module - External Detection API
//!
//! # Components
//! - `types.rs`: `DetectionResult` and its optional component breakdown
//! - `upload.rs`: `FileUpload` (name, media type, content)
//! - `client.rs`: `DetectionClient` (`POST /detect`, `GET /api/health`)

pub mod client;
pub mod types;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_server;

pub use client::{DetectionClient, DetectionConfig};
pub use types::{AnalysisError, DetectionResult, HealthResponse};
pub use upload::FileUpload;
