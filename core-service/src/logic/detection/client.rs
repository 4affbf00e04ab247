//! Detection API Client
//!
//! HTTP client for the external detection server. One multipart POST per
//! analysis, no retry and no streaming.

use std::time::Duration;

use super::types::{AnalysisError, DetectionResult, ErrorBody, HealthResponse};
use super::upload::FileUpload;
use crate::constants;

/// Port quoted in the fallback error when the endpoint URL has none
const DEFAULT_API_PORT: u16 = 8000;

/// Detection client configuration
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    pub api_url: String,
    pub timeout: Option<Duration>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            api_url: constants::get_api_url(),
            timeout: constants::get_api_timeout(),
        }
    }
}

/// Detection API client
pub struct DetectionClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl DetectionClient {
    /// Create new detection client
    pub fn new(config: DetectionConfig) -> Result<Self, AnalysisError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let http_client = builder
            .build()
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;

        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn detect_url(&self) -> String {
        format!("{}/detect", self.base_url)
    }

    pub fn health_url(&self) -> String {
        format!("{}/api/health", self.base_url)
    }

    /// Message used when the server fails without a readable `detail`
    pub fn fallback_message(&self) -> String {
        let port = reqwest::Url::parse(&self.detect_url())
            .ok()
            .and_then(|url| url.port_or_known_default())
            .unwrap_or(DEFAULT_API_PORT);

        format!(
            "Analysis failed. Please ensure the API server is running on port {}.",
            port
        )
    }

    /// Upload one file and return the server's verdict
    pub async fn analyze(&self, upload: &FileUpload) -> Result<DetectionResult, AnalysisError> {
        for advisory in upload.advisories() {
            log::warn!("{}: {}", upload.filename, advisory);
        }

        log::info!(
            "Uploading {} ({} bytes, {}, sha256 {}) to {}",
            upload.filename,
            upload.size(),
            upload.content_type,
            upload.sha256(),
            self.detect_url()
        );

        let part = reqwest::multipart::Part::bytes(upload.bytes.clone())
            .file_name(upload.filename.clone());
        let part = match part.mime_str(&upload.content_type) {
            Ok(part) => part,
            Err(e) => {
                log::warn!("Invalid media type '{}': {}", upload.content_type, e);
                reqwest::multipart::Part::bytes(upload.bytes.clone())
                    .file_name(upload.filename.clone())
            }
        };
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self.http_client
            .post(self.detect_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.detail)
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| self.fallback_message());

            log::error!("Analysis of {} failed ({}): {}", upload.filename, status.as_u16(), message);
            return Err(AnalysisError::Server { status: status.as_u16(), message });
        }

        let body = response.text()
            .await
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;

        let result = parse_result(&body)?;

        log::info!(
            "Analysis of {} complete: score={:?} anomaly={:?} malware={:?}",
            upload.filename,
            result.score,
            result.anomaly_string,
            result.malware_flag
        );

        Ok(result)
    }

    /// Check server health
    pub async fn health(&self) -> Result<HealthResponse, AnalysisError> {
        let response = self.http_client
            .get(self.health_url())
            .send()
            .await
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::Server {
                status: status.as_u16(),
                message: format!("Health check failed with status {}", status.as_u16()),
            });
        }

        response.json()
            .await
            .map_err(|e| AnalysisError::InvalidResponse(e.to_string()))
    }
}

/// Parse a success body. Only non-JSON or non-object bodies are errors;
/// field-level problems are absorbed by the lenient result type.
fn parse_result(body: &str) -> Result<DetectionResult, AnalysisError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| AnalysisError::InvalidResponse(e.to_string()))?;

    if !value.is_object() {
        return Err(AnalysisError::InvalidResponse("expected a JSON object".to_string()));
    }

    serde_json::from_value(value).map_err(|e| AnalysisError::InvalidResponse(e.to_string()))
}
