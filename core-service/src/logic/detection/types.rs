//! Detection API Types
//!
//! Shapes of the `/detect` and `/api/health` responses. Every field is
//! optional and decoded leniently: a missing, `null` or wrongly typed field
//! becomes `None` instead of failing the whole response. Absent fields are
//! never written back out, so a persisted result keeps the exact set of
//! fields the server sent.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// LENIENT DECODING
// ============================================================================

/// Decode a field as `T`, turning any shape mismatch into `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

// ============================================================================
// DETECTION RESULT
// ============================================================================

/// Kết quả phân tích từ Detection API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Overall authenticity confidence, 0.0 (suspicious) to 1.0 (authentic)
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    /// Anomaly class label from the server's classification engine
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub anomaly_string: Option<String>,

    /// True if any signature or heuristic matched
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub malware_flag: Option<bool>,

    /// Per-method breakdown; only the methods that ran are present
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
}

impl DetectionResult {
    pub fn is_malware(&self) -> bool {
        self.malware_flag == Some(true)
    }
}

/// Component breakdown. Which keys exist depends on the file type: audio
/// never carries `visual_score`/`temporal_check`, still images never carry
/// `auditory_score`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub visual_score: Option<f64>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub auditory_score: Option<f64>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub signature_check: Option<SignatureCheck>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub metadata_keys: Option<u64>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub temporal_check: Option<TemporalCheck>,

    /// Keys this client does not know about, kept verbatim
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Components {
    /// Number of keys the server sent (known and unknown)
    pub fn key_count(&self) -> usize {
        let known = [
            self.visual_score.is_some(),
            self.auditory_score.is_some(),
            self.signature_check.is_some(),
            self.metadata_keys.is_some(),
            self.temporal_check.is_some(),
        ];
        known.iter().filter(|present| **present).count() + self.other.len()
    }
}

/// Binary signature scan outcome
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignatureCheck {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub has_signature: Option<bool>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub matches: Option<Vec<String>>,
}

/// Frame-to-frame motion analysis (video only)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemporalCheck {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub motion_jitter: Option<f64>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub is_video: Option<bool>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub frame_count: Option<u64>,
}

// ============================================================================
// OTHER WIRE TYPES
// ============================================================================

/// Error body of a failed request (`{"detail": "..."}`)
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default, deserialize_with = "lenient")]
    pub detail: Option<String>,
}

/// `/api/health` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub components: BTreeMap<String, String>,
}

// ============================================================================
// ERRORS
// ============================================================================

/// Detection client errors. `Display` is the message shown to the user.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    /// Network unreachable or request rejected before a response
    #[error("{0}")]
    Transport(String),

    /// Non-success HTTP status
    #[error("{message}")]
    Server { status: u16, message: String },

    /// Success status but the body is not a JSON object
    #[error("Invalid response from detection API: {0}")]
    InvalidResponse(String),

    /// The local file could not be read
    #[error("Cannot read file: {0}")]
    Io(String),
}
