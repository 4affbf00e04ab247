//! File Upload
//!
//! A file picked for analysis: name, declared media type and content.
//! The client never rejects a file; the checks here only mirror what the
//! detection API validates so the operator sees a warning before the upload.

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use sha2::{Digest, Sha256};

use super::types::AnalysisError;
use crate::constants::ADVERTISED_MAX_UPLOAD_BYTES;

// ============================================================================
// CONSTANTS
// ============================================================================

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Extensions the detection API accepts, with the media type sent for each
static CONTENT_TYPES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        // Images
        ("jpg", "image/jpeg"),
        ("jpeg", "image/jpeg"),
        ("png", "image/png"),
        ("gif", "image/gif"),
        ("bmp", "image/bmp"),
        ("webp", "image/webp"),
        // Videos
        ("mp4", "video/mp4"),
        ("avi", "video/x-msvideo"),
        ("mov", "video/quicktime"),
        ("mkv", "video/x-matroska"),
        ("wmv", "video/x-ms-wmv"),
        ("flv", "video/x-flv"),
        ("webm", "video/webm"),
        // Audio
        ("mp3", "audio/mpeg"),
        ("wav", "audio/wav"),
        ("flac", "audio/flac"),
        ("aac", "audio/aac"),
        ("ogg", "audio/ogg"),
        ("m4a", "audio/mp4"),
        // Documents
        ("pdf", "application/pdf"),
        ("txt", "text/plain"),
        ("doc", "application/msword"),
        ("docx", "application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        // Executables and scripts
        ("exe", "application/vnd.microsoft.portable-executable"),
        ("dll", "application/vnd.microsoft.portable-executable"),
        ("bat", "application/x-msdos-program"),
        ("cmd", "application/x-msdos-program"),
        ("ps1", "text/plain"),
    ])
});

// ============================================================================
// FILE UPLOAD
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Things the detection API is likely to complain about
#[derive(Debug, Clone, PartialEq)]
pub enum UploadAdvisory {
    TooLarge { size: u64 },
    Empty,
    UnusualExtension(String),
}

impl std::fmt::Display for UploadAdvisory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadAdvisory::TooLarge { size } => write!(
                f,
                "File is {:.2} MB, the API accepts up to {} MB",
                *size as f64 / 1024.0 / 1024.0,
                ADVERTISED_MAX_UPLOAD_BYTES / 1024 / 1024
            ),
            UploadAdvisory::Empty => write!(f, "File is empty"),
            UploadAdvisory::UnusualExtension(ext) if ext.is_empty() => {
                write!(f, "File has no extension")
            }
            UploadAdvisory::UnusualExtension(ext) => {
                write!(f, "Extension '.{}' is not in the API's accepted list", ext)
            }
        }
    }
}

impl FileUpload {
    /// Build an upload from in-memory content; media type is guessed from the name
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let content_type = guess_content_type(&filename).to_string();
        Self { filename, content_type, bytes }
    }

    /// Read a file from disk
    pub async fn from_path(path: &Path) -> Result<Self, AnalysisError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AnalysisError::Io(format!("{}: {}", path.display(), e)))?;

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        Ok(Self::new(filename, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn extension(&self) -> String {
        Path::new(&self.filename)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }

    /// Hex SHA-256 of the content
    pub fn sha256(&self) -> String {
        hex::encode(Sha256::digest(&self.bytes))
    }

    pub fn advisories(&self) -> Vec<UploadAdvisory> {
        let mut advisories = Vec::new();

        if self.bytes.is_empty() {
            advisories.push(UploadAdvisory::Empty);
        } else if self.size() > ADVERTISED_MAX_UPLOAD_BYTES {
            advisories.push(UploadAdvisory::TooLarge { size: self.size() });
        }

        let ext = self.extension();
        if !CONTENT_TYPES.contains_key(ext.as_str()) {
            advisories.push(UploadAdvisory::UnusualExtension(ext));
        }

        advisories
    }
}

/// Guess the media type from the file extension
pub fn guess_content_type(filename: &str) -> &'static str {
    let ext = Path::new(filename)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    CONTENT_TYPES
        .get(ext.as_str())
        .copied()
        .unwrap_or(FALLBACK_CONTENT_TYPE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type("clip.MP4"), "video/mp4");
        assert_eq!(guess_content_type("voice.wav"), "audio/wav");
        assert_eq!(guess_content_type("photo.jpeg"), "image/jpeg");
        assert_eq!(guess_content_type("payload.bin"), "application/octet-stream");
        assert_eq!(guess_content_type("README"), "application/octet-stream");
    }

    #[test]
    fn test_advisories() {
        let ok = FileUpload::new("photo.png", vec![1, 2, 3]);
        assert!(ok.advisories().is_empty());
        assert_eq!(ok.content_type, "image/png");

        let empty = FileUpload::new("photo.png", vec![]);
        assert_eq!(empty.advisories(), vec![UploadAdvisory::Empty]);

        let odd = FileUpload::new("archive.zip", vec![0]);
        assert_eq!(
            odd.advisories(),
            vec![UploadAdvisory::UnusualExtension("zip".to_string())]
        );
    }

    #[test]
    fn test_sha256() {
        let upload = FileUpload::new("a.txt", b"abc".to_vec());
        assert_eq!(
            upload.sha256(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.mp3");
        std::fs::write(&path, b"ID3").unwrap();

        let upload = FileUpload::from_path(&path).await.unwrap();
        assert_eq!(upload.filename, "sample.mp3");
        assert_eq!(upload.content_type, "audio/mpeg");
        assert_eq!(upload.bytes, b"ID3");

        let missing = FileUpload::from_path(&dir.path().join("nope.mp3")).await;
        assert!(matches!(missing, Err(AnalysisError::Io(_))));
    }
}
