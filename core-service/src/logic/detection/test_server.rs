//! In-process stand-in for the detection API, used by tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::json;

/// One multipart field as the server received it
#[derive(Debug, Clone)]
pub struct ReceivedPart {
    pub field_name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    body: Arc<String>,
    delay: Duration,
    hits: Arc<AtomicUsize>,
    uploads: Arc<Mutex<Vec<ReceivedPart>>>,
}

pub struct MockServer {
    pub base_url: String,
    state: MockState,
}

impl MockServer {
    /// Serve `/detect` answering every request with `status` and `body`
    pub async fn start(status: StatusCode, body: &str) -> Self {
        Self::start_with_delay(status, body, Duration::ZERO).await
    }

    pub async fn start_with_delay(status: StatusCode, body: &str, delay: Duration) -> Self {
        let state = MockState {
            status,
            body: Arc::new(body.to_string()),
            delay,
            hits: Arc::new(AtomicUsize::new(0)),
            uploads: Arc::new(Mutex::new(Vec::new())),
        };

        let app = Router::new()
            .route("/detect", post(detect))
            .route("/api/health", get(health))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn port(&self) -> u16 {
        self.base_url.rsplit(':').next().and_then(|p| p.parse().ok()).unwrap()
    }

    /// Number of `/detect` requests received
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn uploads(&self) -> Vec<ReceivedPart> {
        self.state.uploads.lock().clone()
    }
}

async fn detect(State(state): State<MockState>, mut multipart: Multipart) -> impl IntoResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);

    while let Ok(Some(field)) = multipart.next_field().await {
        let field_name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();

        state.uploads.lock().push(ReceivedPart {
            field_name,
            file_name,
            content_type,
            bytes,
        });
    }

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    (
        state.status,
        [(header::CONTENT_TYPE, "application/json")],
        state.body.as_str().to_string(),
    )
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "components": {
            "visual_model": "MobileNetV2",
            "auditory_model": "MFCC Classifier",
            "malware_detection": "Binary Signature Scanner",
            "metadata_extraction": "Pillow EXIF"
        }
    }))
}
