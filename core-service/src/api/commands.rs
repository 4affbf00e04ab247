//! CLI Commands - Operations behind each `deepsecure` subcommand
//!
//! Every command works on an `AppContext` built once from configuration.
//! Rendering to the terminal stays in `main.rs`; these functions return data.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;

use crate::logic::config::AppConfig;
use crate::logic::detection::{DetectionClient, DetectionConfig, DetectionResult, FileUpload, HealthResponse};
use crate::logic::events::EventBus;
use crate::logic::history::storage::open_store;
use crate::logic::history::{message_title, HistoryEntry, HistoryItem, HistoryStore, KeyValueStore};
use crate::logic::views::{AuthenticatorView, HistoryPanel, ResultView};

// ============================================================================
// CONTEXT
// ============================================================================

/// Shared services for one CLI invocation
pub struct AppContext {
    pub config: AppConfig,
    pub client: Arc<DetectionClient>,
    pub history: Arc<HistoryStore>,
    pub bus: EventBus,
}

impl AppContext {
    pub fn new(config: AppConfig) -> Result<Self> {
        let backend = open_store(config.storage, &config.data_dir)
            .with_context(|| format!("Cannot open history storage in {}", config.data_dir.display()))?;
        Self::with_backend(config, backend)
    }

    pub fn with_backend(config: AppConfig, backend: Arc<dyn KeyValueStore>) -> Result<Self> {
        let client = DetectionClient::new(DetectionConfig {
            api_url: config.api_url.clone(),
            timeout: config.api_timeout,
        })?;

        let bus = EventBus::new();
        let history = HistoryStore::new(backend, bus.clone());

        Ok(Self {
            config,
            client: Arc::new(client),
            history: Arc::new(history),
            bus,
        })
    }

    fn authenticator(&self) -> AuthenticatorView {
        AuthenticatorView::new(Arc::clone(&self.client), Arc::clone(&self.history), &self.bus)
    }
}

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Outcome of `analyze`
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub filename: String,
    pub sha256: String,
    pub result: DetectionResult,
    pub view: ResultView,
}

// ============================================================================
// COMMANDS
// ============================================================================

/// Upload a file, render the verdict and record it in history
pub async fn analyze_file(ctx: &AppContext, path: &Path) -> Result<AnalysisReport> {
    let upload = FileUpload::from_path(path).await?;
    let filename = upload.filename.clone();
    let sha256 = upload.sha256();

    let mut view = ctx.authenticator();
    view.select_file(upload);
    view.analyze().await;

    if let Some(message) = &view.state().error {
        bail!("{}", message);
    }

    let result = view
        .state()
        .result
        .clone()
        .ok_or_else(|| anyhow!("Analysis of {} produced no result", filename))?;
    let rendered = view
        .rendered()
        .ok_or_else(|| anyhow!("Analysis of {} produced no result", filename))?;

    Ok(AnalysisReport {
        filename,
        sha256,
        result,
        view: rendered,
    })
}

/// Stored entries with their relative times, newest first
pub fn get_history(ctx: &AppContext) -> Vec<HistoryItem> {
    HistoryPanel::new(Arc::clone(&ctx.history), ctx.bus.clone())
        .items()
        .to_vec()
}

/// Re-render a stored analysis without contacting the API
pub fn open_entry(ctx: &AppContext, id: &str) -> Result<ResultView> {
    let mut view = ctx.authenticator();
    let mut panel = HistoryPanel::new(Arc::clone(&ctx.history), ctx.bus.clone());

    if !panel.select(id) {
        bail!("History entry {} not found", id);
    }
    view.poll_events();

    view.rendered()
        .ok_or_else(|| anyhow!("History entry {} has no analysis result", id))
}

/// Record a chat-only entry. Blank messages are ignored.
pub fn send_message(ctx: &AppContext, text: &str) -> Option<HistoryEntry> {
    if text.trim().is_empty() {
        log::debug!("Ignoring blank message");
        return None;
    }
    Some(ctx.history.append(&message_title(text), None, None))
}

/// Probe the detection API
pub async fn check_health(ctx: &AppContext) -> Result<HealthResponse> {
    let health = ctx
        .client
        .health()
        .await
        .with_context(|| format!("Detection API at {} is not reachable", ctx.config.api_url))?;
    Ok(health)
}

/// Drop the stored list; the next read restores the default entries
pub fn clear_history(ctx: &AppContext) {
    ctx.history.clear();
}

/// Keep a history panel running until `shutdown` resolves
pub async fn watch_history<S, F>(ctx: &AppContext, shutdown: S, on_change: F)
where
    S: Future<Output = ()>,
    F: FnMut(&[HistoryItem]),
{
    let panel = HistoryPanel::new(Arc::clone(&ctx.history), ctx.bus.clone());
    panel.run_until(shutdown, on_change).await;
}
