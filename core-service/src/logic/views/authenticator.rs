//! Authenticator View - File selection, analysis and result display
//!
//! Flow:
//! 1. `select_file` picks the upload and resets previous output
//! 2. `start_analysis` spawns the request; the task also records the
//!    result in history, so the record survives even if the view is
//!    cleared or dropped before the response arrives
//! 3. `wait_for_analysis` applies the outcome unless the view moved on
//!    (newer selection, clear, or a history entry was opened meanwhile)
//!
//! A history entry selected on the event bus replaces the display state
//! without any network call.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use super::render::ResultView;
use crate::logic::detection::{AnalysisError, DetectionClient, DetectionResult, FileUpload};
use crate::logic::events::{AppEvent, EventBus};
use crate::logic::history::{make_title, HistoryEntry, HistoryStore};

/// What the screen currently shows
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub selected_file: Option<FileUpload>,
    /// Name of a re-opened history entry
    pub loaded_filename: Option<String>,
    pub result: Option<DetectionResult>,
    pub error: Option<String>,
    pub is_analyzing: bool,
}

/// An analysis in flight, tagged with the view generation that started it
struct AnalysisTicket {
    generation: u64,
    outcome: oneshot::Receiver<Result<DetectionResult, AnalysisError>>,
}

pub struct AuthenticatorView {
    client: Arc<DetectionClient>,
    history: Arc<HistoryStore>,
    events: mpsc::UnboundedReceiver<AppEvent>,
    state: ViewState,
    generation: u64,
    pending: Option<AnalysisTicket>,
}

impl AuthenticatorView {
    pub fn new(client: Arc<DetectionClient>, history: Arc<HistoryStore>, bus: &EventBus) -> Self {
        Self {
            client,
            history,
            events: bus.subscribe(),
            state: ViewState::default(),
            generation: 0,
            pending: None,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Analyze is offered only with a file selected and nothing in flight
    pub fn can_analyze(&self) -> bool {
        self.state.selected_file.is_some() && !self.state.is_analyzing
    }

    pub fn can_clear(&self) -> bool {
        self.state.selected_file.is_some() || self.state.result.is_some()
    }

    pub fn select_file(&mut self, upload: FileUpload) {
        self.detach();
        log::debug!("Selected {} ({} bytes)", upload.filename, upload.size());
        self.state = ViewState {
            selected_file: Some(upload),
            ..Default::default()
        };
    }

    /// Reset all transient state. False when there was nothing to clear.
    pub fn clear(&mut self) -> bool {
        if !self.can_clear() {
            return false;
        }
        self.detach();
        self.state = ViewState::default();
        true
    }

    /// Spawn the request for the selected file. Returns false when
    /// analysis is not currently allowed.
    pub fn start_analysis(&mut self) -> bool {
        if !self.can_analyze() {
            return false;
        }
        let Some(upload) = self.state.selected_file.clone() else {
            return false;
        };

        self.state.is_analyzing = true;
        self.state.error = None;
        self.state.result = None;

        let (tx, rx) = oneshot::channel();
        let client = Arc::clone(&self.client);
        let history = Arc::clone(&self.history);

        tokio::spawn(async move {
            let outcome = client.analyze(&upload).await;

            // Storage backends do blocking file or SQLite I/O
            if let Ok(result) = &outcome {
                let title = make_title(&upload.filename);
                let result = result.clone();
                let filename = upload.filename.clone();
                let recorded = tokio::task::spawn_blocking(move || {
                    history.append(&title, Some(result), Some(filename));
                })
                .await;

                if let Err(e) = recorded {
                    log::error!("Recording {} in history failed: {}", upload.filename, e);
                }
            }

            // Receiver is gone if the view moved on; the history record stays
            if tx.send(outcome).is_err() {
                log::debug!("Analysis of {} finished after its view detached", upload.filename);
            }
        });

        self.pending = Some(AnalysisTicket {
            generation: self.generation,
            outcome: rx,
        });
        true
    }

    /// Wait for the in-flight analysis (if any) and show its outcome
    pub async fn wait_for_analysis(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };

        let outcome = match pending.outcome.await {
            Ok(outcome) => outcome,
            Err(_) => Err(AnalysisError::Transport("Analysis task ended unexpectedly".to_string())),
        };

        if pending.generation != self.generation {
            log::debug!("Discarding stale analysis outcome");
            return;
        }

        self.state.is_analyzing = false;
        match outcome {
            Ok(result) => self.state.result = Some(result),
            Err(e) => self.state.error = Some(e.to_string()),
        }
    }

    /// `start_analysis` followed by `wait_for_analysis`
    pub async fn analyze(&mut self) -> bool {
        if !self.start_analysis() {
            return false;
        }
        self.wait_for_analysis().await;
        true
    }

    /// Show a stored result without contacting the API
    pub fn load_entry(&mut self, entry: &HistoryEntry) {
        let Some(result) = &entry.result else {
            log::debug!("History entry {} has no result: {}", entry.id, entry.title);
            return;
        };

        self.detach();
        log::info!("Loading history entry {} ({})", entry.id, entry.display_name());
        self.state = ViewState {
            selected_file: None,
            loaded_filename: Some(entry.display_name().to_string()),
            result: Some(result.clone()),
            error: None,
            is_analyzing: false,
        };
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::EntrySelected(entry) => self.load_entry(&entry),
            AppEvent::HistoryUpdated => {}
        }
    }

    /// Apply every event already queued
    pub fn poll_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event);
        }
    }

    /// Rendered result, if one is shown
    pub fn rendered(&self) -> Option<ResultView> {
        let result = self.state.result.as_ref()?;
        let name = self
            .state
            .selected_file
            .as_ref()
            .map(|f| f.filename.as_str())
            .or(self.state.loaded_filename.as_deref());
        Some(ResultView::from_result(result, name))
    }

    /// Forget the in-flight request's UI update (the request itself runs on)
    fn detach(&mut self) {
        self.generation += 1;
        self.pending = None;
    }
}
