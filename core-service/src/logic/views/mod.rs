//! Views - State of the two screen regions sharing the event bus
//!
//! - `authenticator.rs`: upload, analyze, clear, re-open from history
//! - `history_panel.rs`: previous analyses with relative times
//! - `render.rs`: presentational model of a detection result

pub mod authenticator;
pub mod history_panel;
pub mod render;

pub use authenticator::AuthenticatorView;
pub use history_panel::HistoryPanel;
pub use render::ResultView;
