use std::sync::Arc;

use tokio::sync::Mutex;

use crate::analyzer::Analyzer;
use crate::media::{CaptureConfig, CaptureSource};
use crate::recording::RecordingController;
use crate::session::SessionStateMachine;

/// Shared application state for HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// The session state machine (one user, one session at a time)
    pub machine: Arc<Mutex<SessionStateMachine>>,

    /// The active recording stage, if one is live
    pub stage: Arc<Mutex<Option<Arc<RecordingController>>>>,

    /// Analyzer handle for the setup-stage generation endpoints
    pub analyzer: Arc<dyn Analyzer>,

    /// How capture hardware is acquired for a new stage
    pub capture_source: CaptureSource,
    pub capture_config: CaptureConfig,
}

impl AppState {
    pub fn new(
        machine: SessionStateMachine,
        analyzer: Arc<dyn Analyzer>,
        capture_source: CaptureSource,
        capture_config: CaptureConfig,
    ) -> Self {
        Self {
            machine: Arc::new(Mutex::new(machine)),
            stage: Arc::new(Mutex::new(None)),
            analyzer,
            capture_source,
            capture_config,
        }
    }
}
