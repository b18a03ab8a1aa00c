pub mod analyzer;
pub mod config;
pub mod history;
pub mod http;
pub mod media;
pub mod recording;
pub mod session;

pub use analyzer::{AnalysisResult, Analyzer, AnalyzerError, CoachChat, Outline};
pub use config::Config;
pub use history::{HistoryItem, HistoryStore, HISTORY_CAP};
pub use http::{create_router, AppState};
pub use media::{
    CaptureConfig, CaptureError, CaptureSession, CaptureSource, RecordingBlob,
};
pub use recording::{RecordingController, RecordingEvent, RecordingPhase};
pub use session::{
    AnalysisProgress, AppStage, OnboardingProfile, SessionConfig, SessionMode,
    SessionStateMachine, SkillLevel,
};
