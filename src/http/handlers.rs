use super::state::AppState;
use crate::analyzer::{AnalysisResult, Outline};
use crate::history::HistoryItem;
use crate::media::{CaptureError, CaptureSession};
use crate::recording::{RecordingController, RecordingEvent, RecordingPhase};
use crate::session::{AppStage, SessionConfig, SessionMode, SessionStateMachine, SkillLevel};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingRequest {
    /// Interest areas chosen during onboarding (may be empty)
    #[serde(default)]
    pub topics: Vec<String>,
    pub preferred_mode: SessionMode,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageStartResponse {
    pub status: String,
    pub phase: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageStatusResponse {
    pub phase: String,
    pub prep_remaining_seconds: u32,
    pub remaining_seconds: u32,
    pub volume: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressView {
    pub percent: f32,
    pub tip: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub stage: AppStage,
    pub analyzing: bool,
    pub progress: Option<ProgressView>,
    pub result: Option<AnalysisResult>,
    pub recorded_duration_seconds: f64,
    pub has_audio: bool,
    pub notice: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicGenerateRequest {
    pub language: String,
    pub mode: SessionMode,
    pub level: SkillLevel,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicGenerateResponse {
    pub topic: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineGenerateRequest {
    pub topic: String,
    pub language: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachMessageBody {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachMessageResponse {
    pub reply: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

fn phase_label(phase: RecordingPhase) -> &'static str {
    match phase {
        RecordingPhase::Armed => "armed",
        RecordingPhase::Prep => "prep",
        RecordingPhase::Recording => "recording",
        RecordingPhase::Stopping => "stopping",
        RecordingPhase::Done => "done",
    }
}

// ============================================================================
// Session flow
// ============================================================================

/// POST /session/onboarding
/// Complete onboarding with interests and a preferred mode
pub async fn complete_onboarding(
    State(state): State<AppState>,
    Json(req): Json<OnboardingRequest>,
) -> impl IntoResponse {
    let mut machine = state.machine.lock().await;
    match machine.complete_onboarding(req.topics, req.preferred_mode) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => error_response(StatusCode::CONFLICT, e.to_string()),
    }
}

/// POST /session/onboarding/back
/// Navigate back from setup to onboarding
pub async fn back_to_onboarding(State(state): State<AppState>) -> impl IntoResponse {
    let mut machine = state.machine.lock().await;
    match machine.back_to_onboarding() {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => error_response(StatusCode::CONFLICT, e.to_string()),
    }
}

/// POST /session/stage
/// Enter the recording stage: acquire capture hardware and start the
/// countdown flow
pub async fn start_stage(
    State(state): State<AppState>,
    Json(config): Json<SessionConfig>,
) -> impl IntoResponse {
    {
        let stage = state.stage.lock().await;
        if stage.is_some() {
            return error_response(StatusCode::CONFLICT, "a recording stage is already active");
        }
    }

    {
        let mut machine = state.machine.lock().await;
        if let Err(e) = machine.start_stage(config.clone()) {
            return error_response(StatusCode::CONFLICT, e.to_string());
        }
    }

    // Hardware acquisition failure is fatal to the stage: report it and
    // fall back to setup, leaving nothing acquired.
    let capture = match CaptureSession::acquire(
        state.capture_source.clone(),
        state.capture_config.clone(),
    )
    .await
    {
        Ok(capture) => capture,
        Err(e) => {
            error!("Failed to acquire capture hardware: {}", e);
            let mut machine = state.machine.lock().await;
            machine.stage_failed(e.to_string());
            let status = match e {
                CaptureError::PermissionDenied(_) => StatusCode::FORBIDDEN,
                _ => StatusCode::SERVICE_UNAVAILABLE,
            };
            return error_response(status, e.to_string());
        }
    };

    let (controller, events) = RecordingController::new(&config, capture);
    let controller = Arc::new(controller);

    tokio::spawn(pump_stage_events(
        Arc::clone(&state.machine),
        Arc::clone(&state.stage),
        Arc::clone(&controller),
        events,
    ));

    controller.start().await;

    {
        let mut stage = state.stage.lock().await;
        *stage = Some(Arc::clone(&controller));
    }

    info!("Recording stage started for topic '{}'", config.topic);

    (
        StatusCode::OK,
        Json(StageStartResponse {
            status: "started".to_string(),
            phase: phase_label(controller.phase()).to_string(),
        }),
    )
        .into_response()
}

/// Forward controller events into the session state machine.
async fn pump_stage_events(
    machine: Arc<Mutex<SessionStateMachine>>,
    stage: Arc<Mutex<Option<Arc<RecordingController>>>>,
    controller: Arc<RecordingController>,
    mut events: mpsc::Receiver<RecordingEvent>,
) {
    while let Some(event) = events.recv().await {
        match event {
            RecordingEvent::Finished {
                blob,
                duration_seconds,
            } => {
                {
                    let mut stage = stage.lock().await;
                    *stage = None;
                }
                SessionStateMachine::analyze(Arc::clone(&machine), blob, duration_seconds).await;
                break;
            }
            RecordingEvent::Cancelled => {
                {
                    let mut stage = stage.lock().await;
                    *stage = None;
                }
                let mut machine = machine.lock().await;
                machine.stage_cancelled();
                break;
            }
            RecordingEvent::Failed { message } => {
                let mut machine = machine.lock().await;
                if controller.is_done() {
                    // Finalization failed: the stage is over.
                    machine.stage_failed(message);
                    drop(machine);
                    let mut stage = stage.lock().await;
                    *stage = None;
                    break;
                } else {
                    // Encoder start failure: recoverable, the user may retry.
                    machine.notify(message);
                }
            }
            RecordingEvent::PrepTick { .. }
            | RecordingEvent::RecordingTick { .. }
            | RecordingEvent::RecordingStarted => {
                // Countdown state is polled via GET /stage/status.
            }
        }
    }
}

async fn with_stage<F, Fut>(state: &AppState, op: F) -> axum::response::Response
where
    F: FnOnce(Arc<RecordingController>) -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    let controller = {
        let stage = state.stage.lock().await;
        stage.clone()
    };

    match controller {
        Some(controller) => {
            op(controller).await;
            StatusCode::OK.into_response()
        }
        None => error_response(StatusCode::NOT_FOUND, "no active recording stage"),
    }
}

/// POST /stage/start
/// Re-run the countdown flow (retry after a recoverable encoder failure)
pub async fn stage_restart(State(state): State<AppState>) -> impl IntoResponse {
    with_stage(&state, |c| async move { c.start().await }).await
}

/// POST /stage/skip-prep
pub async fn skip_prep(State(state): State<AppState>) -> impl IntoResponse {
    with_stage(&state, |c| async move { c.skip_prep().await }).await
}

/// POST /stage/extend
pub async fn extend_time(State(state): State<AppState>) -> impl IntoResponse {
    with_stage(&state, |c| async move { c.extend_time() }).await
}

/// POST /stage/finish
pub async fn finish_recording(State(state): State<AppState>) -> impl IntoResponse {
    with_stage(&state, |c| async move { c.finish().await }).await
}

/// POST /stage/cancel
pub async fn cancel_recording(State(state): State<AppState>) -> impl IntoResponse {
    with_stage(&state, |c| async move { c.cancel().await }).await
}

/// GET /stage/status
/// Live countdown and meter readout for the active stage
pub async fn stage_status(State(state): State<AppState>) -> impl IntoResponse {
    let controller = {
        let stage = state.stage.lock().await;
        stage.clone()
    };

    match controller {
        Some(controller) => {
            let volume = controller.volume().await.unwrap_or(0.0);
            (
                StatusCode::OK,
                Json(StageStatusResponse {
                    phase: phase_label(controller.phase()).to_string(),
                    prep_remaining_seconds: controller.prep_remaining_seconds(),
                    remaining_seconds: controller.remaining_seconds(),
                    volume,
                }),
            )
                .into_response()
        }
        None => error_response(StatusCode::NOT_FOUND, "no active recording stage"),
    }
}

/// GET /session
/// Current stage, analysis progress and result
pub async fn session_view(State(state): State<AppState>) -> impl IntoResponse {
    let mut machine = state.machine.lock().await;

    let progress = machine.progress().map(|(percent, tip)| ProgressView {
        percent,
        tip: tip.to_string(),
    });

    let view = SessionView {
        stage: machine.stage(),
        analyzing: machine.is_analyzing(),
        progress,
        result: machine.result().cloned(),
        recorded_duration_seconds: machine.recorded_duration(),
        has_audio: machine.audio_blob().is_some(),
        notice: machine.take_notice(),
    };

    (StatusCode::OK, Json(view)).into_response()
}

/// POST /session/restart
pub async fn restart_session(State(state): State<AppState>) -> impl IntoResponse {
    let mut machine = state.machine.lock().await;
    match machine.restart() {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => error_response(StatusCode::CONFLICT, e.to_string()),
    }
}

// ============================================================================
// History
// ============================================================================

/// GET /history
pub async fn list_history(State(state): State<AppState>) -> impl IntoResponse {
    let machine = state.machine.lock().await;
    let items: Vec<HistoryItem> = machine.history().list();
    (StatusCode::OK, Json(items)).into_response()
}

/// POST /session/history/:id
/// Load an archived result, bypassing recording
pub async fn load_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let mut machine = state.machine.lock().await;
    match machine.load_history(&id) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => error_response(StatusCode::NOT_FOUND, e.to_string()),
    }
}

// ============================================================================
// Generation and coaching
// ============================================================================

/// POST /topics/generate
/// Generate a topic from the onboarding interests (fixed fallback on
/// remote failure)
pub async fn generate_topic(
    State(state): State<AppState>,
    Json(req): Json<TopicGenerateRequest>,
) -> impl IntoResponse {
    let interests = {
        let machine = state.machine.lock().await;
        machine
            .profile()
            .map(|p| p.topics.clone())
            .unwrap_or_else(|| vec!["General".to_string()])
    };

    let topic = state
        .analyzer
        .generate_topic(&interests, &req.language, req.mode, req.level)
        .await;

    (StatusCode::OK, Json(TopicGenerateResponse { topic })).into_response()
}

/// POST /outline/generate
/// Generate a three-point outline (placeholder on remote failure)
pub async fn generate_outline(
    State(state): State<AppState>,
    Json(req): Json<OutlineGenerateRequest>,
) -> impl IntoResponse {
    let outline: Outline = state
        .analyzer
        .generate_outline(&req.topic, &req.language)
        .await;

    (StatusCode::OK, Json(outline)).into_response()
}

/// POST /coach/message
/// One turn of the coaching conversation
pub async fn coach_message(
    State(state): State<AppState>,
    Json(body): Json<CoachMessageBody>,
) -> impl IntoResponse {
    let mut machine = state.machine.lock().await;
    match machine.coach_message(&body.message).await {
        Ok(reply) => (StatusCode::OK, Json(CoachMessageResponse { reply })).into_response(),
        Err(e) => error_response(StatusCode::BAD_GATEWAY, e.to_string()),
    }
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
