use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session flow
        .route("/session", get(handlers::session_view))
        .route("/session/onboarding", post(handlers::complete_onboarding))
        .route(
            "/session/onboarding/back",
            post(handlers::back_to_onboarding),
        )
        .route("/session/stage", post(handlers::start_stage))
        .route("/session/restart", post(handlers::restart_session))
        .route("/session/history/:id", post(handlers::load_history))
        // Active stage control
        .route("/stage/start", post(handlers::stage_restart))
        .route("/stage/skip-prep", post(handlers::skip_prep))
        .route("/stage/extend", post(handlers::extend_time))
        .route("/stage/finish", post(handlers::finish_recording))
        .route("/stage/cancel", post(handlers::cancel_recording))
        .route("/stage/status", get(handlers::stage_status))
        // History
        .route("/history", get(handlers::list_history))
        // Generation and coaching
        .route("/topics/generate", post(handlers::generate_topic))
        .route("/outline/generate", post(handlers::generate_outline))
        .route("/coach/message", post(handlers::coach_message))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
