//! HTTP API server for the presentation layer
//!
//! This module provides the REST seam the UI client drives:
//! - POST /session/onboarding, /session/stage, /session/restart - session flow
//! - POST /stage/skip-prep, /stage/extend, /stage/finish, /stage/cancel -
//!   active stage control
//! - GET /stage/status, /session - live countdown, meter and progress readouts
//! - GET /history, POST /session/history/:id - archived sessions
//! - POST /topics/generate, /outline/generate, /coach/message - analyzer calls
//! - GET /health - health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
