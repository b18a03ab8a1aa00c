//! Recording stage orchestration
//!
//! The `RecordingController` sequences one on-camera recording: an optional
//! preparation countdown, the recording countdown with manual extension and
//! auto-stop, and teardown of the capture session on every exit path.

mod controller;

pub use controller::{
    RecordingController, RecordingEvent, RecordingPhase, CHUNK_INTERVAL_MS, EXTEND_STEP_SECONDS,
};
