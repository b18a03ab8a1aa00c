use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::media::{CaptureSession, RecordingBlob};
use crate::session::SessionConfig;

/// Seconds added to the remaining time by one extend operation.
pub const EXTEND_STEP_SECONDS: u32 = 15;

/// Interval at which the recorder seals encoded chunks.
pub const CHUNK_INTERVAL_MS: u64 = 1000;

/// Phase of the recording stage.
///
/// `Prep` is only entered when the session has prep time configured; the
/// recording countdown never moves while in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingPhase {
    /// Ready, countdowns not yet running
    Armed,
    /// Preparation countdown
    Prep,
    /// Recording countdown
    Recording,
    /// Finalizing the recording
    Stopping,
    /// Terminal: a result was delivered or the stage was cancelled
    Done,
}

/// Events delivered to the controller's owner.
#[derive(Debug)]
pub enum RecordingEvent {
    PrepTick { remaining_seconds: u32 },
    RecordingStarted,
    RecordingTick { remaining_seconds: u32 },
    Finished { blob: RecordingBlob, duration_seconds: f64 },
    Failed { message: String },
    Cancelled,
}

struct ControllerInner {
    duration_seconds: u32,
    prep_seconds: u32,
    phase: Mutex<RecordingPhase>,
    prep_remaining: AtomicU32,
    remaining: AtomicU32,
    stopping: AtomicBool,
    capture: tokio::sync::Mutex<Option<CaptureSession>>,
    /// At most one phase timer exists; transitions abort the previous one.
    phase_timer: Mutex<Option<JoinHandle<()>>>,
    events: mpsc::Sender<RecordingEvent>,
}

/// Drives one recording stage: preparation countdown, recording countdown
/// with manual extension, auto-stop on expiry, and teardown on cancel.
pub struct RecordingController {
    inner: Arc<ControllerInner>,
}

impl RecordingController {
    /// Create a controller owning the given capture session.
    ///
    /// Returns the controller and the event stream its owner listens on.
    pub fn new(
        config: &SessionConfig,
        capture: CaptureSession,
    ) -> (Self, mpsc::Receiver<RecordingEvent>) {
        let (events, event_rx) = mpsc::channel(32);

        let inner = Arc::new(ControllerInner {
            duration_seconds: config.duration_seconds,
            prep_seconds: config.prep_time_seconds,
            phase: Mutex::new(RecordingPhase::Armed),
            prep_remaining: AtomicU32::new(config.prep_time_seconds),
            remaining: AtomicU32::new(config.duration_seconds),
            stopping: AtomicBool::new(false),
            capture: tokio::sync::Mutex::new(Some(capture)),
            phase_timer: Mutex::new(None),
            events,
        });

        (Self { inner }, event_rx)
    }

    /// Begin the stage: preparation countdown when configured, otherwise
    /// straight into recording.
    pub async fn start(&self) {
        if current_phase(&self.inner) != RecordingPhase::Armed {
            warn!("Recording stage already started, ignoring");
            return;
        }

        if self.inner.prep_seconds > 0 {
            set_phase(&self.inner, RecordingPhase::Prep);
            spawn_prep_timer(Arc::clone(&self.inner));
            info!("Preparation countdown started ({}s)", self.inner.prep_seconds);
        } else {
            begin_recording(Arc::clone(&self.inner)).await;
        }
    }

    /// Force the prep countdown to end immediately. Valid only in `Prep`.
    pub async fn skip_prep(&self) {
        if current_phase(&self.inner) != RecordingPhase::Prep {
            warn!("skip_prep outside preparation phase, ignoring");
            return;
        }
        info!("Preparation skipped");
        begin_recording(Arc::clone(&self.inner)).await;
    }

    /// Add a fixed 15 seconds to the remaining time. Valid only while
    /// recording; no upper bound is enforced.
    pub fn extend_time(&self) {
        if current_phase(&self.inner) != RecordingPhase::Recording {
            warn!("extend_time outside recording phase, ignoring");
            return;
        }
        let remaining = self
            .inner
            .remaining
            .fetch_add(EXTEND_STEP_SECONDS, Ordering::SeqCst)
            + EXTEND_STEP_SECONDS;
        info!("Recording extended, {}s remaining", remaining);
    }

    /// Stop the recording and deliver (blob, duration) to the owner.
    /// Valid only while recording.
    pub async fn finish(&self) {
        if current_phase(&self.inner) != RecordingPhase::Recording {
            warn!("finish outside recording phase, ignoring");
            return;
        }
        finish_recording(Arc::clone(&self.inner)).await;
    }

    /// Tear down capture without producing a result. Valid any time before
    /// the controller is done.
    pub async fn cancel(&self) {
        if current_phase(&self.inner) == RecordingPhase::Done {
            return;
        }
        if self.inner.stopping.swap(true, Ordering::SeqCst) {
            return;
        }

        cancel_phase_timer(&self.inner);

        if let Some(mut capture) = self.inner.capture.lock().await.take() {
            capture.teardown().await;
        }

        set_phase(&self.inner, RecordingPhase::Done);
        let _ = self.inner.events.send(RecordingEvent::Cancelled).await;

        info!("Recording stage cancelled");
    }

    pub fn phase(&self) -> RecordingPhase {
        current_phase(&self.inner)
    }

    pub fn is_done(&self) -> bool {
        current_phase(&self.inner) == RecordingPhase::Done
    }

    pub fn prep_remaining_seconds(&self) -> u32 {
        self.inner.prep_remaining.load(Ordering::SeqCst)
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.inner.remaining.load(Ordering::SeqCst)
    }

    /// Live meter level from the owned capture session, if still held.
    pub async fn volume(&self) -> Option<f32> {
        let capture = self.inner.capture.lock().await;
        capture.as_ref().map(|c| c.volume())
    }

    /// Whether every hardware track owned by this stage has been released.
    pub async fn hardware_released(&self) -> bool {
        let capture = self.inner.capture.lock().await;
        match capture.as_ref() {
            Some(c) => !c.has_live_tracks(),
            None => true,
        }
    }
}

fn current_phase(inner: &ControllerInner) -> RecordingPhase {
    inner
        .phase
        .lock()
        .map(|p| *p)
        .unwrap_or(RecordingPhase::Done)
}

fn set_phase(inner: &ControllerInner, phase: RecordingPhase) {
    if let Ok(mut current) = inner.phase.lock() {
        *current = phase;
    }
}

fn cancel_phase_timer(inner: &ControllerInner) {
    if let Ok(mut slot) = inner.phase_timer.lock() {
        if let Some(timer) = slot.take() {
            timer.abort();
        }
    }
}

fn store_phase_timer(inner: &ControllerInner, timer: JoinHandle<()>) {
    if let Ok(mut slot) = inner.phase_timer.lock() {
        if let Some(previous) = slot.replace(timer) {
            previous.abort();
        }
    }
}

fn spawn_prep_timer(inner: Arc<ControllerInner>) {
    let task_inner = Arc::clone(&inner);
    let timer = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            interval.tick().await;
            if current_phase(&task_inner) != RecordingPhase::Prep {
                break;
            }

            let remaining = task_inner
                .prep_remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| Some(v.saturating_sub(1)))
                .map(|v| v.saturating_sub(1))
                .unwrap_or(0);

            let _ = task_inner
                .events
                .send(RecordingEvent::PrepTick {
                    remaining_seconds: remaining,
                })
                .await;

            if remaining == 0 {
                // Hand off before exiting so this task is never aborted
                // from within itself.
                tokio::spawn(begin_recording(Arc::clone(&task_inner)));
                break;
            }
        }
    });
    store_phase_timer(&inner, timer);
}

fn spawn_recording_timer(inner: Arc<ControllerInner>) {
    let task_inner = Arc::clone(&inner);
    let timer = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        interval.tick().await;

        loop {
            interval.tick().await;
            if current_phase(&task_inner) != RecordingPhase::Recording {
                break;
            }

            let remaining = task_inner
                .remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| Some(v.saturating_sub(1)))
                .map(|v| v.saturating_sub(1))
                .unwrap_or(0);

            let _ = task_inner
                .events
                .send(RecordingEvent::RecordingTick {
                    remaining_seconds: remaining,
                })
                .await;

            if remaining == 0 {
                tokio::spawn(finish_recording(Arc::clone(&task_inner)));
                break;
            }
        }
    });
    store_phase_timer(&inner, timer);
}

async fn begin_recording(inner: Arc<ControllerInner>) {
    match current_phase(&inner) {
        RecordingPhase::Armed | RecordingPhase::Prep => {}
        // Already recording, stopping or done: nothing to begin.
        _ => return,
    }

    cancel_phase_timer(&inner);

    let encoder_error = {
        let mut capture = inner.capture.lock().await;
        let session = match capture.as_mut() {
            Some(session) => session,
            None => return,
        };
        session.start_recording(CHUNK_INTERVAL_MS).err()
    };

    if let Some(e) = encoder_error {
        // Recoverable: report and re-arm so the user can retry.
        warn!("Encoder failed to start: {}", e);
        set_phase(&inner, RecordingPhase::Armed);
        let _ = inner
            .events
            .send(RecordingEvent::Failed {
                message: e.to_string(),
            })
            .await;
        return;
    }

    inner
        .remaining
        .store(inner.duration_seconds, Ordering::SeqCst);
    set_phase(&inner, RecordingPhase::Recording);
    spawn_recording_timer(Arc::clone(&inner));

    let _ = inner.events.send(RecordingEvent::RecordingStarted).await;

    info!("Recording countdown started ({}s)", inner.duration_seconds);
}

async fn finish_recording(inner: Arc<ControllerInner>) {
    if inner.stopping.swap(true, Ordering::SeqCst) {
        return;
    }

    set_phase(&inner, RecordingPhase::Stopping);
    cancel_phase_timer(&inner);

    let remaining = inner.remaining.load(Ordering::SeqCst);
    let fallback_seconds = inner.duration_seconds.saturating_sub(remaining) as f64;

    let result = {
        let mut capture = inner.capture.lock().await;
        match capture.take() {
            Some(mut session) => session.stop_recording(fallback_seconds).await,
            None => {
                set_phase(&inner, RecordingPhase::Done);
                return;
            }
        }
    };

    set_phase(&inner, RecordingPhase::Done);

    match result {
        Ok((blob, duration_seconds)) => {
            let _ = inner
                .events
                .send(RecordingEvent::Finished {
                    blob,
                    duration_seconds,
                })
                .await;
        }
        Err(e) => {
            warn!("Failed to finalize recording: {}", e);
            let _ = inner
                .events
                .send(RecordingEvent::Failed {
                    message: e.to_string(),
                })
                .await;
        }
    }
}
