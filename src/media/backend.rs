use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors raised while acquiring or driving capture hardware.
///
/// `PermissionDenied` and `DeviceUnavailable` are fatal to the stage: the
/// caller reports them and the user re-enters the flow. `EncoderStart` is
/// recoverable and the user may retry.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("media permission denied: {0}")]
    PermissionDenied(String),

    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("encoder failed to start: {0}")]
    EncoderStart(String),
}

/// Kind of hardware track held by a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

/// Handle to one acquired hardware track.
///
/// The backend keeps the matching end of `live` and flips it when the device
/// is released, so indicator state is observable from the outside. Stopping
/// is idempotent.
#[derive(Debug, Clone)]
pub struct MediaTrack {
    kind: TrackKind,
    live: Arc<AtomicBool>,
}

impl MediaTrack {
    pub fn new(kind: TrackKind) -> Self {
        Self {
            kind,
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.live.store(false, Ordering::SeqCst);
    }
}

/// Audio sample data (16-bit PCM, interleaved).
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

/// Configuration for a capture backend.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Target sample rate
    pub sample_rate: u32,
    /// Target channel count (1 = mono, 2 = stereo)
    pub channels: u16,
    /// Frame size in milliseconds (affects meter latency)
    pub buffer_duration_ms: u64,
    /// Whether to also acquire a camera track
    pub want_video: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
            buffer_duration_ms: 100,
            want_video: true,
        }
    }
}

/// Capture backend trait
///
/// Implementations:
/// - Device: microphone via cpal (camera track only where the platform
///   exposes one)
/// - Synthetic: generated tone, for tests and headless runs
#[async_trait::async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Acquire the hardware and start capturing.
    ///
    /// Returns a channel receiver that will receive audio frames. On failure
    /// no acquired hardware may be left dangling.
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>, CaptureError>;

    /// Release the hardware and stop capturing.
    async fn stop(&mut self) -> Result<()>;

    /// Check if the backend is currently capturing
    fn is_capturing(&self) -> bool;

    /// Handles to the hardware tracks this backend has acquired
    fn tracks(&self) -> Vec<MediaTrack>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Capture source selection.
#[derive(Debug, Clone)]
pub enum CaptureSource {
    /// Real input hardware, optionally pinned to a named device
    Device(Option<String>),
    /// Generated tone (tests, headless runs)
    Synthetic { frequency_hz: f32, amplitude: f32 },
}

/// Capture backend factory.
pub struct CaptureBackendFactory;

impl CaptureBackendFactory {
    pub fn create(
        source: CaptureSource,
        config: CaptureConfig,
    ) -> Result<Box<dyn CaptureBackend>, CaptureError> {
        match source {
            CaptureSource::Device(preferred) => {
                let backend = super::device::DeviceBackend::new(preferred, config)?;
                Ok(Box::new(backend))
            }
            CaptureSource::Synthetic {
                frequency_hz,
                amplitude,
            } => {
                let backend = super::synthetic::SyntheticBackend::new(frequency_hz, amplitude, config);
                Ok(Box::new(backend))
            }
        }
    }
}
