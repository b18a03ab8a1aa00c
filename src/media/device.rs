// Microphone capture backend using cpal.
//
// The cpal stream is not Send, so the stream lives on a dedicated worker
// thread that forwards fixed-duration frames into a tokio channel. Camera
// capture has no cross-platform backend in this build; the session runs with
// the audio track only.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Result;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use super::backend::{AudioFrame, CaptureBackend, CaptureConfig, CaptureError, MediaTrack, TrackKind};

pub struct DeviceBackend {
    config: CaptureConfig,
    device: cpal::Device,
    device_name: String,
    stop_flag: Arc<AtomicBool>,
    worker: Option<std::thread::JoinHandle<()>>,
    tracks: Vec<MediaTrack>,
    capturing: bool,
}

impl DeviceBackend {
    /// Resolve the input device, optionally pinned by name.
    pub fn new(preferred: Option<String>, config: CaptureConfig) -> Result<Self, CaptureError> {
        let host = cpal::default_host();

        let device = match &preferred {
            Some(name) => {
                let mut devices = host.input_devices().map_err(|e| {
                    CaptureError::DeviceUnavailable(format!("no input devices: {e}"))
                })?;
                devices
                    .find(|d| d.name().map(|n| &n == name).unwrap_or(false))
                    .ok_or_else(|| {
                        CaptureError::DeviceUnavailable(format!("input device '{name}' not found"))
                    })?
            }
            None => host.default_input_device().ok_or_else(|| {
                CaptureError::DeviceUnavailable("no default input device".to_string())
            })?,
        };

        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown Device".to_string());

        if config.want_video {
            info!("Camera capture is not available on this platform, audio track only");
        }

        Ok(Self {
            config,
            device,
            device_name,
            stop_flag: Arc::new(AtomicBool::new(false)),
            worker: None,
            tracks: Vec::new(),
            capturing: false,
        })
    }
}

#[async_trait::async_trait]
impl CaptureBackend for DeviceBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>, CaptureError> {
        if self.capturing {
            return Err(CaptureError::DeviceUnavailable(
                "already capturing".to_string(),
            ));
        }

        info!("Starting microphone capture on '{}'", self.device_name);

        let (frame_tx, frame_rx) = mpsc::channel::<AudioFrame>(100);
        let (ready_tx, ready_rx) = oneshot::channel::<Result<(), CaptureError>>();

        self.stop_flag.store(false, Ordering::SeqCst);
        let stop_flag = Arc::clone(&self.stop_flag);
        let device = self.device.clone();
        let config = self.config.clone();

        let worker = std::thread::spawn(move || {
            run_stream_worker(device, config, stop_flag, frame_tx, ready_tx);
        });

        match ready_rx.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                // Worker exits on its own after reporting failure.
                let _ = worker.join();
                return Err(e);
            }
            Err(_) => {
                let _ = worker.join();
                return Err(CaptureError::DeviceUnavailable(
                    "capture worker died during startup".to_string(),
                ));
            }
        }

        self.worker = Some(worker);
        self.tracks = vec![MediaTrack::new(TrackKind::Audio)];
        self.capturing = true;

        info!("Microphone capture started");

        Ok(frame_rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if !self.capturing {
            return Ok(());
        }

        info!("Stopping microphone capture");

        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            // Worker wakes at frame cadence, so this join is bounded.
            let _ = tokio::task::spawn_blocking(move || worker.join()).await;
        }

        for track in &self.tracks {
            track.stop();
        }
        self.capturing = false;

        info!("Microphone capture stopped");

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn tracks(&self) -> Vec<MediaTrack> {
        self.tracks.clone()
    }

    fn name(&self) -> &str {
        "cpal microphone"
    }
}

fn map_build_error(e: cpal::BuildStreamError) -> CaptureError {
    match e {
        cpal::BuildStreamError::DeviceNotAvailable => {
            CaptureError::DeviceUnavailable("input device disappeared".to_string())
        }
        cpal::BuildStreamError::BackendSpecific { err } => {
            let description = err.to_string();
            let lowered = description.to_lowercase();
            if lowered.contains("denied") || lowered.contains("permission") {
                CaptureError::PermissionDenied(description)
            } else {
                CaptureError::DeviceUnavailable(description)
            }
        }
        other => CaptureError::DeviceUnavailable(other.to_string()),
    }
}

/// Owns the cpal stream for its whole lifetime and forwards frames until the
/// stop flag is raised.
fn run_stream_worker(
    device: cpal::Device,
    config: CaptureConfig,
    stop_flag: Arc<AtomicBool>,
    frame_tx: mpsc::Sender<AudioFrame>,
    ready_tx: oneshot::Sender<Result<(), CaptureError>>,
) {
    let stream_config = match device.default_input_config() {
        Ok(c) => c,
        Err(e) => {
            let _ = ready_tx.send(Err(CaptureError::DeviceUnavailable(format!(
                "no supported stream config: {e}"
            ))));
            return;
        }
    };

    let device_rate = stream_config.sample_rate().0;
    let device_channels = stream_config.channels();
    let sample_format = stream_config.sample_format();

    let shared: Arc<Mutex<Vec<i16>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&shared);

    let err_fn = |e| warn!("Capture stream error: {}", e);

    let stream = match sample_format {
        SampleFormat::F32 => device.build_input_stream(
            &stream_config.into(),
            move |data: &[f32], _| {
                if let Ok(mut buf) = sink.lock() {
                    buf.extend(data.iter().map(|&s| {
                        (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
                    }));
                }
            },
            err_fn,
            None,
        ),
        SampleFormat::I16 => device.build_input_stream(
            &stream_config.into(),
            move |data: &[i16], _| {
                if let Ok(mut buf) = sink.lock() {
                    buf.extend_from_slice(data);
                }
            },
            err_fn,
            None,
        ),
        other => {
            let _ = ready_tx.send(Err(CaptureError::DeviceUnavailable(format!(
                "unsupported sample format: {other:?}"
            ))));
            return;
        }
    };

    let stream = match stream {
        Ok(s) => s,
        Err(e) => {
            let _ = ready_tx.send(Err(map_build_error(e)));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(CaptureError::DeviceUnavailable(e.to_string())));
        return;
    }

    let _ = ready_tx.send(Ok(()));

    let started = Instant::now();
    let frame_period = Duration::from_millis(config.buffer_duration_ms);

    while !stop_flag.load(Ordering::SeqCst) {
        std::thread::sleep(frame_period);

        let raw: Vec<i16> = match shared.lock() {
            Ok(mut buf) => std::mem::take(&mut *buf),
            Err(_) => break,
        };
        if raw.is_empty() {
            continue;
        }

        let samples = normalize_samples(&raw, device_channels, device_rate, config.sample_rate);
        let frame = AudioFrame {
            samples,
            sample_rate: config.sample_rate.min(device_rate),
            channels: 1,
            timestamp_ms: started.elapsed().as_millis() as u64,
        };

        if frame_tx.blocking_send(frame).is_err() {
            break;
        }
    }

    drop(stream);
}

/// Downmix to mono and decimate to the target rate.
fn normalize_samples(raw: &[i16], channels: u16, device_rate: u32, target_rate: u32) -> Vec<i16> {
    let mono: Vec<i16> = if channels <= 1 {
        raw.to_vec()
    } else {
        raw.chunks_exact(channels as usize)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / channels as i32) as i16
            })
            .collect()
    };

    if device_rate <= target_rate {
        return mono;
    }

    let ratio = (device_rate / target_rate).max(1);
    mono.iter().step_by(ratio as usize).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stereo_downmix_averages_channels() {
        let raw = vec![100i16, 300, -100, -300];
        let mono = normalize_samples(&raw, 2, 16000, 16000);
        assert_eq!(mono, vec![200, -200]);
    }

    #[test]
    fn decimation_halves_a_double_rate_stream() {
        let raw: Vec<i16> = (0..8).collect();
        let mono = normalize_samples(&raw, 1, 32000, 16000);
        assert_eq!(mono, vec![0, 2, 4, 6]);
    }
}
