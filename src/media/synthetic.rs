// Synthetic capture backend: a generated sine tone in place of real hardware.
//
// Used by tests and headless runs. Provides the same track/lifecycle surface
// as the device backend, including a fake camera track, so teardown paths can
// be exercised without a microphone.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use super::backend::{AudioFrame, CaptureBackend, CaptureConfig, CaptureError, MediaTrack, TrackKind};

pub struct SyntheticBackend {
    frequency_hz: f32,
    amplitude: f32,
    config: CaptureConfig,
    running: Arc<AtomicBool>,
    generator: Option<JoinHandle<()>>,
    tracks: Vec<MediaTrack>,
    capturing: bool,
}

impl SyntheticBackend {
    pub fn new(frequency_hz: f32, amplitude: f32, config: CaptureConfig) -> Self {
        Self {
            frequency_hz,
            amplitude: amplitude.clamp(0.0, 1.0),
            config,
            running: Arc::new(AtomicBool::new(false)),
            generator: None,
            tracks: Vec::new(),
            capturing: false,
        }
    }
}

#[async_trait::async_trait]
impl CaptureBackend for SyntheticBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>, CaptureError> {
        if self.capturing {
            return Err(CaptureError::DeviceUnavailable(
                "already capturing".to_string(),
            ));
        }

        let (tx, rx) = mpsc::channel::<AudioFrame>(100);

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);

        let sample_rate = self.config.sample_rate;
        let frame_ms = self.config.buffer_duration_ms;
        let samples_per_frame = (sample_rate as u64 * frame_ms / 1000) as usize;
        let frequency = self.frequency_hz;
        let amplitude = self.amplitude;

        let generator = tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_millis(frame_ms));
            let mut elapsed_ms: u64 = 0;
            let mut phase: u64 = 0;

            loop {
                interval.tick().await;
                if !running.load(Ordering::SeqCst) {
                    break;
                }

                let samples: Vec<i16> = (0..samples_per_frame)
                    .map(|i| {
                        let t = (phase + i as u64) as f32 / sample_rate as f32;
                        let value = (2.0 * std::f32::consts::PI * frequency * t).sin();
                        (value * amplitude * i16::MAX as f32) as i16
                    })
                    .collect();
                phase += samples_per_frame as u64;

                let frame = AudioFrame {
                    samples,
                    sample_rate,
                    channels: 1,
                    timestamp_ms: elapsed_ms,
                };
                elapsed_ms += frame_ms;

                if tx.send(frame).await.is_err() {
                    break;
                }
            }
        });

        self.generator = Some(generator);
        self.tracks = vec![MediaTrack::new(TrackKind::Audio)];
        if self.config.want_video {
            self.tracks.push(MediaTrack::new(TrackKind::Video));
        }
        self.capturing = true;

        info!(
            "Synthetic capture started ({}Hz tone, amplitude {:.2})",
            self.frequency_hz, self.amplitude
        );

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if !self.capturing {
            return Ok(());
        }

        self.running.store(false, Ordering::SeqCst);
        if let Some(generator) = self.generator.take() {
            generator.abort();
        }

        for track in &self.tracks {
            track.stop();
        }
        self.capturing = false;

        info!("Synthetic capture stopped");

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn tracks(&self) -> Vec<MediaTrack> {
        self.tracks.clone()
    }

    fn name(&self) -> &str {
        "synthetic tone"
    }
}
