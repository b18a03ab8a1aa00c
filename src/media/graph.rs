use std::sync::{Arc, Mutex};

use anyhow::Result;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info, warn};

use super::analyser::{SpectrumAnalyser, VolumeMeter};
use super::backend::{CaptureBackend, CaptureBackendFactory, CaptureConfig, CaptureError, CaptureSource, MediaTrack};
use super::encoder::{negotiate_encoding, ChunkAccumulator, RecorderState, RecordingBlob};

/// Fixed input boost applied to every captured sample before it reaches the
/// analyser and the recorder, so monitoring and recording share one signal.
pub const GAIN_BOOST: f32 = 3.0;

/// Meter refresh period (animation-frame cadence).
pub const METER_INTERVAL_MS: u64 = 33;

/// One live hardware-bound media session.
///
/// Owns the capture backend, the processing graph
/// (source -> gain -> analyser -> recordable destination) and the two tasks
/// that keep it alive: the graph pump and the volume meter. `teardown`
/// releases everything and is safe to call from any exit path.
pub struct CaptureSession {
    backend: Box<dyn CaptureBackend>,
    tracks: Vec<MediaTrack>,
    meter: VolumeMeter,
    sink: Arc<Mutex<Option<ChunkAccumulator>>>,
    mime_type: &'static str,
    recorder_state: RecorderState,
    recording_started_at: Option<Instant>,
    graph_task: Option<JoinHandle<()>>,
    meter_task: Option<JoinHandle<()>>,
    config: CaptureConfig,
    torn_down: bool,
}

impl CaptureSession {
    /// Acquire capture hardware and build the processing graph.
    ///
    /// On failure the backend is responsible for leaving no hardware
    /// acquired; the session simply never exists.
    pub async fn acquire(
        source: CaptureSource,
        config: CaptureConfig,
    ) -> Result<Self, CaptureError> {
        let mut backend = CaptureBackendFactory::create(source, config.clone())?;
        let mut frame_rx = backend.start().await?;
        let tracks = backend.tracks();

        info!("Capture session acquired via {}", backend.name());

        let mime_type = negotiate_encoding();

        let analyser = Arc::new(Mutex::new(SpectrumAnalyser::new()));
        let sink: Arc<Mutex<Option<ChunkAccumulator>>> = Arc::new(Mutex::new(None));

        // Graph pump: boost every frame, feed the analyser, and forward to
        // the recordable destination while a recording is active.
        let graph_analyser = Arc::clone(&analyser);
        let graph_sink = Arc::clone(&sink);
        let graph_task = tokio::spawn(async move {
            while let Some(mut frame) = frame_rx.recv().await {
                for sample in &mut frame.samples {
                    let boosted = *sample as f32 * GAIN_BOOST;
                    *sample = boosted.clamp(i16::MIN as f32, i16::MAX as f32) as i16;
                }

                if let Ok(mut analyser) = graph_analyser.lock() {
                    analyser.push_samples(&frame.samples);
                }

                if let Ok(mut sink) = graph_sink.lock() {
                    if let Some(accumulator) = sink.as_mut() {
                        accumulator.write_frame(&frame);
                    }
                }
            }
        });

        // Volume meter: samples the analyser for the whole session lifetime,
        // independent of recording phase.
        let meter = VolumeMeter::new();
        let meter_out = meter.clone();
        let meter_analyser = Arc::clone(&analyser);
        let meter_task = tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(std::time::Duration::from_millis(METER_INTERVAL_MS));
            loop {
                interval.tick().await;
                let level = meter_analyser
                    .lock()
                    .map(|analyser| analyser.volume())
                    .unwrap_or(0.0);
                meter_out.set(level);
            }
        });

        Ok(Self {
            backend,
            tracks,
            meter,
            sink,
            mime_type,
            recorder_state: RecorderState::Inactive,
            recording_started_at: None,
            graph_task: Some(graph_task),
            meter_task: Some(meter_task),
            config,
            torn_down: false,
        })
    }

    /// Live level in [0, 100], updated at meter cadence. Never blocks.
    pub fn volume(&self) -> f32 {
        self.meter.level()
    }

    pub fn recorder_state(&self) -> RecorderState {
        self.recorder_state
    }

    pub fn mime_type(&self) -> &str {
        self.mime_type
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    pub fn has_live_tracks(&self) -> bool {
        self.tracks.iter().any(|t| t.is_live())
    }

    /// Begin accumulating encoded chunks at the given interval.
    ///
    /// A no-op unless the recorder is inactive. Fails with `EncoderStart`
    /// when the graph has already shut down; the caller may retry.
    pub fn start_recording(&mut self, chunk_interval_ms: u64) -> Result<(), CaptureError> {
        if self.recorder_state != RecorderState::Inactive {
            warn!("Recorder already started, ignoring");
            return Ok(());
        }

        let graph_alive = self
            .graph_task
            .as_ref()
            .map(|t| !t.is_finished())
            .unwrap_or(false);
        if self.torn_down || !graph_alive {
            return Err(CaptureError::EncoderStart(
                "capture graph is not running".to_string(),
            ));
        }

        let accumulator = ChunkAccumulator::new(
            self.config.sample_rate,
            self.config.channels,
            chunk_interval_ms,
        );
        if let Ok(mut sink) = self.sink.lock() {
            *sink = Some(accumulator);
        }

        self.recorder_state = RecorderState::Recording;
        self.recording_started_at = Some(Instant::now());

        info!(
            "Recording started ({}, chunk interval {}ms)",
            self.mime_type, chunk_interval_ms
        );

        Ok(())
    }

    /// Finalize the recording into one blob and release all hardware.
    ///
    /// Duration is wall-clock elapsed since the recording started; when the
    /// clock delta is non-positive it falls back to `fallback_seconds`
    /// (configured duration minus remaining time). The release sequence runs
    /// unconditionally, even when finalization fails.
    pub async fn stop_recording(
        &mut self,
        fallback_seconds: f64,
    ) -> Result<(RecordingBlob, f64)> {
        anyhow::ensure!(
            self.recorder_state == RecorderState::Recording,
            "recorder is not active"
        );

        let elapsed = self
            .recording_started_at
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        let duration_seconds = if elapsed > 0.0 {
            elapsed
        } else {
            fallback_seconds.max(0.0)
        };

        let accumulator = self
            .sink
            .lock()
            .ok()
            .and_then(|mut sink| sink.take())
            .unwrap_or_else(|| {
                ChunkAccumulator::new(self.config.sample_rate, self.config.channels, 1000)
            });

        self.recorder_state = RecorderState::Stopped;

        let finalized = accumulator.finalize(self.mime_type);

        // Release obligation: runs whether or not finalization succeeded.
        self.teardown().await;

        let blob = finalized?;

        info!(
            "Recording stopped: {} bytes of {} over {:.1}s",
            blob.len(),
            blob.mime_type,
            duration_seconds
        );

        Ok((blob, duration_seconds))
    }

    /// Stop every hardware track, end the graph, cancel the meter loop.
    ///
    /// Idempotent; must be reachable from every exit path (completion,
    /// cancel, error).
    pub async fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        if let Some(task) = self.meter_task.take() {
            task.abort();
        }
        if let Some(task) = self.graph_task.take() {
            task.abort();
        }

        if let Err(e) = self.backend.stop().await {
            error!("Failed to stop capture backend: {}", e);
        }
        for track in &self.tracks {
            track.stop();
        }

        if let Ok(mut sink) = self.sink.lock() {
            *sink = None;
        }
        self.meter.set(0.0);

        info!("Capture session torn down");
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        // Last-resort guard: the synchronous part of the release obligation.
        if let Some(task) = self.meter_task.take() {
            task.abort();
        }
        if let Some(task) = self.graph_task.take() {
            task.abort();
        }
        for track in &self.tracks {
            track.stop();
        }
    }
}
