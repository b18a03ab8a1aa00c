// Integration tests for the capture session and its processing graph.
//
// All tests run against the synthetic tone backend with the tokio clock
// paused, so countdowns and meter cadence are deterministic.

use anyhow::Result;
use podium::media::{CaptureConfig, CaptureSession, CaptureSource, RecorderState, TrackKind};
use std::time::Duration;

fn tone_source() -> CaptureSource {
    CaptureSource::Synthetic {
        frequency_hz: 440.0,
        amplitude: 0.8,
    }
}

fn capture_config() -> CaptureConfig {
    CaptureConfig {
        sample_rate: 16000,
        channels: 1,
        buffer_duration_ms: 100,
        want_video: true,
    }
}

#[tokio::test(start_paused = true)]
async fn acquire_builds_graph_and_meters_the_signal() -> Result<()> {
    let session = CaptureSession::acquire(tone_source(), capture_config()).await?;

    assert_eq!(session.recorder_state(), RecorderState::Inactive);
    assert_eq!(session.tracks().len(), 2);
    assert!(session.tracks().iter().any(|t| t.kind() == TrackKind::Audio));
    assert!(session.tracks().iter().any(|t| t.kind() == TrackKind::Video));

    // Let the generator, graph and meter tasks run for a while.
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert!(
        session.volume() > 0.0,
        "a loud tone should register on the meter"
    );
    assert!(session.volume() <= 100.0);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn stop_recording_yields_blob_and_releases_every_track() -> Result<()> {
    let mut session = CaptureSession::acquire(tone_source(), capture_config()).await?;

    session.start_recording(1000)?;
    assert_eq!(session.recorder_state(), RecorderState::Recording);

    tokio::time::sleep(Duration::from_secs(2)).await;

    let (blob, duration) = session.stop_recording(0.0).await?;

    assert_eq!(blob.mime_type, "audio/wav");
    assert!(!blob.is_empty());
    assert!((duration - 2.0).abs() < 0.1, "duration was {duration}");

    assert_eq!(session.recorder_state(), RecorderState::Stopped);
    assert!(
        !session.has_live_tracks(),
        "all hardware tracks must be stopped after stop_recording"
    );

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn duration_falls_back_when_the_clock_has_not_advanced() -> Result<()> {
    let mut session = CaptureSession::acquire(tone_source(), capture_config()).await?;

    session.start_recording(1000)?;
    // Stop immediately: zero elapsed wall-clock, so the configured-minus-
    // remaining fallback must be used.
    let (_, duration) = session.stop_recording(7.0).await?;

    assert_eq!(duration, 7.0);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn start_recording_is_a_noop_when_already_recording() -> Result<()> {
    let mut session = CaptureSession::acquire(tone_source(), capture_config()).await?;

    session.start_recording(1000)?;
    tokio::time::sleep(Duration::from_secs(1)).await;

    // Second start must not reset or fail.
    session.start_recording(1000)?;
    assert_eq!(session.recorder_state(), RecorderState::Recording);

    tokio::time::sleep(Duration::from_secs(1)).await;
    let (blob, duration) = session.stop_recording(0.0).await?;

    assert!(!blob.is_empty());
    assert!((duration - 2.0).abs() < 0.1);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn teardown_is_unconditional_and_idempotent() -> Result<()> {
    let mut session = CaptureSession::acquire(tone_source(), capture_config()).await?;

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(session.has_live_tracks());

    session.teardown().await;
    assert!(!session.has_live_tracks());
    assert_eq!(session.volume(), 0.0);

    // A second teardown must be harmless.
    session.teardown().await;
    assert!(!session.has_live_tracks());

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn recording_after_teardown_reports_encoder_failure() -> Result<()> {
    let mut session = CaptureSession::acquire(tone_source(), capture_config()).await?;

    session.teardown().await;

    let err = session
        .start_recording(1000)
        .expect_err("starting on a torn-down graph must fail");
    assert!(err.to_string().contains("encoder"));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn synthetic_backend_honors_audio_only_config() -> Result<()> {
    let config = CaptureConfig {
        want_video: false,
        ..capture_config()
    };
    let session = CaptureSession::acquire(tone_source(), config).await?;

    assert_eq!(session.tracks().len(), 1);
    assert_eq!(session.tracks()[0].kind(), TrackKind::Audio);

    Ok(())
}
