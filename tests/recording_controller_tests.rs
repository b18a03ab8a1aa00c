// Integration tests for the recording stage controller.
//
// These verify the phase sequencing (prep -> recording -> done), the manual
// skip/extend/finish/cancel operations, auto-stop on expiry, and that capture
// hardware is released on every exit path. The tokio clock is paused so the
// one-second tickers are deterministic.

use anyhow::Result;
use podium::media::{CaptureConfig, CaptureSession, CaptureSource};
use podium::recording::{RecordingController, RecordingEvent, RecordingPhase, EXTEND_STEP_SECONDS};
use podium::session::SessionConfig;
use std::time::Duration;
use tokio::sync::mpsc;

async fn stage(config: &SessionConfig) -> (RecordingController, mpsc::Receiver<RecordingEvent>) {
    let capture = CaptureSession::acquire(
        CaptureSource::Synthetic {
            frequency_hz: 440.0,
            amplitude: 0.5,
        },
        CaptureConfig::default(),
    )
    .await
    .expect("synthetic capture should always acquire");

    RecordingController::new(config, capture)
}

fn session_config(duration_seconds: u32, prep_time_seconds: u32) -> SessionConfig {
    SessionConfig {
        duration_seconds,
        prep_time_seconds,
        ..SessionConfig::default()
    }
}

fn drain(rx: &mut mpsc::Receiver<RecordingEvent>) -> Vec<RecordingEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test(start_paused = true)]
async fn zero_prep_never_enters_the_prep_phase() -> Result<()> {
    let (controller, mut rx) = stage(&session_config(10, 0)).await;

    controller.start().await;
    assert_eq!(controller.phase(), RecordingPhase::Recording);

    tokio::time::sleep(Duration::from_secs(3)).await;

    let events = drain(&mut rx);
    assert!(
        !events.iter().any(|e| matches!(e, RecordingEvent::PrepTick { .. })),
        "no prep tick may fire when prep time is zero"
    );
    assert!(events
        .iter()
        .any(|e| matches!(e, RecordingEvent::RecordingStarted)));

    controller.cancel().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn prep_counts_down_then_recording_begins() -> Result<()> {
    let (controller, mut rx) = stage(&session_config(5, 2)).await;

    controller.start().await;
    assert_eq!(controller.phase(), RecordingPhase::Prep);
    assert_eq!(controller.prep_remaining_seconds(), 2);

    // The recording countdown must not move while in prep.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(controller.remaining_seconds(), 5);

    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(controller.phase(), RecordingPhase::Recording);

    let events = drain(&mut rx);
    let prep_ticks: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            RecordingEvent::PrepTick { remaining_seconds } => Some(*remaining_seconds),
            _ => None,
        })
        .collect();
    assert_eq!(prep_ticks, vec![1, 0]);

    controller.cancel().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn skip_prep_transitions_immediately_and_stops_the_prep_timer() -> Result<()> {
    let (controller, mut rx) = stage(&session_config(30, 60)).await;

    controller.start().await;
    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(controller.phase(), RecordingPhase::Prep);

    controller.skip_prep().await;
    assert_eq!(controller.phase(), RecordingPhase::Recording);

    drain(&mut rx);
    tokio::time::sleep(Duration::from_secs(3)).await;

    // The prep timer was cancelled on the transition: no prep tick may
    // arrive after recording started.
    let events = drain(&mut rx);
    assert!(
        !events.iter().any(|e| matches!(e, RecordingEvent::PrepTick { .. })),
        "prep timer leaked into the recording phase"
    );

    controller.cancel().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn skip_prep_outside_prep_is_ignored() -> Result<()> {
    let (controller, _rx) = stage(&session_config(10, 0)).await;

    controller.start().await;
    assert_eq!(controller.phase(), RecordingPhase::Recording);

    controller.skip_prep().await;
    assert_eq!(controller.phase(), RecordingPhase::Recording);

    controller.cancel().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn each_extension_adds_exactly_fifteen_seconds() -> Result<()> {
    let (controller, _rx) = stage(&session_config(100, 0)).await;

    controller.start().await;
    assert_eq!(controller.remaining_seconds(), 100);

    for n in 1..=4u32 {
        controller.extend_time();
        assert_eq!(
            controller.remaining_seconds(),
            100 + n * EXTEND_STEP_SECONDS
        );
    }

    controller.cancel().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn extension_is_rejected_outside_the_recording_phase() -> Result<()> {
    let (controller, _rx) = stage(&session_config(100, 30)).await;

    // Armed: not yet started.
    controller.extend_time();
    assert_eq!(controller.remaining_seconds(), 100);

    // Prep: countdown running, still not recording.
    controller.start().await;
    assert_eq!(controller.phase(), RecordingPhase::Prep);
    controller.extend_time();
    assert_eq!(controller.remaining_seconds(), 100);

    controller.cancel().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn countdown_expiry_stops_automatically_and_delivers_the_recording() -> Result<()> {
    let (controller, mut rx) = stage(&session_config(2, 0)).await;

    controller.start().await;
    tokio::time::sleep(Duration::from_secs(3)).await;

    let finished = loop {
        match rx.recv().await.expect("event stream ended early") {
            RecordingEvent::Finished {
                blob,
                duration_seconds,
            } => break (blob, duration_seconds),
            _ => continue,
        }
    };

    assert!(!finished.0.is_empty());
    assert_eq!(finished.0.mime_type, "audio/wav");
    assert!((finished.1 - 2.0).abs() < 0.1, "duration was {}", finished.1);

    assert!(controller.is_done());
    assert!(
        controller.hardware_released().await,
        "auto-stop must release all hardware tracks"
    );

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn manual_finish_delivers_the_elapsed_duration() -> Result<()> {
    let (controller, mut rx) = stage(&session_config(100, 0)).await;

    controller.start().await;
    tokio::time::sleep(Duration::from_secs(4)).await;

    controller.finish().await;

    let finished = loop {
        match rx.recv().await.expect("event stream ended early") {
            RecordingEvent::Finished {
                duration_seconds, ..
            } => break duration_seconds,
            _ => continue,
        }
    };

    assert!((finished - 4.0).abs() < 0.1, "duration was {finished}");
    assert!(controller.is_done());
    assert!(controller.hardware_released().await);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn finish_is_ignored_before_recording_starts() -> Result<()> {
    let (controller, mut rx) = stage(&session_config(10, 30)).await;

    controller.start().await;
    assert_eq!(controller.phase(), RecordingPhase::Prep);

    controller.finish().await;
    assert_eq!(controller.phase(), RecordingPhase::Prep);
    assert!(!drain(&mut rx)
        .iter()
        .any(|e| matches!(e, RecordingEvent::Finished { .. })));

    controller.cancel().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn cancel_releases_hardware_without_a_result() -> Result<()> {
    let (controller, mut rx) = stage(&session_config(10, 0)).await;

    controller.start().await;
    tokio::time::sleep(Duration::from_secs(2)).await;

    controller.cancel().await;

    assert!(controller.is_done());
    assert!(
        controller.hardware_released().await,
        "cancel must release all hardware tracks"
    );

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(e, RecordingEvent::Cancelled)));
    assert!(
        !events.iter().any(|e| matches!(e, RecordingEvent::Finished { .. })),
        "cancel must not deliver a recording"
    );

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn cancel_during_prep_releases_hardware() -> Result<()> {
    let (controller, mut rx) = stage(&session_config(10, 30)).await;

    controller.start().await;
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(controller.phase(), RecordingPhase::Prep);

    controller.cancel().await;

    assert!(controller.is_done());
    assert!(controller.hardware_released().await);
    assert!(drain(&mut rx)
        .iter()
        .any(|e| matches!(e, RecordingEvent::Cancelled)));

    Ok(())
}
