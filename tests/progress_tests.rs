// Integration tests for the simulated analysis progress.
//
// The percentage is illustrative: it must climb monotonically, hold at 99
// until the analysis resolves, and stop ticking the moment it is cancelled.

use podium::session::{AnalysisProgress, TIPS_PER_SESSION, TIP_CORPUS};
use std::collections::HashSet;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn progress_is_monotonic_and_holds_at_ninety_nine() {
    let progress = AnalysisProgress::start();
    assert_eq!(progress.percent(), 0.0);

    let mut previous = 0.0;
    for _ in 0..13 {
        tokio::time::sleep(Duration::from_secs(4)).await;
        let current = progress.percent();
        assert!(current >= previous, "progress must never decrease");
        assert!(current <= 99.0, "progress must never exceed 99");
        previous = current;
    }

    // Well past the estimated window: pinned to the ceiling.
    assert_eq!(progress.percent(), 99.0);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(progress.percent(), 99.0);

    progress.cancel();
}

#[tokio::test(start_paused = true)]
async fn progress_paces_against_the_estimated_window() {
    let progress = AnalysisProgress::start();

    // Halfway through the 45s estimate the bar should be near halfway.
    tokio::time::sleep(Duration::from_millis(22_500)).await;
    let halfway = progress.percent();
    assert!(
        (45.0..=55.0).contains(&halfway),
        "expected roughly half progress, got {halfway}"
    );

    progress.cancel();
}

#[tokio::test(start_paused = true)]
async fn five_distinct_tips_are_selected_from_the_corpus() {
    let progress = AnalysisProgress::start();

    let tips = progress.tips();
    assert_eq!(tips.len(), TIPS_PER_SESSION);

    let unique: HashSet<_> = tips.iter().collect();
    assert_eq!(unique.len(), TIPS_PER_SESSION, "tips must not repeat");

    for tip in tips {
        assert!(TIP_CORPUS.contains(tip), "tip must come from the corpus");
    }

    progress.cancel();
}

#[tokio::test(start_paused = true)]
async fn tips_rotate_every_five_seconds_and_wrap() {
    let progress = AnalysisProgress::start();
    let tips: Vec<&str> = progress.tips().to_vec();

    assert_eq!(progress.current_tip(), tips[0]);

    tokio::time::sleep(Duration::from_millis(5_100)).await;
    assert_eq!(progress.current_tip(), tips[1]);

    tokio::time::sleep(Duration::from_millis(5_000)).await;
    assert_eq!(progress.current_tip(), tips[2]);

    // Full cycle wraps back to the first selection.
    tokio::time::sleep(Duration::from_millis(15_000)).await;
    assert_eq!(progress.current_tip(), tips[0]);

    progress.cancel();
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_both_periodic_processes() {
    let progress = AnalysisProgress::start();

    tokio::time::sleep(Duration::from_secs(10)).await;
    let frozen_percent = progress.percent();
    let frozen_tip = progress.current_tip();

    progress.cancel();

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(progress.percent(), frozen_percent, "no tick after cancel");
    assert_eq!(progress.current_tip(), frozen_tip, "no rotation after cancel");
}
