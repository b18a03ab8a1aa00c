// Simulated progress shown while the analysis call is in flight.
//
// The percentage is purely illustrative: it climbs linearly toward 99 over an
// estimated window and holds there until the real result arrives. It must
// never be used to gate correctness.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::Rng;
use tokio::task::JoinHandle;
use tracing::info;

/// Estimated analysis latency the progress bar is paced against.
pub const ANALYSIS_ESTIMATE_MS: u64 = 45_000;

/// Progress advances at this granularity.
const PROGRESS_TICK_MS: u64 = 100;

/// The displayed tip rotates at this period.
const TIP_ROTATE_MS: u64 = 5_000;

/// Number of distinct tips shown per analysis wait.
pub const TIPS_PER_SESSION: usize = 5;

/// Ceiling the simulated progress holds at until completion.
const PROGRESS_CEILING: f32 = 99.0;

/// Coaching aphorisms rotated while the user waits.
pub const TIP_CORPUS: [&str; 30] = [
    "Slow down: pauses feel much longer to you than to your audience.",
    "Open with a question, a number, or a story, never with an apology.",
    "Your first sentence earns the attention the rest must keep.",
    "Breathe from your belly before you speak, not between words.",
    "Eye contact with one person at a time beats scanning the room.",
    "Replace filler words with silence; silence reads as confidence.",
    "Make one point per sentence and let it land.",
    "Gesture from the shoulder, not the wrist.",
    "Vary your pace: speed for excitement, slowness for weight.",
    "End sentences with your pitch down to sound certain.",
    "A concrete example beats three abstract claims.",
    "Tell them what you'll say, say it, then tell them what you said.",
    "Smile before you start; your voice will carry it.",
    "Record yourself weekly; your ear improves faster than your mouth.",
    "Stand with weight on both feet to stop swaying.",
    "Name your nervousness to yourself and it shrinks.",
    "The audience wants you to succeed; they are on your side.",
    "Speak to the back row and the front row will hear fine.",
    "Rhetorical questions wake up a drifting audience.",
    "Cut your draft by a third; it will still be too long.",
    "Stories carry data further than charts do.",
    "Rehearse transitions; that is where most speakers stumble.",
    "Drink water before, not during, your strongest point.",
    "Let your hands rest when you are not using them on purpose.",
    "A strong close is rehearsed word for word.",
    "Numbers stick when you compare them to familiar things.",
    "Address objections before your audience raises them.",
    "If you lose your place, repeat your last point calmly.",
    "Practice out loud; reading silently trains the wrong muscles.",
    "Enthusiasm is the only contagious part of a speech.",
];

struct ProgressInner {
    percent_bits: AtomicU32,
    tip_cursor: AtomicUsize,
    tips: Vec<&'static str>,
    progress_task: Mutex<Option<JoinHandle<()>>>,
    tip_task: Mutex<Option<JoinHandle<()>>>,
}

/// Drives the fake progress bar and the tip carousel during one analysis
/// wait. Both periodic tasks are cancelled together when the analysis
/// resolves, successfully or not.
pub struct AnalysisProgress {
    inner: Arc<ProgressInner>,
}

impl AnalysisProgress {
    /// Select the session's tips and start both periodic tasks.
    pub fn start() -> Self {
        let tips = select_tips(&mut rand::thread_rng());

        let inner = Arc::new(ProgressInner {
            percent_bits: AtomicU32::new(0f32.to_bits()),
            tip_cursor: AtomicUsize::new(0),
            tips,
            progress_task: Mutex::new(None),
            tip_task: Mutex::new(None),
        });

        let step = PROGRESS_CEILING / (ANALYSIS_ESTIMATE_MS as f32 / PROGRESS_TICK_MS as f32);
        let progress_inner = Arc::clone(&inner);
        let progress_task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(PROGRESS_TICK_MS));
            interval.tick().await;
            loop {
                interval.tick().await;
                let current = f32::from_bits(progress_inner.percent_bits.load(Ordering::Relaxed));
                let next = (current + step).min(PROGRESS_CEILING);
                progress_inner
                    .percent_bits
                    .store(next.to_bits(), Ordering::Relaxed);
            }
        });

        let tip_inner = Arc::clone(&inner);
        let tip_task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(TIP_ROTATE_MS));
            interval.tick().await;
            loop {
                interval.tick().await;
                tip_inner.tip_cursor.fetch_add(1, Ordering::Relaxed);
            }
        });

        if let Ok(mut slot) = inner.progress_task.lock() {
            *slot = Some(progress_task);
        }
        if let Ok(mut slot) = inner.tip_task.lock() {
            *slot = Some(tip_task);
        }

        info!("Analysis progress simulation started");

        Self { inner }
    }

    /// Simulated completion percentage in [0, 99].
    pub fn percent(&self) -> f32 {
        f32::from_bits(self.inner.percent_bits.load(Ordering::Relaxed))
    }

    /// The tip currently on display.
    pub fn current_tip(&self) -> &'static str {
        let cursor = self.inner.tip_cursor.load(Ordering::Relaxed);
        self.inner.tips[cursor % self.inner.tips.len()]
    }

    /// The tips selected for this analysis wait, in rotation order.
    pub fn tips(&self) -> &[&'static str] {
        &self.inner.tips
    }

    /// Cancel both periodic tasks. No further ticks fire afterwards.
    pub fn cancel(&self) {
        if let Ok(mut slot) = self.inner.progress_task.lock() {
            if let Some(task) = slot.take() {
                task.abort();
            }
        }
        if let Ok(mut slot) = self.inner.tip_task.lock() {
            if let Some(task) = slot.take() {
                task.abort();
            }
        }
        info!("Analysis progress simulation cancelled");
    }
}

impl Drop for AnalysisProgress {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Choose `TIPS_PER_SESSION` distinct tips uniformly via a partial
/// Fisher-Yates shuffle over the corpus indices.
fn select_tips<R: Rng>(rng: &mut R) -> Vec<&'static str> {
    let mut indices: Vec<usize> = (0..TIP_CORPUS.len()).collect();
    for i in 0..TIPS_PER_SESSION {
        let j = rng.gen_range(i..indices.len());
        indices.swap(i, j);
    }
    indices[..TIPS_PER_SESSION]
        .iter()
        .map(|&i| TIP_CORPUS[i])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn selection_yields_five_distinct_corpus_tips() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let tips = select_tips(&mut rng);
            assert_eq!(tips.len(), TIPS_PER_SESSION);
            let unique: HashSet<_> = tips.iter().collect();
            assert_eq!(unique.len(), TIPS_PER_SESSION);
            for tip in &tips {
                assert!(TIP_CORPUS.contains(tip));
            }
        }
    }

    #[test]
    fn every_corpus_tip_is_reachable() {
        let mut rng = rand::thread_rng();
        let mut seen = HashSet::new();
        for _ in 0..2000 {
            for tip in select_tips(&mut rng) {
                seen.insert(tip);
            }
        }
        assert_eq!(seen.len(), TIP_CORPUS.len());
    }
}
