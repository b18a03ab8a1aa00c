// Frequency-domain analyser for the live level meter.
//
// Keeps a sliding window of the most recent gain-boosted samples and exposes
// byte-scaled frequency bins. The meter reads the mean bin magnitude, scales
// it by 2.5 and clamps to 100.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Analysis window size in samples. Bins cover window/2 frequencies.
pub const ANALYSER_WINDOW: usize = 256;

/// Decibel range mapped onto the byte bins, quietest to loudest.
const MIN_DECIBELS: f32 = -100.0;
const MAX_DECIBELS: f32 = -30.0;

/// Meter scale factor applied to the mean bin magnitude.
const VOLUME_SCALE: f32 = 2.5;

pub struct SpectrumAnalyser {
    fft: Arc<dyn Fft<f32>>,
    window: VecDeque<f32>,
}

impl SpectrumAnalyser {
    pub fn new() -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(ANALYSER_WINDOW);
        Self {
            fft,
            window: VecDeque::with_capacity(ANALYSER_WINDOW),
        }
    }

    /// Feed PCM samples into the sliding window.
    pub fn push_samples(&mut self, samples: &[i16]) {
        for &s in samples {
            if self.window.len() == ANALYSER_WINDOW {
                self.window.pop_front();
            }
            self.window.push_back(s as f32 / i16::MAX as f32);
        }
    }

    /// Compute byte-scaled frequency bins over the current window.
    ///
    /// Follows the analyser-node convention: Hann-windowed FFT, magnitudes
    /// converted to dB and mapped from [MIN_DECIBELS, MAX_DECIBELS] onto
    /// [0, 255].
    pub fn frequency_bins(&self) -> Vec<u8> {
        let n = ANALYSER_WINDOW;
        let mut buffer: Vec<Complex<f32>> = (0..n)
            .map(|i| {
                let sample = self.window.get(i).copied().unwrap_or(0.0);
                let hann = 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / n as f32).cos());
                Complex::new(sample * hann, 0.0)
            })
            .collect();

        self.fft.process(&mut buffer);

        buffer[..n / 2]
            .iter()
            .map(|c| {
                let magnitude = c.norm() / n as f32;
                let db = 20.0 * magnitude.max(1e-10).log10();
                let scaled = (db - MIN_DECIBELS) / (MAX_DECIBELS - MIN_DECIBELS);
                (scaled.clamp(0.0, 1.0) * 255.0) as u8
            })
            .collect()
    }

    /// Live level in [0, 100]: mean bin magnitude scaled by 2.5, clamped.
    pub fn volume(&self) -> f32 {
        let bins = self.frequency_bins();
        if bins.is_empty() {
            return 0.0;
        }
        let mean = bins.iter().map(|&b| b as f32).sum::<f32>() / bins.len() as f32;
        (mean * VOLUME_SCALE).min(100.0)
    }
}

impl Default for SpectrumAnalyser {
    fn default() -> Self {
        Self::new()
    }
}

/// Lock-free holder for the most recent meter reading.
///
/// The meter task writes at animation-frame cadence; readers never block.
#[derive(Clone, Debug, Default)]
pub struct VolumeMeter {
    level_bits: Arc<AtomicU32>,
}

impl VolumeMeter {
    pub fn new() -> Self {
        Self {
            level_bits: Arc::new(AtomicU32::new(0f32.to_bits())),
        }
    }

    pub fn set(&self, level: f32) {
        self.level_bits.store(level.to_bits(), Ordering::Relaxed);
    }

    /// Last sampled level in [0, 100].
    pub fn level(&self) -> f32 {
        f32::from_bits(self.level_bits.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_meters_at_zero() {
        let mut analyser = SpectrumAnalyser::new();
        analyser.push_samples(&vec![0i16; ANALYSER_WINDOW]);
        assert_eq!(analyser.volume(), 0.0);
    }

    #[test]
    fn loud_tone_raises_the_level() {
        let mut analyser = SpectrumAnalyser::new();
        let tone: Vec<i16> = (0..ANALYSER_WINDOW)
            .map(|i| {
                let t = i as f32 / 16000.0;
                ((2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.8 * i16::MAX as f32) as i16
            })
            .collect();
        analyser.push_samples(&tone);
        assert!(analyser.volume() > 0.0);
    }

    #[test]
    fn volume_never_exceeds_one_hundred() {
        let mut analyser = SpectrumAnalyser::new();
        analyser.push_samples(&vec![i16::MAX; ANALYSER_WINDOW]);
        assert!(analyser.volume() <= 100.0);
    }

    #[test]
    fn meter_round_trips_levels() {
        let meter = VolumeMeter::new();
        assert_eq!(meter.level(), 0.0);
        meter.set(42.5);
        assert_eq!(meter.level(), 42.5);
    }
}
