//! Analysis tap: a fixed window over the detection signal.
//!
//! The sidechain detection filter writes every sample it produces into an
//! [`AnalysisTap`]; the ducking control loop reads the window's RMS once
//! per tick. The window length is a power of two so the ring index wraps
//! with a mask instead of a division.

use libm::sqrtf;

/// Number of samples in the analysis window.
pub const ANALYSIS_WINDOW_LEN: usize = 256;

const INDEX_MASK: usize = ANALYSIS_WINDOW_LEN - 1;

/// Fixed-size ring buffer holding the most recent detection samples.
///
/// A freshly created tap is all zeros, which reads as RMS 0 — silence,
/// classified as steady by the ducking law. That is the correct startup
/// behavior: no duck until real signal arrives.
#[derive(Debug, Clone)]
pub struct AnalysisTap {
    buffer: [f32; ANALYSIS_WINDOW_LEN],
    write_pos: usize,
}

impl AnalysisTap {
    /// Create an empty (silent) analysis window.
    pub fn new() -> Self {
        Self {
            buffer: [0.0; ANALYSIS_WINDOW_LEN],
            write_pos: 0,
        }
    }

    /// Push one detection sample, overwriting the oldest.
    #[inline]
    pub fn push(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) & INDEX_MASK;
    }

    /// RMS energy of the whole window: `sqrt(mean(x^2))`.
    ///
    /// O(window) arithmetic; cheap enough to run every control tick.
    pub fn rms(&self) -> f32 {
        let mut sum_squares = 0.0f32;
        for &sample in &self.buffer {
            sum_squares += sample * sample;
        }
        sqrtf(sum_squares / ANALYSIS_WINDOW_LEN as f32)
    }

    /// Zero the window (back to silence).
    pub fn clear(&mut self) {
        self.buffer = [0.0; ANALYSIS_WINDOW_LEN];
        self.write_pos = 0;
    }
}

impl Default for AnalysisTap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_window_is_silent() {
        let tap = AnalysisTap::new();
        assert_eq!(tap.rms(), 0.0);
    }

    #[test]
    fn constant_amplitude_rms() {
        let mut tap = AnalysisTap::new();
        for _ in 0..ANALYSIS_WINDOW_LEN {
            tap.push(0.5);
        }
        assert!((tap.rms() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn sign_does_not_matter() {
        let mut tap = AnalysisTap::new();
        for i in 0..ANALYSIS_WINDOW_LEN {
            tap.push(if i % 2 == 0 { 0.5 } else { -0.5 });
        }
        assert!((tap.rms() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn old_samples_age_out() {
        let mut tap = AnalysisTap::new();
        for _ in 0..ANALYSIS_WINDOW_LEN {
            tap.push(1.0);
        }
        // Overwrite the full window with silence
        for _ in 0..ANALYSIS_WINDOW_LEN {
            tap.push(0.0);
        }
        assert_eq!(tap.rms(), 0.0);
    }

    #[test]
    fn clear_resets_to_silence() {
        let mut tap = AnalysisTap::new();
        for _ in 0..10 {
            tap.push(0.9);
        }
        tap.clear();
        assert_eq!(tap.rms(), 0.0);
    }

    #[test]
    fn window_length_is_power_of_two() {
        assert!(ANALYSIS_WINDOW_LEN.is_power_of_two());
    }
}
