//! Per-stream processing stages.
//!
//! Three stages make up the shaping path: a resonant lowpass that creates
//! the boost, a fixed lowpass that isolates low-frequency energy for the
//! sidechain detector, and a fixed-curve compressor that tames the wet
//! path before the boost is summed in.

use retumbo_core::{
    Biquad, Effect, EnvelopeFollower, SmoothedParam, fast_db_to_linear, fast_linear_to_db,
    lowpass_coefficients,
};

/// Resonant lowpass that produces the low-end boost.
///
/// Cutoff and Q are smoothed so parameter sweeps do not zipper. Coefficient
/// recomputation is deferred until the smoothers actually move.
#[derive(Debug, Clone)]
pub struct BoostFilter {
    biquad: Biquad,
    cutoff: SmoothedParam,
    q: SmoothedParam,
    sample_rate: f32,
    needs_update: bool,
}

impl BoostFilter {
    /// Create a boost filter starting at the given cutoff and Q.
    pub fn new(sample_rate: f32, cutoff_hz: f32, q: f32) -> Self {
        let mut filter = Self {
            biquad: Biquad::new(),
            cutoff: SmoothedParam::slow(cutoff_hz.clamp(20.0, sample_rate * 0.49), sample_rate),
            q: SmoothedParam::slow(q.clamp(0.1, 20.0), sample_rate),
            sample_rate,
            needs_update: true,
        };
        filter.update_coefficients();
        filter
    }

    /// Set cutoff frequency in Hz.
    pub fn set_cutoff_hz(&mut self, cutoff: f32) {
        let clamped = cutoff.clamp(20.0, self.sample_rate * 0.49);
        self.cutoff.set_target(clamped);
        self.needs_update = true;
    }

    /// Set Q factor (resonance).
    pub fn set_q(&mut self, q: f32) {
        let clamped = q.clamp(0.1, 20.0);
        self.q.set_target(clamped);
        self.needs_update = true;
    }

    /// Cutoff the smoother is heading for.
    pub fn cutoff_target(&self) -> f32 {
        self.cutoff.target()
    }

    /// Q the smoother is heading for.
    pub fn q_target(&self) -> f32 {
        self.q.target()
    }

    fn update_coefficients(&mut self) {
        let cutoff = self.cutoff.get();
        let q = self.q.get();

        let (b0, b1, b2, a0, a1, a2) = lowpass_coefficients(cutoff, q, self.sample_rate);
        self.biquad.set_coefficients(b0, b1, b2, a0, a1, a2);
        self.needs_update = false;
    }
}

impl Effect for BoostFilter {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        self.cutoff.advance();
        self.q.advance();

        if self.needs_update || !self.cutoff.is_settled() || !self.q.is_settled() {
            self.update_coefficients();
        }

        // No limiter here: resonance is meant to exceed unity, the duck
        // gain and output stage own the overall level.
        self.biquad.process(input)
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.cutoff.set_sample_rate(sample_rate);
        self.q.set_sample_rate(sample_rate);
        self.needs_update = true;
        self.update_coefficients();
    }

    fn reset(&mut self) {
        self.biquad.clear();
        self.cutoff.snap_to_target();
        self.q.snap_to_target();
        self.needs_update = true;
        self.update_coefficients();
    }
}

/// Detection filter center frequency. Everything above kick territory is
/// discarded before the analysis window sees it.
pub const DETECTION_CUTOFF_HZ: f32 = 100.0;

/// Detection filter Q. Flat-ish passband, no added resonance.
pub const DETECTION_Q: f32 = 1.0;

/// Fixed lowpass feeding the sidechain analysis window.
#[derive(Debug, Clone)]
pub struct DetectionFilter {
    biquad: Biquad,
}

impl DetectionFilter {
    /// Create the detection filter for the given sample rate.
    pub fn new(sample_rate: f32) -> Self {
        let mut filter = Self { biquad: Biquad::new() };
        filter.set_sample_rate(sample_rate);
        filter
    }
}

impl Effect for DetectionFilter {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        self.biquad.process(input)
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        let (b0, b1, b2, a0, a1, a2) =
            lowpass_coefficients(DETECTION_CUTOFF_HZ, DETECTION_Q, sample_rate);
        self.biquad.set_coefficients(b0, b1, b2, a0, a1, a2);
    }

    fn reset(&mut self) {
        self.biquad.clear();
    }
}

/// Soft-knee gain computer with a fixed curve.
#[derive(Debug, Clone)]
struct GainComputer {
    threshold_db: f32,
    ratio: f32,
    knee_db: f32,
}

impl GainComputer {
    fn new() -> Self {
        Self { threshold_db: -18.0, ratio: 4.0, knee_db: 6.0 }
    }

    #[inline]
    fn compute_gain_db(&self, input_db: f32) -> f32 {
        let overshoot = input_db - self.threshold_db;

        if overshoot <= -self.knee_db / 2.0 {
            0.0
        } else if overshoot > self.knee_db / 2.0 {
            -(overshoot * (1.0 - 1.0 / self.ratio))
        } else {
            let knee_factor = (overshoot + self.knee_db / 2.0) / self.knee_db;
            -(knee_factor * knee_factor * overshoot * (1.0 - 1.0 / self.ratio))
        }
    }
}

/// Fixed-curve compressor on the wet path.
///
/// -18 dB threshold, 4:1 ratio, 6 dB knee, 10 ms attack, 100 ms release,
/// no makeup gain. It exists to keep the trimmed signal from stacking up
/// with the boost, not to be a creative tool, so nothing is adjustable.
#[derive(Debug, Clone)]
pub struct WetCompressor {
    envelope: EnvelopeFollower,
    computer: GainComputer,
    last_gain_reduction_db: f32,
}

impl WetCompressor {
    /// Create a wet-path compressor for the given sample rate.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            envelope: EnvelopeFollower::with_times(sample_rate, 10.0, 100.0),
            computer: GainComputer::new(),
            last_gain_reduction_db: 0.0,
        }
    }

    /// Last computed gain reduction in dB (always non-positive).
    pub fn gain_reduction_db(&self) -> f32 {
        self.last_gain_reduction_db
    }
}

impl Effect for WetCompressor {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let envelope = self.envelope.process(input);
        let envelope_db = fast_linear_to_db(envelope);
        let gain_reduction_db = self.computer.compute_gain_db(envelope_db);
        self.last_gain_reduction_db = gain_reduction_db;

        input * fast_db_to_linear(gain_reduction_db)
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.envelope.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        self.envelope.reset();
        self.last_gain_reduction_db = 0.0;
    }
}
