//! Parameter smoothing to avoid zipper noise.
//!
//! Every gain stage in a chain is a [`SmoothedParam`]: external writes set
//! a target, and the audio path advances the smoothed value one sample at
//! a time. Audible clicks from step changes (including the ducking control
//! signal landing on the boost gain) are eliminated by the one-pole ramp.

use libm::expf;

/// A parameter value with exponential smoothing toward its target.
///
/// Uses a one-pole lowpass on the control value, giving an RC-like
/// response: fast initial movement, asymptotic settle.
///
/// # Example
///
/// ```rust
/// use retumbo_core::SmoothedParam;
///
/// let mut gain = SmoothedParam::standard(1.0, 48000.0);
/// gain.set_target(0.5);
///
/// // In the audio loop:
/// let g = gain.advance();
/// ```
#[derive(Debug, Clone)]
pub struct SmoothedParam {
    /// Current smoothed value
    current: f32,
    /// Target value we're smoothing towards
    target: f32,
    /// Smoothing coefficient (0 = frozen, 1 = instant)
    coeff: f32,
    /// Sample rate in Hz
    sample_rate: f32,
    /// Smoothing time in milliseconds
    smoothing_time_ms: f32,
}

impl SmoothedParam {
    /// Create a new smoothed parameter with initial value.
    ///
    /// Smoothing is disabled until [`set_sample_rate`](Self::set_sample_rate)
    /// and [`set_smoothing_time_ms`](Self::set_smoothing_time_ms) are called;
    /// prefer the configured constructors below.
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            coeff: 1.0,
            sample_rate: 48000.0,
            smoothing_time_ms: 0.0,
        }
    }

    /// Create a smoothed parameter with full configuration.
    pub fn with_config(initial: f32, sample_rate: f32, smoothing_time_ms: f32) -> Self {
        let mut param = Self::new(initial);
        param.sample_rate = sample_rate;
        param.smoothing_time_ms = smoothing_time_ms;
        param.recalculate_coeff();
        param
    }

    /// Standard 10 ms smoothing — the default for gain staging, and the
    /// ramp length used when the ducking control signal writes the boost
    /// gain.
    pub fn standard(initial: f32, sample_rate: f32) -> Self {
        Self::with_config(initial, sample_rate, 10.0)
    }

    /// Slow 50 ms smoothing for filter cutoff/resonance, where faster
    /// ramps still produce audible sweeps.
    pub fn slow(initial: f32, sample_rate: f32) -> Self {
        Self::with_config(initial, sample_rate, 50.0)
    }

    /// Set the target value (parameter will smooth towards this).
    #[inline]
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Set target and immediately snap to it (no smoothing).
    #[inline]
    pub fn set_immediate(&mut self, value: f32) {
        self.target = value;
        self.current = value;
    }

    /// Update sample rate and recalculate the smoothing coefficient.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_coeff();
    }

    /// Set smoothing time in milliseconds.
    pub fn set_smoothing_time_ms(&mut self, time_ms: f32) {
        self.smoothing_time_ms = time_ms;
        self.recalculate_coeff();
    }

    /// Get the next smoothed value (advances by one sample).
    #[inline]
    pub fn advance(&mut self) -> f32 {
        // One-pole lowpass: y[n] = y[n-1] + coeff * (target - y[n-1])
        self.current = self.current + self.coeff * (self.target - self.current);
        self.current
    }

    /// Get the current smoothed value without advancing.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Get the target value.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Check if the parameter has reached its target (within epsilon).
    #[inline]
    pub fn is_settled(&self) -> bool {
        (self.current - self.target).abs() < 1e-6
    }

    /// Skip ahead to the target value immediately.
    #[inline]
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
    }

    /// Recalculate the smoothing coefficient from sample rate and time.
    ///
    /// The one-pole difference equation
    /// `y[n] = y[n-1] + coeff * (target - y[n-1])` has time constant tau
    /// (time to reach 63.2% of target) related to the coefficient by
    /// `coeff = 1 - exp(-1 / (tau * sample_rate))` with
    /// `tau = smoothing_time_ms / 1000`. After 5*tau the parameter is at
    /// 99.3% of target, effectively settled for audio purposes.
    ///
    /// When smoothing_time_ms is 0, coeff is 1.0 for instant response.
    fn recalculate_coeff(&mut self) {
        if self.smoothing_time_ms <= 0.0 || self.sample_rate <= 0.0 {
            self.coeff = 1.0;
        } else {
            let time_constant = self.smoothing_time_ms / 1000.0;
            let samples = time_constant * self.sample_rate;
            self.coeff = 1.0 - expf(-1.0 / samples);
        }
    }
}

impl Default for SmoothedParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}
