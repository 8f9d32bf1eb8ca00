//! Transient-ducking control law.
//!
//! The boost path of a chain runs through a gain stage that this module
//! drives. Once per control tick the embedding layer reads the RMS of the
//! sidechain analysis window and calls [`Ducker::step`]:
//!
//! 1. Classify the window: **transient** if RMS exceeds
//!    [`RMS_TRANSIENT_THRESHOLD`], otherwise **steady**.
//! 2. Pick the target gain: 0 for a transient (full duck), the configured
//!    ceiling for steady signal.
//! 3. Move the control value toward the target with a one-pole step whose
//!    time constant depends on direction — [`ATTACK_TAU_SECONDS`] when
//!    ducking, a decay-scaled release (see [`release_tau_seconds`]) when
//!    swelling back.
//!
//! The asymmetry is the point: the boost collapses almost instantly when a
//! kick hits, then returns over hundreds of milliseconds between hits, so
//! the resonant low end never stacks on top of the drum itself.
//!
//! Ticks arrive at roughly display rate with a measured `dt`, so the step
//! uses the exact discretization `alpha = 1 - exp(-dt/tau)` rather than a
//! fixed per-tick coefficient. Clock anomalies (`dt <= 0`, huge `dt`) are
//! absorbed by clamping alpha to [0, 1].

use libm::expf;

/// Window RMS above this value classifies as a transient.
pub const RMS_TRANSIENT_THRESHOLD: f32 = 0.1;

/// Time constant while ducking (fast attack).
pub const ATTACK_TAU_SECONDS: f32 = 0.005;

/// Release time constant in seconds for a decay setting in percent.
///
/// Ranges from 0.1 s (`decay = 0`) to 0.5 s (`decay = 100`).
#[inline]
pub fn release_tau_seconds(decay_percent: f32) -> f32 {
    0.1 + (decay_percent.clamp(0.0, 100.0) / 100.0) * 0.4
}

/// Steady-state boost gain ceiling for a boom amount in percent.
///
/// `boom_amount = 50` gives a ceiling of 10; the resonant boost path is
/// narrow, so large linear gains here are expected.
#[inline]
pub fn boost_ceiling(boom_amount: f32) -> f32 {
    (boom_amount / 10.0) * 2.0
}

/// One-pole step coefficient for an elapsed time and time constant.
///
/// `alpha = 1 - exp(-dt/tau)`, clamped to [0, 1] so that zero or negative
/// `dt` (clock anomalies) freezes the control value instead of moving it
/// backwards, and an arbitrarily long `dt` lands exactly on the target.
#[inline]
pub fn smoothing_alpha(dt_secs: f32, tau_secs: f32) -> f32 {
    if tau_secs <= 0.0 {
        return if dt_secs > 0.0 { 1.0 } else { 0.0 };
    }
    (1.0 - expf(-dt_secs / tau_secs)).clamp(0.0, 1.0)
}

/// Ducking control state: the smoothed gain value for one boost stage.
///
/// Starts at 0 so a freshly started chain swells its boost in over the
/// release constant rather than opening at full ceiling.
///
/// # Example
///
/// ```rust
/// use retumbo_core::{Ducker, boost_ceiling, release_tau_seconds};
///
/// let mut ducker = Ducker::new();
/// let ceiling = boost_ceiling(50.0);
/// let release = release_tau_seconds(50.0);
///
/// // A loud window ducks toward zero...
/// let g = ducker.step(0.3, ceiling, release, 1.0 / 60.0);
/// assert!(g < 0.01);
///
/// // ...silence lets the boost swell back.
/// let g = ducker.step(0.0, ceiling, release, 1.0 / 60.0);
/// assert!(g > 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct Ducker {
    current: f32,
}

impl Ducker {
    /// Create a ducker with the control value at 0 (boost closed).
    pub fn new() -> Self {
        Self { current: 0.0 }
    }

    /// Whether a window RMS classifies as a transient.
    #[inline]
    pub fn is_transient(rms: f32) -> bool {
        rms > RMS_TRANSIENT_THRESHOLD
    }

    /// Current control value without stepping.
    #[inline]
    pub fn current(&self) -> f32 {
        self.current
    }

    /// Advance one control tick.
    ///
    /// * `rms` - RMS of the analysis window for this tick
    /// * `ceiling` - steady-state target gain, from [`boost_ceiling`]
    /// * `release_tau_secs` - release time constant, from
    ///   [`release_tau_seconds`]
    /// * `dt_secs` - measured time since the previous tick
    ///
    /// Returns the new control value.
    pub fn step(&mut self, rms: f32, ceiling: f32, release_tau_secs: f32, dt_secs: f32) -> f32 {
        let (target, tau) = if Self::is_transient(rms) {
            (0.0, ATTACK_TAU_SECONDS)
        } else {
            (ceiling, release_tau_secs)
        };

        let alpha = smoothing_alpha(dt_secs, tau);
        self.current += alpha * (target - self.current);
        self.current
    }

    /// Reset the control value to 0.
    pub fn reset(&mut self) {
        self.current = 0.0;
    }
}

impl Default for Ducker {
    fn default() -> Self {
        Self::new()
    }
}
