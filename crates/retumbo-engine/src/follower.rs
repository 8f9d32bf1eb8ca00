//! Control-rate sidechain follower.
//!
//! One follower per stream turns the analysis window's RMS into a duck
//! gain, once per engine tick. The audio-rate half of the sidechain (the
//! detection filter and the window itself) lives in the chain; this is
//! purely the decision-making half.
//!
//! Cancellation is synchronous: `stop` flips a liveness flag and `tick`
//! refuses to act while it is down, so a follower that was stopped this
//! tick can never write a stale gain onto the chain.

use retumbo_core::{Ducker, boost_ceiling, release_tau_seconds};

use crate::params::EffectParams;

/// Per-stream sidechain state.
#[derive(Debug, Default)]
pub struct SidechainFollower {
    running: bool,
    ducker: Ducker,
}

impl SidechainFollower {
    /// Create a stopped follower with the boost fully closed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start ticking. The duck gain continues from wherever it last was;
    /// chains persist across enable cycles and so does their sidechain.
    pub fn start(&mut self) {
        self.running = true;
    }

    /// Stop ticking immediately.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Whether the follower is live.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advance one control tick.
    ///
    /// Returns the new duck gain, or `None` when the follower is stopped
    /// (a stopped follower must not touch its chain).
    pub fn tick(&mut self, window_rms: f32, params: &EffectParams, dt_seconds: f32) -> Option<f32> {
        if !self.running {
            return None;
        }

        let ceiling = boost_ceiling(params.boom_amount);
        let release_tau = release_tau_seconds(params.decay);
        Some(self.ducker.step(window_rms, ceiling, release_tau, dt_seconds))
    }

    /// Current duck gain, whether running or not.
    pub fn duck_gain(&self) -> f32 {
        self.ducker.current()
    }
}
