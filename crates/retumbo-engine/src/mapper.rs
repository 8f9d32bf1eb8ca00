//! Maps user parameters onto chain targets.
//!
//! The mapping is one-way and idempotent: every call pushes the complete
//! parameter snapshot onto the chain's smoothed targets, so applying the
//! same snapshot twice changes nothing. The duck gain is the one target
//! this module never touches; it is owned by the sidechain.

use retumbo_core::db_to_linear;

use crate::chain::StreamChain;
use crate::params::EffectParams;

/// Boost filter Q for a boost intensity in percent.
///
/// Spans 2 (broad) at 0 percent to 12 (whistling-narrow) at 100 percent.
pub fn boost_q(boom_amount: f32) -> f32 {
    2.0 + (boom_amount / 100.0) * 10.0
}

/// Dry-path level for a wet/dry blend in percent.
pub fn dry_level(dry_wet: f32) -> f32 {
    1.0 - dry_wet / 100.0
}

/// Wet-path level for a wet/dry blend in percent.
pub fn wet_level(dry_wet: f32) -> f32 {
    dry_wet / 100.0
}

/// Output stage level (linear) for a gain in dB.
pub fn output_level(output_gain_db: f32) -> f32 {
    db_to_linear(output_gain_db)
}

/// Push a parameter snapshot onto a chain's targets.
///
/// Returns `true` when the compressor splice changed, in which case a
/// connected chain must be re-patched by the caller.
pub fn apply(chain: &mut StreamChain, params: &EffectParams) -> bool {
    chain.trim.set_target(params.trim);
    chain.boost.set_cutoff_hz(params.boom_frequency);
    chain.boost.set_q(boost_q(params.boom_amount));
    chain.dry_gain.set_target(dry_level(params.dry_wet));
    chain.wet_gain.set_target(wet_level(params.dry_wet));
    chain.output_gain.set_target(output_level(params.output_gain_db));

    chain.set_compressor_spliced(params.compressor_enabled)
}
