//! Effect parameters and the parameter store.
//!
//! All user-facing parameters live in a single [`EffectParams`] snapshot.
//! The struct is `Copy`, so readers always see one coherent set of values:
//! the store hands out snapshots, never references into mutable state.
//!
//! Wire names are camelCase to match the control protocol; ranges are
//! clamped on the way in so downstream mapping code can assume valid values.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One complete set of effect parameters.
///
/// | Field | Wire name | Range | Default |
/// |-------|-----------|-------|---------|
/// | `trim` | `trim` | 0.0–1.0 | 1.0 |
/// | `compressor_enabled` | `compressorEnabled` | bool | false |
/// | `boom_amount` | `boomAmount` | 0–100 | 50 |
/// | `boom_frequency` | `boomFrequency` | 30–90 Hz | 60 |
/// | `decay` | `decay` | 0–100 | 50 |
/// | `dry_wet` | `dryWet` | 0–100 | 50 |
/// | `output_gain_db` | `outputGainDb` | dB, unclamped | 0 |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EffectParams {
    /// Pre-shaping level applied to the wet path.
    pub trim: f32,
    /// Whether the wet-path compressor is spliced into the chain.
    pub compressor_enabled: bool,
    /// Boost intensity, percent. Drives both resonance and the duck ceiling.
    pub boom_amount: f32,
    /// Boost filter center frequency in Hz.
    pub boom_frequency: f32,
    /// Recovery speed after a transient, percent. Higher is slower.
    pub decay: f32,
    /// Wet/dry blend, percent. 0 is fully dry, 100 fully wet.
    pub dry_wet: f32,
    /// Final output stage gain in dB.
    pub output_gain_db: f32,
}

impl Default for EffectParams {
    fn default() -> Self {
        Self {
            trim: 1.0,
            compressor_enabled: false,
            boom_amount: 50.0,
            boom_frequency: 60.0,
            decay: 50.0,
            dry_wet: 50.0,
            output_gain_db: 0.0,
        }
    }
}

/// A dynamically-typed parameter value from the control boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// A numeric parameter.
    Number(f32),
    /// A switch parameter.
    Bool(bool),
}

impl From<f32> for ParamValue {
    fn from(value: f32) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// A partial parameter update: only the fields present are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParamUpdate {
    /// New trim level, if present.
    pub trim: Option<f32>,
    /// New compressor switch, if present.
    pub compressor_enabled: Option<bool>,
    /// New boost intensity, if present.
    pub boom_amount: Option<f32>,
    /// New boost center frequency, if present.
    pub boom_frequency: Option<f32>,
    /// New recovery speed, if present.
    pub decay: Option<f32>,
    /// New wet/dry blend, if present.
    pub dry_wet: Option<f32>,
    /// New output gain, if present.
    pub output_gain_db: Option<f32>,
}

fn clamp_unit(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

fn clamp_percent(value: f32) -> f32 {
    value.clamp(0.0, 100.0)
}

fn clamp_boom_frequency(value: f32) -> f32 {
    value.clamp(30.0, 90.0)
}

/// Owns the current parameter snapshot.
///
/// `get` returns a copy; callers never observe a half-applied update.
#[derive(Debug, Clone, Default)]
pub struct ParamStore {
    params: EffectParams,
}

impl ParamStore {
    /// Create a store holding the default parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the current parameters.
    pub fn get(&self) -> EffectParams {
        self.params
    }

    /// Set a single parameter by wire name.
    ///
    /// Numeric values are clamped to the parameter's range. Unknown names
    /// and type mismatches are reported as errors; deciding whether to
    /// surface or swallow them is the caller's business.
    pub fn set(&mut self, name: &str, value: ParamValue) -> Result<()> {
        match (name, value) {
            ("trim", ParamValue::Number(v)) => self.params.trim = clamp_unit(v),
            ("compressorEnabled", ParamValue::Bool(v)) => self.params.compressor_enabled = v,
            ("boomAmount", ParamValue::Number(v)) => self.params.boom_amount = clamp_percent(v),
            ("boomFrequency", ParamValue::Number(v)) => {
                self.params.boom_frequency = clamp_boom_frequency(v);
            }
            ("decay", ParamValue::Number(v)) => self.params.decay = clamp_percent(v),
            ("dryWet", ParamValue::Number(v)) => self.params.dry_wet = clamp_percent(v),
            ("outputGainDb", ParamValue::Number(v)) => self.params.output_gain_db = v,
            ("compressorEnabled", ParamValue::Number(_)) => {
                return Err(Error::WrongType { name: name.to_owned(), expected: "boolean" });
            }
            (
                "trim" | "boomAmount" | "boomFrequency" | "decay" | "dryWet" | "outputGainDb",
                ParamValue::Bool(_),
            ) => {
                return Err(Error::WrongType { name: name.to_owned(), expected: "number" });
            }
            _ => return Err(Error::UnknownParameter(name.to_owned())),
        }
        Ok(())
    }

    /// Merge a partial update into the snapshot. Fields that are absent
    /// keep their current value; present fields are clamped like `set`.
    pub fn apply(&mut self, update: &ParamUpdate) {
        if let Some(v) = update.trim {
            self.params.trim = clamp_unit(v);
        }
        if let Some(v) = update.compressor_enabled {
            self.params.compressor_enabled = v;
        }
        if let Some(v) = update.boom_amount {
            self.params.boom_amount = clamp_percent(v);
        }
        if let Some(v) = update.boom_frequency {
            self.params.boom_frequency = clamp_boom_frequency(v);
        }
        if let Some(v) = update.decay {
            self.params.decay = clamp_percent(v);
        }
        if let Some(v) = update.dry_wet {
            self.params.dry_wet = clamp_percent(v);
        }
        if let Some(v) = update.output_gain_db {
            self.params.output_gain_db = v;
        }
    }
}
