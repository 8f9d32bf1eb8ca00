//! Stream shaping engine for retumbo.
//!
//! This crate provides:
//!
//! - **Parameter store**: [`ParamStore`] holds one `Copy` snapshot of every
//!   user parameter, clamped on entry
//! - **Per-stream chains**: [`StreamChain`] with an explicit [`Wiring`] edge
//!   set, built lazily and reused across enable cycles
//! - **Parameter mapping**: [`mapper`] turns parameter snapshots into
//!   smoothed chain targets
//! - **Sidechain**: [`SidechainFollower`] turns window RMS into a duck gain
//!   at control rate
//! - **Facade**: [`Engine`] ties it all together for the host
//!
//! ## Quick Start
//!
//! ```rust
//! use retumbo_engine::{Engine, ExclusiveBinder, ParamValue, StreamId};
//!
//! let mut engine = Engine::new(48000.0, Box::new(ExclusiveBinder::new()));
//! engine.attach_stream(StreamId(1))?;
//!
//! let failures = engine.set_enabled(true);
//! assert!(failures.is_empty());
//!
//! engine.set_parameter("boomAmount", ParamValue::Number(70.0))?;
//!
//! let input = vec![0.0_f32; 256];
//! let mut output = vec![0.0_f32; 256];
//! engine.process_block(StreamId(1), &input, &mut output)?;
//! engine.tick(1.0 / 60.0);
//! # Ok::<(), retumbo_engine::Error>(())
//! ```

mod chain;
mod engine;
mod follower;
mod lifecycle;
pub mod mapper;
mod params;
mod source;
mod stages;

pub use chain::{ChainTargets, StageId, StreamChain, Wiring};
pub use engine::{Engine, EngineState};
pub use follower::SidechainFollower;
pub use lifecycle::{ChainManager, StreamState};
pub use params::{EffectParams, ParamStore, ParamUpdate, ParamValue};
pub use source::{BindError, ExclusiveBinder, SourceBinder, SourceClaim, StreamId};
pub use stages::{BoostFilter, DETECTION_CUTOFF_HZ, DETECTION_Q, DetectionFilter, WetCompressor};

/// Error types for engine operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A stream's chain could not be built. The stream stays attached so a
    /// later enable can retry.
    #[error("chain construction failed for stream {stream}: {source}")]
    ChainConstruction {
        /// The stream whose chain failed.
        stream: StreamId,
        /// What went wrong binding the source.
        source: BindError,
    },

    /// No parameter with that wire name exists.
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    /// The value's type does not fit the parameter.
    #[error("parameter {name} expects a {expected}")]
    WrongType {
        /// The parameter's wire name.
        name: String,
        /// The type it takes.
        expected: &'static str,
    },

    /// The stream is not attached.
    #[error("unknown stream: {0}")]
    UnknownStream(StreamId),
}

/// Convenience result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
