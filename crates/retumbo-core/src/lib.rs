//! Retumbo Core - DSP primitives for low-end shaping
//!
//! This crate provides the building blocks for the retumbo bass enhancer:
//! filters, gain smoothing, amplitude detection, and the transient-ducking
//! control law. Everything here is allocation-free and suitable for
//! real-time audio paths.
//!
//! # Core Abstractions
//!
//! ## Effect System
//!
//! - [`Effect`] - Object-safe trait for mono audio processors
//!
//! ## Parameter Smoothing
//!
//! Zipper-free parameter changes for click-free automation:
//!
//! - [`SmoothedParam`] - Exponential smoothing (RC-like response)
//!
//! ## Filters
//!
//! - [`Biquad`] - Second-order IIR filter with RBJ cookbook coefficients
//!
//! ## Detection & Ducking
//!
//! - [`EnvelopeFollower`] - Per-sample amplitude envelope with attack/release
//! - [`AnalysisTap`] - Fixed-size window over a detection signal, with RMS
//! - [`Ducker`] - Transient-classified gain control with dual time constants
//!
//! ## Utilities
//!
//! - Level conversions: [`db_to_linear`], [`linear_to_db`], and the
//!   [`fast_math`] approximations for per-sample dynamics code
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible. Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! retumbo-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: no allocations in audio processing paths
//! - **No dependencies on std**: pure `no_std` with `libm` for math
//! - **Object-safe traits**: dynamic dispatch when needed

#![cfg_attr(not(feature = "std"), no_std)]

pub mod biquad;
pub mod ducker;
pub mod effect;
pub mod envelope;
pub mod fast_math;
pub mod math;
pub mod param;
pub mod tap;

pub use biquad::{Biquad, lowpass_coefficients};
pub use ducker::{
    ATTACK_TAU_SECONDS, Ducker, RMS_TRANSIENT_THRESHOLD, boost_ceiling, release_tau_seconds,
    smoothing_alpha,
};
pub use effect::Effect;
pub use envelope::EnvelopeFollower;
pub use fast_math::{fast_db_to_linear, fast_exp2, fast_linear_to_db, fast_log2};
pub use math::{db_to_linear, linear_to_db};
pub use param::SmoothedParam;
pub use tap::{ANALYSIS_WINDOW_LEN, AnalysisTap};
