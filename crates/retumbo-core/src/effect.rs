//! Core Effect trait.
//!
//! Every processing stage in a retumbo chain implements [`Effect`], giving
//! a consistent interface for single-sample and block-based processing.
//!
//! ## Design Decisions
//!
//! - **Mono processing**: Single `f32` input/output. Stereo streams are
//!   handled as two mono chains by the embedding layer.
//!
//! - **Object-safe**: The trait supports `dyn Effect` for runtime
//!   composition, though the fixed chain topology mostly uses static
//!   dispatch through concrete stage types.
//!
//! - **No allocations**: All methods are designed to be called in real-time
//!   audio contexts with zero heap allocations.

/// Core trait for mono audio processors.
///
/// # Example
///
/// ```rust
/// use retumbo_core::Effect;
///
/// struct Gain {
///     gain: f32,
/// }
///
/// impl Effect for Gain {
///     fn process(&mut self, input: f32) -> f32 {
///         input * self.gain
///     }
///
///     fn set_sample_rate(&mut self, _sample_rate: f32) {
///         // Gain doesn't depend on sample rate
///     }
///
///     fn reset(&mut self) {
///         // Gain has no internal state to reset
///     }
/// }
/// ```
pub trait Effect {
    /// Process a single sample.
    ///
    /// For effects with internal state (filters, envelopes), this advances
    /// the state by one sample.
    fn process(&mut self, input: f32) -> f32;

    /// Process a block of samples.
    ///
    /// Default implementation calls `process()` for each sample. Effects
    /// may override this for more efficient block processing.
    ///
    /// # Panics
    /// Default implementation debug-panics if `input.len() != output.len()`.
    fn process_block(&mut self, input: &[f32], output: &mut [f32]) {
        debug_assert_eq!(
            input.len(),
            output.len(),
            "Input and output buffers must have same length"
        );
        for (inp, out) in input.iter().zip(output.iter_mut()) {
            *out = self.process(*inp);
        }
    }

    /// Process a block of samples in-place.
    fn process_block_inplace(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Update the sample rate.
    ///
    /// Effects recalculate any sample-rate-dependent coefficients here
    /// (filter coefficients, smoothing constants, envelope times).
    fn set_sample_rate(&mut self, sample_rate: f32);

    /// Reset internal state.
    ///
    /// Clears delay lines and filter history without changing parameters.
    /// Called when a stream stops or a chain is reconnected, to prevent
    /// stale state from producing artifacts.
    fn reset(&mut self);
}
