//! Per-stream processing chain: fixed topology, explicit wiring.
//!
//! Every enabled stream gets one [`StreamChain`]. The topology never
//! varies except for one splice point (the wet-path compressor):
//!
//! ```text
//! Source ─┬─ Trim ─[Compressor?]──────────┐
//!         ├─ BoostFilter ── BoostGain ────┤
//!         │                            WetGain ──┐
//!         ├─ DetectionFilter ── AnalysisTap      ├─ Mixer ── OutputGain ── Destination
//!         └─ DryGain ────────────────────────────┘
//! ```
//!
//! The wiring is tracked as an explicit edge set so connect/disconnect
//! cycles can be verified not to leak edges or double-patch the mixer.
//! Chains are built once per stream and reused across enable/disable
//! cycles; disabling swaps the whole graph for a single bypass edge.

use retumbo_core::{AnalysisTap, Effect, SmoothedParam};
use std::collections::BTreeSet;

use crate::mapper;
use crate::params::EffectParams;
use crate::source::{BindError, SourceBinder, SourceClaim, StreamId};
use crate::stages::{BoostFilter, DetectionFilter, WetCompressor};

/// Processing nodes of a stream chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StageId {
    /// The claimed stream source.
    Source,
    /// Wet-path input level.
    Trim,
    /// Optional wet-path compressor.
    Compressor,
    /// Fixed lowpass feeding the analysis window.
    DetectionFilter,
    /// Sidechain analysis window.
    AnalysisTap,
    /// Resonant low-end boost filter.
    BoostFilter,
    /// Duck-controlled boost level.
    BoostGain,
    /// Dry-path level.
    DryGain,
    /// Wet-path summing level.
    WetGain,
    /// Dry/wet summing point.
    Mixer,
    /// Final output stage.
    OutputGain,
    /// The stream's playback sink.
    Destination,
}

/// Explicit edge set describing how stages are patched together.
#[derive(Debug, Default, Clone)]
pub struct Wiring {
    edges: BTreeSet<(StageId, StageId)>,
}

impl Wiring {
    /// Add an edge. Returns `false` if it was already present.
    pub fn connect(&mut self, from: StageId, to: StageId) -> bool {
        self.edges.insert((from, to))
    }

    /// Remove an edge. Removing an absent edge is a no-op returning `false`.
    pub fn disconnect(&mut self, from: StageId, to: StageId) -> bool {
        self.edges.remove(&(from, to))
    }

    /// Whether an edge is present.
    pub fn is_connected(&self, from: StageId, to: StageId) -> bool {
        self.edges.contains(&(from, to))
    }

    /// Number of edges arriving at `to`.
    pub fn fan_in(&self, to: StageId) -> usize {
        self.edges.iter().filter(|(_, t)| *t == to).count()
    }

    /// Total edge count.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Iterate over all edges.
    pub fn edges(&self) -> impl Iterator<Item = (StageId, StageId)> + '_ {
        self.edges.iter().copied()
    }
}

/// Snapshot of every smoothed target in a chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainTargets {
    /// Wet-path trim level.
    pub trim: f32,
    /// Boost filter cutoff in Hz.
    pub boost_cutoff_hz: f32,
    /// Boost filter Q.
    pub boost_q: f32,
    /// Sidechain-controlled boost gain.
    pub duck_gain: f32,
    /// Dry-path level.
    pub dry: f32,
    /// Wet-path level.
    pub wet: f32,
    /// Output stage level (linear).
    pub output: f32,
}

/// One stream's processing chain.
///
/// Owns the source claim for its stream; the claim is taken at build time
/// and only given back when the stream detaches, so enable/disable cycles
/// never re-bind the source.
#[derive(Debug)]
pub struct StreamChain {
    claim: SourceClaim,
    wiring: Wiring,
    connected: bool,
    pub(crate) compressor_spliced: bool,
    pub(crate) trim: SmoothedParam,
    pub(crate) compressor: WetCompressor,
    pub(crate) detection: DetectionFilter,
    pub(crate) tap: AnalysisTap,
    pub(crate) boost: BoostFilter,
    pub(crate) boost_gain: SmoothedParam,
    pub(crate) dry_gain: SmoothedParam,
    pub(crate) wet_gain: SmoothedParam,
    pub(crate) output_gain: SmoothedParam,
}

impl StreamChain {
    /// Claim the stream's source and build a chain primed with `params`.
    ///
    /// Initial stage values are set directly rather than ramped; smoothing
    /// only applies to later parameter changes. The boost gain starts at
    /// zero and is opened by the sidechain.
    pub fn build(
        stream: StreamId,
        binder: &mut dyn SourceBinder,
        sample_rate: f32,
        params: &EffectParams,
    ) -> Result<Self, BindError> {
        let claim = binder.bind(stream)?;
        Ok(Self {
            claim,
            wiring: Wiring::default(),
            connected: false,
            compressor_spliced: params.compressor_enabled,
            trim: SmoothedParam::standard(params.trim, sample_rate),
            compressor: WetCompressor::new(sample_rate),
            detection: DetectionFilter::new(sample_rate),
            tap: AnalysisTap::new(),
            boost: BoostFilter::new(
                sample_rate,
                params.boom_frequency,
                mapper::boost_q(params.boom_amount),
            ),
            boost_gain: SmoothedParam::standard(0.0, sample_rate),
            dry_gain: SmoothedParam::standard(mapper::dry_level(params.dry_wet), sample_rate),
            wet_gain: SmoothedParam::standard(mapper::wet_level(params.dry_wet), sample_rate),
            output_gain: SmoothedParam::standard(
                mapper::output_level(params.output_gain_db),
                sample_rate,
            ),
        })
    }

    /// The stream this chain belongs to.
    pub fn stream(&self) -> StreamId {
        self.claim.stream()
    }

    /// Patch the full topology. Re-patching an already-connected chain is
    /// harmless: the edge set deduplicates, so nothing doubles up.
    pub fn connect(&mut self) {
        // Drop the bypass edge (or any previous wiring) first.
        self.sever_all();

        self.wiring.connect(StageId::Source, StageId::Trim);
        if self.compressor_spliced {
            self.wiring.connect(StageId::Trim, StageId::Compressor);
            self.wiring.connect(StageId::Compressor, StageId::WetGain);
        } else {
            self.wiring.connect(StageId::Trim, StageId::WetGain);
        }

        self.wiring.connect(StageId::Source, StageId::BoostFilter);
        self.wiring.connect(StageId::BoostFilter, StageId::BoostGain);
        self.wiring.connect(StageId::BoostGain, StageId::WetGain);

        self.wiring.connect(StageId::Source, StageId::DetectionFilter);
        self.wiring.connect(StageId::DetectionFilter, StageId::AnalysisTap);

        self.wiring.connect(StageId::Source, StageId::DryGain);
        self.wiring.connect(StageId::DryGain, StageId::Mixer);
        self.wiring.connect(StageId::WetGain, StageId::Mixer);
        self.wiring.connect(StageId::Mixer, StageId::OutputGain);
        self.wiring.connect(StageId::OutputGain, StageId::Destination);

        self.connected = true;
    }

    /// Tear the chain down to a single source-to-destination bypass edge.
    /// Audio keeps flowing; the shaping path is simply out of circuit.
    pub fn disconnect(&mut self) {
        self.sever_all();
        self.wiring.connect(StageId::Source, StageId::Destination);
        self.connected = false;
        // A detached tap holds no window; re-enabling starts from silence.
        self.tap.clear();
    }

    fn sever_all(&mut self) {
        // Severing edge by edge tolerates a partially torn-down graph.
        let edges: Vec<(StageId, StageId)> = self.wiring.edges().collect();
        for (from, to) in edges {
            self.wiring.disconnect(from, to);
        }
    }

    /// Whether the shaping path is in circuit.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Read-only view of the current wiring.
    pub fn wiring(&self) -> &Wiring {
        &self.wiring
    }

    /// Whether the wet-path compressor is currently spliced in.
    pub fn compressor_spliced(&self) -> bool {
        self.compressor_spliced
    }

    /// Change the compressor splice. Returns `true` when the flag changed,
    /// in which case a connected chain must be re-patched.
    pub fn set_compressor_spliced(&mut self, spliced: bool) -> bool {
        let changed = self.compressor_spliced != spliced;
        self.compressor_spliced = spliced;
        changed
    }

    /// RMS of the sidechain analysis window.
    pub fn analysis_rms(&self) -> f32 {
        self.tap.rms()
    }

    /// Aim the boost gain at a new duck value. The 10 ms smoother turns
    /// the control-rate step into a click-free ramp.
    pub fn set_duck_gain(&mut self, gain: f32) {
        self.boost_gain.set_target(gain);
    }

    /// Current (smoothed) boost gain.
    pub fn duck_gain(&self) -> f32 {
        self.boost_gain.get()
    }

    /// Snapshot every smoothed target for inspection.
    pub fn targets(&self) -> ChainTargets {
        ChainTargets {
            trim: self.trim.target(),
            boost_cutoff_hz: self.boost.cutoff_target(),
            boost_q: self.boost.q_target(),
            duck_gain: self.boost_gain.target(),
            dry: self.dry_gain.target(),
            wet: self.wet_gain.target(),
            output: self.output_gain.target(),
        }
    }

    /// Run one block through the chain.
    ///
    /// Disconnected chains copy input to output and leave every stage
    /// untouched, including the analysis window: a bypassed stream must
    /// not feed the detector.
    pub fn process_block(&mut self, input: &[f32], output: &mut [f32]) {
        debug_assert_eq!(input.len(), output.len());

        if !self.connected {
            let n = input.len().min(output.len());
            output[..n].copy_from_slice(&input[..n]);
            return;
        }

        for (out, &x) in output.iter_mut().zip(input.iter()) {
            // Sidechain branch: filtered copy into the analysis window.
            let detected = self.detection.process(x);
            self.tap.push(detected);

            // Wet path: trim, optional compressor, plus the ducked boost.
            let trimmed = x * self.trim.advance();
            let shaped =
                if self.compressor_spliced { self.compressor.process(trimmed) } else { trimmed };
            let boosted = self.boost.process(x) * self.boost_gain.advance();
            let wet = (shaped + boosted) * self.wet_gain.advance();

            // Dry path and the output stage.
            let dry = x * self.dry_gain.advance();
            *out = (dry + wet) * self.output_gain.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ExclusiveBinder;

    const SAMPLE_RATE: f32 = 48000.0;

    fn build_chain(params: &EffectParams) -> StreamChain {
        let mut binder = ExclusiveBinder::new();
        StreamChain::build(StreamId(1), &mut binder, SAMPLE_RATE, params).unwrap()
    }

    #[test]
    fn build_claims_the_source() {
        let mut binder = ExclusiveBinder::new();
        let params = EffectParams::default();
        let chain = StreamChain::build(StreamId(3), &mut binder, SAMPLE_RATE, &params).unwrap();
        assert_eq!(chain.stream(), StreamId(3));
        assert_eq!(
            StreamChain::build(StreamId(3), &mut binder, SAMPLE_RATE, &params).unwrap_err(),
            BindError::AlreadyClaimed(StreamId(3))
        );
    }

    #[test]
    fn connect_installs_canonical_topology() {
        let mut chain = build_chain(&EffectParams::default());
        chain.connect();

        assert!(chain.is_connected());
        assert_eq!(chain.wiring().edge_count(), 12);
        assert_eq!(chain.wiring().fan_in(StageId::Mixer), 2);
        assert_eq!(chain.wiring().fan_in(StageId::WetGain), 2);
        assert!(chain.wiring().is_connected(StageId::Trim, StageId::WetGain));
        assert!(chain.wiring().is_connected(StageId::DetectionFilter, StageId::AnalysisTap));
        assert!(!chain.wiring().is_connected(StageId::Source, StageId::Destination));
    }

    #[test]
    fn compressor_splice_reroutes_the_wet_path() {
        let params = EffectParams { compressor_enabled: true, ..Default::default() };
        let mut chain = build_chain(&params);
        chain.connect();

        assert_eq!(chain.wiring().edge_count(), 13);
        assert!(chain.wiring().is_connected(StageId::Trim, StageId::Compressor));
        assert!(chain.wiring().is_connected(StageId::Compressor, StageId::WetGain));
        assert!(!chain.wiring().is_connected(StageId::Trim, StageId::WetGain));
        // Fan-in at the wet sum is unchanged: compressor or trim, plus boost
        assert_eq!(chain.wiring().fan_in(StageId::WetGain), 2);
    }

    #[test]
    fn reconnect_does_not_duplicate_edges() {
        let mut chain = build_chain(&EffectParams::default());
        chain.connect();
        let first = chain.wiring().edge_count();
        chain.connect();
        chain.connect();
        assert_eq!(chain.wiring().edge_count(), first);
        assert_eq!(chain.wiring().fan_in(StageId::Mixer), 2);
    }

    #[test]
    fn disconnect_leaves_only_the_bypass_edge() {
        let mut chain = build_chain(&EffectParams::default());
        chain.connect();
        chain.disconnect();

        assert!(!chain.is_connected());
        assert_eq!(chain.wiring().edge_count(), 1);
        assert!(chain.wiring().is_connected(StageId::Source, StageId::Destination));
        assert_eq!(chain.wiring().fan_in(StageId::Mixer), 0);
    }

    #[test]
    fn disconnect_tolerates_missing_edges() {
        let mut chain = build_chain(&EffectParams::default());
        chain.connect();
        // Simulate a partially torn-down graph before the full disconnect
        chain.wiring.disconnect(StageId::Mixer, StageId::OutputGain);
        chain.wiring.disconnect(StageId::Source, StageId::Trim);
        chain.disconnect();
        assert_eq!(chain.wiring().edge_count(), 1);
    }

    #[test]
    fn bypass_copies_audio_unchanged() {
        let mut chain = build_chain(&EffectParams::default());
        chain.connect();
        chain.disconnect();

        let input: Vec<f32> = (0..256).map(|i| (i as f32 / 256.0) - 0.5).collect();
        let mut output = vec![0.0; 256];
        chain.process_block(&input, &mut output);
        assert_eq!(input, output);
    }

    #[test]
    fn default_chain_is_transparent_for_dc_while_duck_closed() {
        // dry 0.5 + (trim 1.0 * wet 0.5) with the boost closed sums to unity
        let mut chain = build_chain(&EffectParams::default());
        chain.connect();

        let input = vec![0.25_f32; 512];
        let mut output = vec![0.0; 512];
        chain.process_block(&input, &mut output);

        for &y in &output[..] {
            assert!((y - 0.25).abs() < 1e-5, "expected transparent DC, got {y}");
        }
    }

    #[test]
    fn duck_gain_ramps_toward_target() {
        let mut chain = build_chain(&EffectParams::default());
        chain.connect();
        chain.set_duck_gain(10.0);
        assert_eq!(chain.targets().duck_gain, 10.0);
        assert_eq!(chain.duck_gain(), 0.0);

        let input = vec![0.0_f32; 4800];
        let mut output = vec![0.0; 4800];
        chain.process_block(&input, &mut output);
        assert!((chain.duck_gain() - 10.0).abs() < 0.1, "got {}", chain.duck_gain());
    }

    #[test]
    fn analysis_window_fed_only_while_connected() {
        let mut chain = build_chain(&EffectParams::default());
        let loud = vec![0.5_f32; 512];
        let mut output = vec![0.0; 512];

        chain.process_block(&loud, &mut output);
        assert_eq!(chain.analysis_rms(), 0.0, "bypassed stream must not feed the detector");

        chain.connect();
        chain.process_block(&loud, &mut output);
        assert!(chain.analysis_rms() > 0.1);

        chain.disconnect();
        assert_eq!(chain.analysis_rms(), 0.0, "disconnect discards the window");
    }
}
