//! Stream registration and chain lifecycle.
//!
//! Streams attach eagerly but chains are built lazily: nothing is claimed
//! until the first enable. Once built, a chain (and its source claim) is
//! reused for the stream's whole life; disable bypasses it, re-enable
//! re-patches it. A failed build leaves the stream registered so a later
//! enable can retry, and never affects the other streams.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::chain::StreamChain;
use crate::follower::SidechainFollower;
use crate::mapper;
use crate::params::EffectParams;
use crate::source::{SourceBinder, StreamId};
use crate::{Error, Result};

/// Lifecycle phase of an attached stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Attached with no chain yet. Audio passes through untouched.
    Registered,
    /// Chain built and patched in.
    Connected,
    /// Chain built but out of circuit.
    Bypassed,
}

#[derive(Debug)]
struct StreamSlot {
    chain: Option<StreamChain>,
    follower: SidechainFollower,
}

/// Owns every stream slot and drives chain lifecycles.
pub struct ChainManager {
    streams: BTreeMap<StreamId, StreamSlot>,
    binder: Box<dyn SourceBinder>,
    sample_rate: f32,
}

impl ChainManager {
    /// Create a manager that builds chains at the given sample rate.
    pub fn new(sample_rate: f32, binder: Box<dyn SourceBinder>) -> Self {
        Self { streams: BTreeMap::new(), binder, sample_rate }
    }

    /// Attach a stream. Attaching an already-known stream is a no-op.
    pub fn attach(&mut self, stream: StreamId) {
        if self.streams.contains_key(&stream) {
            debug!("stream {stream} already attached");
            return;
        }
        self.streams
            .insert(stream, StreamSlot { chain: None, follower: SidechainFollower::new() });
        debug!("stream {stream} attached");
    }

    /// Detach a stream, releasing its source claim if a chain was built.
    /// Detaching an unknown stream is a no-op.
    pub fn detach(&mut self, stream: StreamId) {
        match self.streams.remove(&stream) {
            Some(slot) => {
                if slot.chain.is_some() {
                    self.binder.release(stream);
                }
                debug!("stream {stream} detached");
            }
            None => debug!("detach ignored for unknown stream {stream}"),
        }
    }

    /// Build (if needed), prime and patch in one stream's chain, then
    /// start its sidechain.
    pub fn connect_stream(&mut self, stream: StreamId, params: &EffectParams) -> Result<()> {
        let slot = self.streams.get_mut(&stream).ok_or(Error::UnknownStream(stream))?;

        if slot.chain.is_none() {
            let chain = StreamChain::build(stream, self.binder.as_mut(), self.sample_rate, params)
                .map_err(|source| Error::ChainConstruction { stream, source })?;
            debug!("built chain for stream {stream}");
            slot.chain = Some(chain);
        }

        if let Some(chain) = slot.chain.as_mut() {
            mapper::apply(chain, params);
            chain.connect();
            slot.follower.start();
        }
        Ok(())
    }

    /// Enable or disable every attached stream.
    ///
    /// Failures are contained per stream: a stream whose chain cannot be
    /// built is reported and stays registered for retry, while the rest
    /// proceed normally.
    pub fn set_enabled(&mut self, enabled: bool, params: &EffectParams) -> Vec<Error> {
        let mut failures = Vec::new();

        if enabled {
            let streams: Vec<StreamId> = self.streams.keys().copied().collect();
            for stream in streams {
                if let Err(err) = self.connect_stream(stream, params) {
                    warn!("enable failed for stream {stream}: {err}; it stays registered");
                    failures.push(err);
                }
            }
        } else {
            for (stream, slot) in &mut self.streams {
                // Stop the sidechain before touching the wiring.
                slot.follower.stop();
                if let Some(chain) = slot.chain.as_mut() {
                    chain.disconnect();
                    debug!("stream {stream} bypassed");
                }
            }
        }

        failures
    }

    /// Push a parameter snapshot onto every connected chain, re-patching
    /// any whose compressor splice changed.
    pub fn set_params(&mut self, params: &EffectParams) {
        for slot in self.streams.values_mut() {
            let Some(chain) = slot.chain.as_mut() else { continue };
            if !chain.is_connected() {
                continue;
            }
            if mapper::apply(chain, params) {
                chain.connect();
            }
        }
    }

    /// Advance every live sidechain by one control tick.
    pub fn tick(&mut self, params: &EffectParams, dt_seconds: f32) {
        for slot in self.streams.values_mut() {
            let Some(chain) = slot.chain.as_mut() else { continue };
            let Some(gain) = slot.follower.tick(chain.analysis_rms(), params, dt_seconds) else {
                continue;
            };
            chain.set_duck_gain(gain);
        }
    }

    /// Run one block of an attached stream through its chain. Streams
    /// without a chain pass audio through untouched.
    pub fn process_block(
        &mut self,
        stream: StreamId,
        input: &[f32],
        output: &mut [f32],
    ) -> Result<()> {
        let slot = self.streams.get_mut(&stream).ok_or(Error::UnknownStream(stream))?;
        match slot.chain.as_mut() {
            Some(chain) => chain.process_block(input, output),
            None => {
                let n = input.len().min(output.len());
                output[..n].copy_from_slice(&input[..n]);
            }
        }
        Ok(())
    }

    /// Lifecycle phase of a stream, or `None` if it is not attached.
    pub fn state(&self, stream: StreamId) -> Option<StreamState> {
        let slot = self.streams.get(&stream)?;
        Some(match &slot.chain {
            None => StreamState::Registered,
            Some(chain) if chain.is_connected() => StreamState::Connected,
            Some(_) => StreamState::Bypassed,
        })
    }

    /// Read access to a stream's chain, if one was built.
    pub fn chain(&self, stream: StreamId) -> Option<&StreamChain> {
        self.streams.get(&stream)?.chain.as_ref()
    }

    /// Number of attached streams.
    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    /// Number of streams whose chain is currently patched in.
    pub fn connected_count(&self) -> usize {
        self.streams
            .values()
            .filter(|slot| slot.chain.as_ref().is_some_and(StreamChain::is_connected))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::StageId;
    use crate::source::{BindError, ExclusiveBinder, SourceClaim};
    use std::cell::RefCell;
    use std::collections::BTreeSet;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct ProbeState {
        binds: Vec<StreamId>,
        releases: Vec<StreamId>,
        failing: BTreeSet<StreamId>,
    }

    /// Shared handle onto the binder's history, kept by the test while the
    /// binder itself moves into the manager.
    #[derive(Debug, Clone, Default)]
    struct Probe(Rc<RefCell<ProbeState>>);

    impl Probe {
        fn bind_count(&self, stream: StreamId) -> usize {
            self.0.borrow().binds.iter().filter(|&&s| s == stream).count()
        }

        fn release_count(&self, stream: StreamId) -> usize {
            self.0.borrow().releases.iter().filter(|&&s| s == stream).count()
        }

        fn fail(&self, stream: StreamId) {
            self.0.borrow_mut().failing.insert(stream);
        }

        fn heal(&self, stream: StreamId) {
            self.0.borrow_mut().failing.remove(&stream);
        }
    }

    #[derive(Debug)]
    struct TrackingBinder {
        probe: Probe,
        inner: ExclusiveBinder,
    }

    impl SourceBinder for TrackingBinder {
        fn bind(&mut self, stream: StreamId) -> std::result::Result<SourceClaim, BindError> {
            if self.probe.0.borrow().failing.contains(&stream) {
                return Err(BindError::Unavailable(stream));
            }
            let claim = self.inner.bind(stream)?;
            self.probe.0.borrow_mut().binds.push(stream);
            Ok(claim)
        }

        fn release(&mut self, stream: StreamId) {
            self.inner.release(stream);
            self.probe.0.borrow_mut().releases.push(stream);
        }
    }

    fn manager_with_probe() -> (ChainManager, Probe) {
        let probe = Probe::default();
        let binder = TrackingBinder { probe: probe.clone(), inner: ExclusiveBinder::new() };
        (ChainManager::new(48000.0, Box::new(binder)), probe)
    }

    #[test]
    fn attach_is_idempotent_and_lazy() {
        let (mut manager, probe) = manager_with_probe();
        manager.attach(StreamId(1));
        manager.attach(StreamId(1));

        assert_eq!(manager.stream_count(), 1);
        assert_eq!(manager.state(StreamId(1)), Some(StreamState::Registered));
        assert_eq!(probe.bind_count(StreamId(1)), 0, "no claim before first enable");
    }

    #[test]
    fn enable_builds_and_connects() {
        let (mut manager, probe) = manager_with_probe();
        manager.attach(StreamId(1));

        let failures = manager.set_enabled(true, &EffectParams::default());
        assert!(failures.is_empty());
        assert_eq!(manager.state(StreamId(1)), Some(StreamState::Connected));
        assert_eq!(manager.connected_count(), 1);
        assert_eq!(probe.bind_count(StreamId(1)), 1);
    }

    #[test]
    fn chain_and_claim_survive_enable_cycles() {
        let (mut manager, probe) = manager_with_probe();
        manager.attach(StreamId(1));
        let params = EffectParams::default();

        for _ in 0..5 {
            manager.set_enabled(true, &params);
            assert_eq!(manager.state(StreamId(1)), Some(StreamState::Connected));
            manager.set_enabled(false, &params);
            assert_eq!(manager.state(StreamId(1)), Some(StreamState::Bypassed));
        }

        assert_eq!(probe.bind_count(StreamId(1)), 1, "chain must be reused, not rebuilt");
        assert_eq!(probe.release_count(StreamId(1)), 0);
    }

    #[test]
    fn mixer_fan_in_constant_over_cycles() {
        let (mut manager, _probe) = manager_with_probe();
        manager.attach(StreamId(1));
        let params = EffectParams::default();

        for _ in 0..10 {
            manager.set_enabled(true, &params);
            let chain = manager.chain(StreamId(1)).unwrap();
            assert_eq!(chain.wiring().fan_in(StageId::Mixer), 2);
            manager.set_enabled(false, &params);
        }
    }

    #[test]
    fn detach_releases_the_claim() {
        let (mut manager, probe) = manager_with_probe();
        manager.attach(StreamId(1));
        manager.set_enabled(true, &EffectParams::default());

        manager.detach(StreamId(1));
        assert_eq!(manager.state(StreamId(1)), None);
        assert_eq!(probe.release_count(StreamId(1)), 1);

        // A fresh attach starts over with a fresh claim
        manager.attach(StreamId(1));
        manager.set_enabled(true, &EffectParams::default());
        assert_eq!(probe.bind_count(StreamId(1)), 2);
    }

    #[test]
    fn detach_without_chain_releases_nothing() {
        let (mut manager, probe) = manager_with_probe();
        manager.attach(StreamId(1));
        manager.detach(StreamId(1));
        assert_eq!(probe.release_count(StreamId(1)), 0);
    }

    #[test]
    fn build_failure_is_contained_and_retryable() {
        let (mut manager, probe) = manager_with_probe();
        manager.attach(StreamId(1));
        manager.attach(StreamId(2));
        probe.fail(StreamId(2));

        let failures = manager.set_enabled(true, &EffectParams::default());
        assert_eq!(failures.len(), 1);
        assert!(matches!(
            &failures[0],
            Error::ChainConstruction { stream: StreamId(2), source: BindError::Unavailable(_) }
        ));
        assert_eq!(manager.state(StreamId(1)), Some(StreamState::Connected));
        assert_eq!(manager.state(StreamId(2)), Some(StreamState::Registered));

        probe.heal(StreamId(2));
        let failures = manager.set_enabled(true, &EffectParams::default());
        assert!(failures.is_empty());
        assert_eq!(manager.state(StreamId(2)), Some(StreamState::Connected));
    }

    #[test]
    fn tick_moves_the_duck_gain_only_while_enabled() {
        let (mut manager, _probe) = manager_with_probe();
        manager.attach(StreamId(1));
        let params = EffectParams::default();
        manager.set_enabled(true, &params);

        // Silent window reads as steady, so the boost swells
        manager.tick(&params, 1.0 / 60.0);
        let after_tick = manager.chain(StreamId(1)).unwrap().targets().duck_gain;
        assert!(after_tick > 0.0);

        manager.set_enabled(false, &params);
        manager.tick(&params, 1.0 / 60.0);
        let after_disable = manager.chain(StreamId(1)).unwrap().targets().duck_gain;
        assert_eq!(after_disable, after_tick, "stopped sidechain must not write gains");
    }

    #[test]
    fn splice_flip_repatches_without_rebuilding() {
        let (mut manager, probe) = manager_with_probe();
        manager.attach(StreamId(1));
        let mut params = EffectParams::default();
        manager.set_enabled(true, &params);

        params.compressor_enabled = true;
        manager.set_params(&params);

        let chain = manager.chain(StreamId(1)).unwrap();
        assert!(chain.wiring().is_connected(StageId::Trim, StageId::Compressor));
        assert!(!chain.wiring().is_connected(StageId::Trim, StageId::WetGain));
        assert_eq!(probe.bind_count(StreamId(1)), 1);
    }

    #[test]
    fn registered_stream_passes_audio_through() {
        let (mut manager, _probe) = manager_with_probe();
        manager.attach(StreamId(1));

        let input: Vec<f32> = (0..64).map(|i| i as f32 / 64.0).collect();
        let mut output = vec![0.0; 64];
        manager.process_block(StreamId(1), &input, &mut output).unwrap();
        assert_eq!(input, output);
    }

    #[test]
    fn unknown_stream_is_an_error() {
        let (mut manager, _probe) = manager_with_probe();
        let mut output = vec![0.0; 16];
        let err = manager.process_block(StreamId(9), &[0.0; 16], &mut output).unwrap_err();
        assert!(matches!(err, Error::UnknownStream(StreamId(9))));
    }
}
