//! Engine facade.
//!
//! Ties the parameter store, the chain manager and the control-rate
//! sidechain together behind one API. Everything a host needs is here:
//! attach and detach streams, flip the global enable, change parameters,
//! drive the tick, and push audio blocks through.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chain::StreamChain;
use crate::lifecycle::{ChainManager, StreamState};
use crate::params::{EffectParams, ParamStore, ParamUpdate, ParamValue};
use crate::source::{SourceBinder, StreamId};
use crate::{Error, Result};

/// Snapshot of the engine's externally visible state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    /// Whether shaping is globally enabled.
    pub enabled: bool,
    /// Current parameters.
    pub params: EffectParams,
}

/// The audio shaping engine.
///
/// Single-threaded by design: the host calls [`tick`](Engine::tick) at
/// control rate (~60 Hz) and [`process_block`](Engine::process_block)
/// from the same thread. Parameter reads always see one coherent
/// snapshot because [`EffectParams`] is `Copy`.
pub struct Engine {
    store: ParamStore,
    manager: ChainManager,
    enabled: bool,
}

impl Engine {
    /// Create a disabled engine processing at the given sample rate.
    pub fn new(sample_rate: f32, binder: Box<dyn SourceBinder>) -> Self {
        info!("engine created at {sample_rate} Hz");
        Self {
            store: ParamStore::new(),
            manager: ChainManager::new(sample_rate, binder),
            enabled: false,
        }
    }

    /// Attach a stream. If the engine is enabled, the stream's chain is
    /// built and connected immediately; otherwise it waits for the next
    /// enable. A build failure leaves the stream attached for retry.
    pub fn attach_stream(&mut self, stream: StreamId) -> Result<()> {
        self.manager.attach(stream);
        if self.enabled {
            self.manager.connect_stream(stream, &self.store.get())?;
        }
        Ok(())
    }

    /// Detach a stream and release its source claim.
    pub fn detach_stream(&mut self, stream: StreamId) {
        self.manager.detach(stream);
    }

    /// Enable or disable shaping on every attached stream.
    ///
    /// Always runs through the whole stream set, so re-enabling retries
    /// any build that failed last time. Per-stream failures come back in
    /// the returned list; the streams themselves stay attached.
    pub fn set_enabled(&mut self, enabled: bool) -> Vec<Error> {
        self.enabled = enabled;
        let failures = self.manager.set_enabled(enabled, &self.store.get());
        info!(
            "engine {}: {} of {} streams connected",
            if enabled { "enabled" } else { "disabled" },
            self.manager.connected_count(),
            self.manager.stream_count()
        );
        failures
    }

    /// Set one parameter by wire name and push the result to every
    /// connected chain.
    pub fn set_parameter(&mut self, name: &str, value: ParamValue) -> Result<()> {
        self.store.set(name, value)?;
        if self.enabled {
            self.manager.set_params(&self.store.get());
        }
        Ok(())
    }

    /// Merge a partial parameter update and push the result to every
    /// connected chain.
    pub fn set_all_parameters(&mut self, update: &ParamUpdate) {
        self.store.apply(update);
        if self.enabled {
            self.manager.set_params(&self.store.get());
        }
    }

    /// Current parameter snapshot.
    pub fn params(&self) -> EffectParams {
        self.store.get()
    }

    /// Whether shaping is globally enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Serializable state snapshot for the control boundary.
    pub fn state(&self) -> EngineState {
        EngineState { enabled: self.enabled, params: self.store.get() }
    }

    /// Advance every live sidechain by one control tick.
    pub fn tick(&mut self, dt_seconds: f32) {
        // One snapshot per pass: every stream sees the same values.
        let params = self.store.get();
        self.manager.tick(&params, dt_seconds);
    }

    /// Run one block of a stream's audio through its chain.
    pub fn process_block(
        &mut self,
        stream: StreamId,
        input: &[f32],
        output: &mut [f32],
    ) -> Result<()> {
        self.manager.process_block(stream, input, output)
    }

    /// Lifecycle phase of a stream, or `None` if it is not attached.
    pub fn stream_state(&self, stream: StreamId) -> Option<StreamState> {
        self.manager.state(stream)
    }

    /// Read access to a stream's chain, if one was built.
    pub fn chain(&self, stream: StreamId) -> Option<&StreamChain> {
        self.manager.chain(stream)
    }

    /// Number of attached streams.
    pub fn stream_count(&self) -> usize {
        self.manager.stream_count()
    }

    /// Number of streams currently being shaped.
    pub fn connected_count(&self) -> usize {
        self.manager.connected_count()
    }
}
