//! Stream identities and source binding.
//!
//! A chain may only be built on top of a claimed source. The [`SourceBinder`]
//! trait is the seam where a capture backend plugs in; [`ExclusiveBinder`]
//! is the default in-process implementation that enforces one claim per
//! stream. Binding can fail, and that failure is the one error a chain
//! build can hit, so it gets its own error type.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier for one audio stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(pub u64);

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a source could not be claimed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// The source is already claimed by an existing chain.
    #[error("source for stream {0} is already claimed")]
    AlreadyClaimed(StreamId),
    /// The backend cannot provide this source right now.
    #[error("source for stream {0} is unavailable")]
    Unavailable(StreamId),
}

/// Proof that a stream's source was claimed.
///
/// The claim is a move-only token held by the chain built on it. It is not
/// `Clone`: one source, one chain.
#[derive(Debug)]
pub struct SourceClaim {
    stream: StreamId,
}

impl SourceClaim {
    pub(crate) fn new(stream: StreamId) -> Self {
        Self { stream }
    }

    /// The stream this claim is for.
    pub fn stream(&self) -> StreamId {
        self.stream
    }
}

/// Hands out source claims, one per stream.
pub trait SourceBinder {
    /// Claim the source for `stream`.
    fn bind(&mut self, stream: StreamId) -> Result<SourceClaim, BindError>;

    /// Give the claim for `stream` back. Unknown streams are a no-op.
    fn release(&mut self, stream: StreamId);
}

/// Default binder: tracks claims in-process and refuses double binds.
#[derive(Debug, Default)]
pub struct ExclusiveBinder {
    claimed: BTreeSet<StreamId>,
}

impl ExclusiveBinder {
    /// Create a binder with no outstanding claims.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of outstanding claims.
    pub fn claim_count(&self) -> usize {
        self.claimed.len()
    }
}

impl SourceBinder for ExclusiveBinder {
    fn bind(&mut self, stream: StreamId) -> Result<SourceClaim, BindError> {
        if !self.claimed.insert(stream) {
            return Err(BindError::AlreadyClaimed(stream));
        }
        Ok(SourceClaim::new(stream))
    }

    fn release(&mut self, stream: StreamId) {
        self.claimed.remove(&stream);
    }
}
