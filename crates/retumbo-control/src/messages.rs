//! Wire format of the control protocol.
//!
//! Commands are JSON objects tagged with a SCREAMING_SNAKE_CASE `type`
//! field; parameter names inside them are camelCase. Replies are either
//! an acknowledgement or, for [`Command::GetParams`], a state snapshot.

use retumbo_engine::{EngineState, ParamUpdate, ParamValue};
use serde::{Deserialize, Serialize};

/// A command arriving over the control boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    /// Toggle shaping globally.
    SetEnabled {
        /// New enable state.
        #[serde(rename = "value")]
        enabled: bool,
    },
    /// Set one parameter by wire name.
    SetParam {
        /// Parameter wire name, e.g. `boomAmount`.
        name: String,
        /// New value.
        value: ParamValue,
    },
    /// Read back the current state.
    GetParams,
    /// Apply a (possibly partial) parameter object.
    SetAllParams {
        /// The fields to change; absent fields keep their values.
        params: ParamUpdate,
    },
}

/// A reply sent back over the control boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reply {
    /// Snapshot reply to [`Command::GetParams`].
    State(EngineState),
    /// Acknowledgement for every other command.
    Ack {
        /// `false` only when the command could not be parsed at all.
        success: bool,
        /// The parse failure, when `success` is false.
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl Reply {
    /// Successful acknowledgement.
    pub fn ok() -> Self {
        Reply::Ack { success: true, error: None }
    }

    /// Failed acknowledgement with a reason.
    pub fn fail(error: impl Into<String>) -> Self {
        Reply::Ack { success: false, error: Some(error.into()) }
    }
}
