//! JSON control boundary for the retumbo engine.
//!
//! The control side of the host (a UI, a remote panel, a test harness)
//! talks to the engine in JSON commands and replies. Two rules shape this
//! crate:
//!
//! - **The boundary never errors.** Unknown parameters and per-stream
//!   failures are logged and acknowledged; only input that cannot be
//!   parsed at all earns a `success: false` reply. A misbehaving
//!   controller cannot wedge the engine.
//! - **Commands are the only way state changes.** Replaying a command log
//!   against a fresh engine reconstructs the same state, which is what
//!   makes the protocol debuggable after the fact.

mod messages;

pub use messages::{Command, Reply};

use retumbo_engine::Engine;
use tracing::warn;

/// Owns an engine and answers control commands for it.
pub struct ControlPort {
    engine: Engine,
}

impl ControlPort {
    /// Wrap an engine.
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    /// Read access to the engine.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Mutable access to the engine for the host's audio and tick side.
    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Execute one command. Never fails; engine-level errors are demoted
    /// to log warnings.
    pub fn dispatch(&mut self, command: Command) -> Reply {
        match command {
            Command::SetEnabled { enabled } => {
                for failure in self.engine.set_enabled(enabled) {
                    warn!("enable: {failure}");
                }
                Reply::ok()
            }
            Command::SetParam { name, value } => {
                if let Err(err) = self.engine.set_parameter(&name, value) {
                    // Lenient by contract: bad names are dropped, not errors.
                    warn!("set_param ignored: {err}");
                }
                Reply::ok()
            }
            Command::GetParams => Reply::State(self.engine.state()),
            Command::SetAllParams { params } => {
                self.engine.set_all_parameters(&params);
                Reply::ok()
            }
        }
    }

    /// Parse and execute one JSON command, returning the JSON reply.
    pub fn handle_json(&mut self, raw: &str) -> String {
        let reply = match serde_json::from_str::<Command>(raw) {
            Ok(command) => self.dispatch(command),
            Err(err) => {
                warn!("malformed command: {err}");
                Reply::fail(err.to_string())
            }
        };
        serde_json::to_string(&reply)
            .unwrap_or_else(|_| r#"{"success":false,"error":"reply serialization failed"}"#.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retumbo_engine::{Engine, ExclusiveBinder, StreamId, StreamState};
    use serde_json::{Value, json};

    fn test_port() -> ControlPort {
        ControlPort::new(Engine::new(48000.0, Box::new(ExclusiveBinder::new())))
    }

    fn parse(raw: &str) -> Value {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn set_enabled_flows_through_to_streams() {
        let mut port = test_port();
        port.engine_mut().attach_stream(StreamId(1)).unwrap();

        let reply = port.handle_json(r#"{"type": "SET_ENABLED", "value": true}"#);
        assert_eq!(parse(&reply), json!({"success": true}));
        assert_eq!(port.engine().stream_state(StreamId(1)), Some(StreamState::Connected));

        port.handle_json(r#"{"type": "SET_ENABLED", "value": false}"#);
        assert_eq!(port.engine().stream_state(StreamId(1)), Some(StreamState::Bypassed));
    }

    #[test]
    fn set_param_updates_the_store() {
        let mut port = test_port();
        let reply = port.handle_json(r#"{"type": "SET_PARAM", "name": "decay", "value": 85}"#);
        assert_eq!(parse(&reply), json!({"success": true}));
        assert_eq!(port.engine().params().decay, 85.0);
    }

    #[test]
    fn unknown_param_is_acknowledged_and_dropped() {
        let mut port = test_port();
        let before = port.engine().params();

        let reply = port.handle_json(r#"{"type": "SET_PARAM", "name": "reverb", "value": 1}"#);
        assert_eq!(parse(&reply), json!({"success": true}), "boundary must stay lenient");
        assert_eq!(port.engine().params(), before);
    }

    #[test]
    fn get_params_returns_the_state_snapshot() {
        let mut port = test_port();
        port.handle_json(r#"{"type": "SET_PARAM", "name": "boomAmount", "value": 70}"#);
        port.handle_json(r#"{"type": "SET_ENABLED", "value": true}"#);

        let reply = parse(&port.handle_json(r#"{"type": "GET_PARAMS"}"#));
        assert_eq!(reply["enabled"], json!(true));
        assert_eq!(reply["params"]["boomAmount"], json!(70.0));
        assert_eq!(reply["params"]["trim"], json!(1.0));
    }

    #[test]
    fn set_all_params_merges_partials() {
        let mut port = test_port();
        let reply = port.handle_json(
            r#"{"type": "SET_ALL_PARAMS", "params": {"dryWet": 100, "outputGainDb": -6}}"#,
        );
        assert_eq!(parse(&reply), json!({"success": true}));

        let params = port.engine().params();
        assert_eq!(params.dry_wet, 100.0);
        assert_eq!(params.output_gain_db, -6.0);
        assert_eq!(params.boom_amount, 50.0, "absent fields keep their values");
    }

    #[test]
    fn malformed_json_fails_softly() {
        let mut port = test_port();
        let reply = parse(&port.handle_json("this is not json"));
        assert_eq!(reply["success"], json!(false));
        assert!(reply["error"].is_string());

        // The engine is untouched and the port keeps working
        let reply = port.handle_json(r#"{"type": "GET_PARAMS"}"#);
        assert_eq!(parse(&reply)["enabled"], json!(false));
    }

    #[test]
    fn unknown_command_type_fails_softly() {
        let mut port = test_port();
        let reply = parse(&port.handle_json(r#"{"type": "SELF_DESTRUCT"}"#));
        assert_eq!(reply["success"], json!(false));
    }

    #[test]
    fn replaying_a_command_log_reconstructs_state() {
        let log = [
            r#"{"type": "SET_PARAM", "name": "boomAmount", "value": 80}"#,
            r#"{"type": "SET_PARAM", "name": "compressorEnabled", "value": true}"#,
            r#"{"type": "SET_ALL_PARAMS", "params": {"decay": 15}}"#,
            r#"{"type": "SET_ENABLED", "value": true}"#,
            r#"{"type": "SET_PARAM", "name": "dryWet", "value": 95}"#,
        ];

        let mut live = test_port();
        for raw in &log {
            live.handle_json(raw);
        }

        let mut replayed = test_port();
        for raw in &log {
            replayed.handle_json(raw);
        }

        assert_eq!(live.engine().state(), replayed.engine().state());
        assert_eq!(
            parse(&live.handle_json(r#"{"type": "GET_PARAMS"}"#)),
            parse(&replayed.handle_json(r#"{"type": "GET_PARAMS"}"#))
        );
    }
}
