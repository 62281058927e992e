//! Administrative dispatch table
//!
//! Maps command names from the PUT envelope to their handlers. All
//! handlers share one signature: the remaining JSON fields of the
//! envelope go in, the uniform [`Response`] triple comes out. Unknown
//! commands are the caller's problem (400); each handler validates its
//! own argument shape.

use serde_json::{Map, Value};
use tracing::debug;

use kiosksync_core::response::Response;

use crate::{application, beep, pacman, reboot, screenshot, smartctl, RpcError};

/// Uniform handler signature for administrative commands.
pub type Handler = fn(Map<String, Value>) -> Result<Response, RpcError>;

/// The name → handler map.
const COMMANDS: &[(&str, Handler)] = &[
    ("application", application::handle),
    ("beep", beep::handle),
    ("checkupdates", pacman::handle_checkupdates),
    ("reboot", reboot::handle),
    ("screenshot", screenshot::handle),
    ("smartctl", smartctl::handle),
    ("unlock-pacman", pacman::handle_unlock),
];

/// Whether a command of this name exists.
#[must_use]
pub fn is_known_command(name: &str) -> bool {
    COMMANDS.iter().any(|(command, _)| *command == name)
}

/// Look up and invoke the handler for `name`.
///
/// Returns `None` for an unknown command; handler errors are translated
/// to their response form here so the server sees only the triple.
#[must_use]
pub fn dispatch(name: &str, args: Map<String, Value>) -> Option<Response> {
    let (_, handler) = COMMANDS.iter().find(|(command, _)| *command == name)?;

    debug!(command = name, "dispatching administrative command");
    Some(handler(args).unwrap_or_else(RpcError::into_response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_command_is_none() {
        assert!(dispatch("self-destruct", Map::new()).is_none());
        assert!(!is_known_command("self-destruct"));
    }

    #[test]
    fn test_known_commands_present() {
        for name in [
            "application",
            "beep",
            "checkupdates",
            "reboot",
            "screenshot",
            "smartctl",
            "unlock-pacman",
        ] {
            assert!(is_known_command(name), "missing command: {name}");
        }
    }

    #[test]
    fn test_wrong_argument_shape_maps_to_400() {
        let mut args = Map::new();
        args.insert("delay".to_string(), serde_json::json!([1, 2, 3]));

        let response = dispatch("reboot", args).unwrap();
        assert_eq!(response.status(), 400);
    }
}
