//! Package manager commands (pacman)
//!
//! `checkupdates` lists pending package updates; `unlock-pacman` removes
//! a stale database lock, refusing while pacman itself is running.

use serde::Deserialize;
use serde_json::json;

use kiosksync_core::response::Response;

use crate::proc::{pacman_lockfile_exists, run, sudo, PACMAN_LOCKFILE};
use crate::RpcError;

const CHECKUPDATES: &str = "/usr/bin/checkupdates";
const PIDOF: &str = "/usr/bin/pidof";

/// Empty argument envelope shared by both commands.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
struct NoArgs {}

/// Whether a pacman process is currently running.
pub fn is_running() -> bool {
    run(PIDOF, &["pacman"]).is_ok()
}

/// List pending updates, one `[package, old, "->", new]` line each.
///
/// checkupdates exits non-zero when there are no updates; that case is
/// an empty list, not an error.
pub fn checkupdates() -> Result<Vec<String>, RpcError> {
    match run(CHECKUPDATES, &[]) {
        Ok(text) => Ok(text.lines().map(str::to_string).collect()),
        Err(RpcError::CommandFailed(_)) => Ok(Vec::new()),
        Err(err) => Err(err),
    }
}

/// Handle the `checkupdates` command.
pub fn handle_checkupdates(
    args: serde_json::Map<String, serde_json::Value>,
) -> Result<Response, RpcError> {
    let NoArgs {} = serde_json::from_value(serde_json::Value::Object(args))
        .map_err(|err| RpcError::InvalidArguments(err.to_string()))?;

    Ok(Response::json(json!(checkupdates()?)))
}

/// Handle the `unlock-pacman` command.
pub fn handle_unlock(
    args: serde_json::Map<String, serde_json::Value>,
) -> Result<Response, RpcError> {
    let NoArgs {} = serde_json::from_value(serde_json::Value::Object(args))
        .map_err(|err| RpcError::InvalidArguments(err.to_string()))?;

    if is_running() {
        return Err(RpcError::PackageManagerActive);
    }

    sudo("/usr/bin/rm", &["-f", PACMAN_LOCKFILE])?;
    Ok(Response::message("Lockfile removed."))
}

/// Whether the package manager currently blocks disruptive actions.
pub fn blocks_actions() -> bool {
    pacman_lockfile_exists() || is_running()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlock_rejects_arguments() {
        let mut args = serde_json::Map::new();
        args.insert("force".to_string(), serde_json::json!(true));

        let err = handle_unlock(args).unwrap_err();
        assert!(matches!(err, RpcError::InvalidArguments(_)));
    }

    #[test]
    fn test_checkupdates_rejects_arguments() {
        let mut args = serde_json::Map::new();
        args.insert("x".to_string(), serde_json::json!(null));

        let err = handle_checkupdates(args).unwrap_err();
        assert!(matches!(err, RpcError::InvalidArguments(_)));
    }
}
