//! Process helpers for the platform wrappers
//!
//! Thin conveniences over `std::process::Command`: run a utility,
//! capture stdout, and translate spawn failures and non-zero exit
//! statuses into [`RpcError::CommandFailed`]. Handlers run on the
//! blocking thread pool, so synchronous process handling is fine here.

use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::RpcError;

pub const SUDO: &str = "/usr/bin/sudo";
pub const SYSTEMCTL: &str = "/usr/bin/systemctl";
pub const LOGINCTL: &str = "/usr/bin/loginctl";

/// Path of the pacman database lock file.
pub const PACMAN_LOCKFILE: &str = "/var/lib/pacman/db.lck";

/// Users whose active session marks the system as under administration.
pub const ADMIN_USERS: &[&str] = &["homeinfo", "root"];

/// Run a utility and return its stdout as a string.
///
/// A missing binary maps to `NotImplemented` (the action simply does not
/// exist on this platform), any other spawn failure or a non-zero exit
/// status maps to `CommandFailed`.
pub fn run(program: &str, args: &[&str]) -> Result<String, RpcError> {
    debug!(program, ?args, "running platform command");

    let output = Command::new(program).args(args).output().map_err(|err| {
        if err.kind() == ErrorKind::NotFound {
            RpcError::NotImplemented
        } else {
            RpcError::CommandFailed(format!("{program}: {err}"))
        }
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RpcError::CommandFailed(format!(
            "{program} exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Run a utility under sudo.
pub fn sudo(program: &str, args: &[&str]) -> Result<String, RpcError> {
    let mut all = vec![program];
    all.extend_from_slice(args);
    run(SUDO, &all)
}

/// Run systemctl with the given arguments.
pub fn systemctl(args: &[&str]) -> Result<String, RpcError> {
    run(SYSTEMCTL, args)
}

/// Whether the given unit is currently active.
pub fn is_active(unit: &str) -> bool {
    systemctl(&["is-active", unit, "--quiet"]).is_ok()
}

/// Whether the given unit is enabled.
pub fn is_enabled(unit: &str) -> bool {
    systemctl(&["is-enabled", unit, "--quiet"]).is_ok()
}

/// Users with an active login session, from `loginctl list-sessions`.
pub fn logged_in_users() -> Result<Vec<String>, RpcError> {
    let text = run(LOGINCTL, &["list-sessions", "-o", "json"])?;
    parse_session_users(&text)
}

/// Extract the user names from loginctl's JSON session list.
fn parse_session_users(text: &str) -> Result<Vec<String>, RpcError> {
    let sessions: Vec<serde_json::Value> = serde_json::from_str(text)
        .map_err(|err| RpcError::CommandFailed(format!("loginctl output: {err}")))?;

    Ok(sessions
        .iter()
        .filter_map(|session| session.get("user"))
        .filter_map(|user| user.as_str())
        .map(str::to_string)
        .collect())
}

/// Whether any administrative user currently has a session.
pub fn under_administration() -> Result<bool, RpcError> {
    let users = logged_in_users()?;
    Ok(users.iter().any(|user| ADMIN_USERS.contains(&user.as_str())))
}

/// Whether the pacman lock file exists.
pub fn pacman_lockfile_exists() -> bool {
    Path::new(PACMAN_LOCKFILE).exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_session_users() {
        let text = r#"[
            {"session": "1", "uid": 1000, "user": "kiosk", "seat": "seat0"},
            {"session": "2", "uid": 0, "user": "root", "seat": ""}
        ]"#;

        let users = parse_session_users(text).unwrap();
        assert_eq!(users, vec!["kiosk", "root"]);
    }

    #[test]
    fn test_parse_session_users_rejects_garbage() {
        assert!(parse_session_users("not json").is_err());
    }

    #[test]
    fn test_missing_binary_is_not_implemented() {
        let err = run("/nonexistent/kiosksync-utility", &[]).unwrap_err();
        assert!(matches!(err, RpcError::NotImplemented));
    }
}
