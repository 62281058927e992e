//! System reboot
//!
//! Refuses while an administrator is logged in or the package manager is
//! active; both would make an unattended reboot destructive.

use serde::Deserialize;
use tracing::warn;

use kiosksync_core::response::Response;

use crate::proc::{sudo, under_administration, SYSTEMCTL};
use crate::{pacman, RpcError};

/// Argument envelope for the `reboot` command.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
struct RebootArgs {
    /// Accepted for wire compatibility; systemctl has no delayed reboot.
    delay: Option<u64>,
}

/// Handle the `reboot` command.
pub fn handle(args: serde_json::Map<String, serde_json::Value>) -> Result<Response, RpcError> {
    let args: RebootArgs = serde_json::from_value(serde_json::Value::Object(args))
        .map_err(|err| RpcError::InvalidArguments(err.to_string()))?;

    if let Some(delay) = args.delay {
        if delay > 0 {
            warn!(delay, "ignoring reboot delay");
        }
    }

    if under_administration()? {
        return Err(RpcError::UnderAdministration);
    }

    if pacman::blocks_actions() {
        return Err(RpcError::PackageManagerActive);
    }

    sudo(SYSTEMCTL, &["reboot"])?;
    Ok(Response::message("System is rebooting."))
}
