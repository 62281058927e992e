//! Digital signage application service control
//!
//! The terminal runs its presentation through one of two systemd units;
//! whichever unit file is installed is the preferred application. The
//! `application` command reports its state or toggles it via systemctl.

use std::path::Path;

use serde::Deserialize;
use serde_json::json;

use kiosksync_core::response::Response;

use crate::proc::{is_active, is_enabled, sudo, SYSTEMCTL};
use crate::RpcError;

/// Directory holding the vendor unit files.
const SERVICES_DIR: &str = "/usr/lib/systemd/system";

/// Known signage application units, in order of preference.
const APPLICATIONS: &[(&str, &str)] = &[("html", "html5ds.service"), ("air", "application.service")];

/// Argument envelope for the `application` command.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
struct ApplicationArgs {
    /// `None` queries status, `Some(true)` enables, `Some(false)` disables.
    state: Option<bool>,
}

/// The preferred application unit: the first one whose unit file exists.
pub fn preferred_unit() -> Result<(&'static str, &'static str), RpcError> {
    APPLICATIONS
        .iter()
        .copied()
        .find(|(_, unit)| Path::new(SERVICES_DIR).join(unit).is_file())
        .ok_or_else(|| RpcError::CommandFailed("No signage service installed.".to_string()))
}

/// Status of the preferred application unit as a JSON value.
pub fn status_json() -> Result<serde_json::Value, RpcError> {
    let (name, unit) = preferred_unit()?;

    Ok(json!({
        "name": name,
        "unit": unit,
        "enabled": is_enabled(unit),
        "running": is_active(unit),
    }))
}

/// Handle the `application` command.
pub fn handle(args: serde_json::Map<String, serde_json::Value>) -> Result<Response, RpcError> {
    let args: ApplicationArgs = serde_json::from_value(serde_json::Value::Object(args))
        .map_err(|err| RpcError::InvalidArguments(err.to_string()))?;

    match args.state {
        None => Ok(Response::json(status_json()?)),
        Some(true) => {
            let (_, unit) = preferred_unit()?;
            sudo(SYSTEMCTL, &["enable", "--now", unit])?;
            Ok(Response::message("Application enabled."))
        }
        Some(false) => {
            let (_, unit) = preferred_unit()?;
            sudo(SYSTEMCTL, &["disable", "--now", unit])?;
            Ok(Response::message("Application disabled."))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_wrong_argument_shape() {
        let mut args = serde_json::Map::new();
        args.insert("state".to_string(), serde_json::json!("yes"));

        let err = handle(args).unwrap_err();
        assert!(matches!(err, RpcError::InvalidArguments(_)));
    }

    #[test]
    fn test_rejects_unknown_arguments() {
        let mut args = serde_json::Map::new();
        args.insert("bogus".to_string(), serde_json::json!(1));

        let err = handle(args).unwrap_err();
        assert!(matches!(err, RpcError::InvalidArguments(_)));
    }
}
