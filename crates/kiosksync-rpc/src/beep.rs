//! System identification via speaker beep

use serde::Deserialize;

use kiosksync_core::response::Response;

use crate::proc::run;
use crate::RpcError;

const BEEP: &str = "/usr/bin/beep";

/// Argument envelope for the `beep` command.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
struct BeepArgs {
    /// Extra arguments passed straight through to the beep utility.
    args: Vec<String>,
}

/// Handle the `beep` command.
pub fn handle(args: serde_json::Map<String, serde_json::Value>) -> Result<Response, RpcError> {
    let args: BeepArgs = serde_json::from_value(serde_json::Value::Object(args))
        .map_err(|err| RpcError::InvalidArguments(err.to_string()))?;

    let refs: Vec<&str> = args.args.iter().map(String::as_str).collect();
    run(BEEP, &refs)?;

    Ok(Response::message("System should have beeped."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_string_args() {
        let mut args = serde_json::Map::new();
        args.insert("args".to_string(), serde_json::json!([1, 2]));

        let err = handle(args).unwrap_err();
        assert!(matches!(err, RpcError::InvalidArguments(_)));
    }
}
