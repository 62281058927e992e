//! Disk health via SMART
//!
//! Scans for SMART-capable devices and reports the overall-health
//! self-assessment per device.

use serde::Deserialize;
use serde_json::json;

use kiosksync_core::response::Response;

use crate::proc::sudo;
use crate::RpcError;

const SMARTCTL: &str = "/usr/bin/smartctl";
const HEALTH_PREFIX: &str = "SMART overall-health self-assessment test result:";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
struct NoArgs {}

/// Devices reported by `smartctl --scan-open`, first column per line.
fn parse_scan(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

/// Extract the health verdict from `smartctl -H` output.
fn parse_health(text: &str) -> String {
    text.lines()
        .filter_map(|line| line.trim().strip_prefix(HEALTH_PREFIX))
        .map(|result| result.trim().to_string())
        .next()
        .unwrap_or_else(|| "UNKNOWN".to_string())
}

/// SMART state of every detected device.
pub fn device_states() -> Result<serde_json::Value, RpcError> {
    let scan = sudo(SMARTCTL, &["--scan-open"])?;
    let mut states = serde_json::Map::new();

    for device in parse_scan(&scan) {
        let health = sudo(SMARTCTL, &["-H", &device])?;
        states.insert(device, json!(parse_health(&health)));
    }

    Ok(serde_json::Value::Object(states))
}

/// Handle the `smartctl` command.
pub fn handle(args: serde_json::Map<String, serde_json::Value>) -> Result<Response, RpcError> {
    let NoArgs {} = serde_json::from_value(serde_json::Value::Object(args))
        .map_err(|err| RpcError::InvalidArguments(err.to_string()))?;

    Ok(Response::json(device_states()?))
}
