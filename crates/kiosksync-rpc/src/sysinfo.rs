//! Best-effort system status aggregation
//!
//! Collects the administrative status fields merged into GET `/`
//! responses: uptime, load, memory, disk usage, pending updates and the
//! signage application state. Every collector is optional; one that
//! fails on this platform is simply omitted so the status response never
//! fails as a whole.

use std::fs;

use serde_json::{json, Map, Value};

use crate::proc::run;
use crate::{application, pacman, smartctl, RpcError};

const DF: &str = "/usr/bin/df";

/// Aggregate all collectors, skipping the ones that fail.
#[must_use]
pub fn sysinfo() -> Map<String, Value> {
    let mut info = Map::new();

    let collectors: [(&str, fn() -> Result<Value, RpcError>); 6] = [
        ("application", application::status_json),
        ("uptime", uptime),
        ("load", load),
        ("meminfo", meminfo),
        ("df", disk_usage),
        ("updates", || Ok(json!(pacman::checkupdates()?))),
    ];

    for (key, collector) in collectors {
        match collector() {
            Ok(value) => {
                info.insert(key.to_string(), value);
            }
            Err(err) => {
                tracing::debug!(collector = key, error = %err, "status collector unavailable");
            }
        }
    }

    // SMART scanning is slow; keep it last and equally optional.
    if let Ok(value) = smartctl::device_states() {
        info.insert("smartctl".to_string(), value);
    }

    info
}

/// Uptime in whole seconds from /proc/uptime.
fn uptime() -> Result<Value, RpcError> {
    let text = fs::read_to_string("/proc/uptime")
        .map_err(|err| RpcError::CommandFailed(format!("/proc/uptime: {err}")))?;
    parse_uptime(&text)
}

fn parse_uptime(text: &str) -> Result<Value, RpcError> {
    let seconds: f64 = text
        .split_whitespace()
        .next()
        .and_then(|field| field.parse().ok())
        .ok_or_else(|| RpcError::CommandFailed("unparseable /proc/uptime".to_string()))?;

    Ok(json!({ "seconds": seconds as u64 }))
}

/// Load averages from /proc/loadavg.
fn load() -> Result<Value, RpcError> {
    let text = fs::read_to_string("/proc/loadavg")
        .map_err(|err| RpcError::CommandFailed(format!("/proc/loadavg: {err}")))?;
    parse_loadavg(&text)
}

fn parse_loadavg(text: &str) -> Result<Value, RpcError> {
    let mut fields = text.split_whitespace();
    let mut next = || -> Result<f64, RpcError> {
        fields
            .next()
            .and_then(|field| field.parse().ok())
            .ok_or_else(|| RpcError::CommandFailed("unparseable /proc/loadavg".to_string()))
    };

    Ok(json!({
        "past1": next()?,
        "past5": next()?,
        "past15": next()?,
    }))
}

/// Total and available memory from /proc/meminfo, in kilobytes.
fn meminfo() -> Result<Value, RpcError> {
    let text = fs::read_to_string("/proc/meminfo")
        .map_err(|err| RpcError::CommandFailed(format!("/proc/meminfo: {err}")))?;
    Ok(parse_meminfo(&text))
}

fn parse_meminfo(text: &str) -> Value {
    let mut map = Map::new();

    for line in text.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let Some(kilobytes) = rest
            .split_whitespace()
            .next()
            .and_then(|field| field.parse::<u64>().ok())
        else {
            continue;
        };
        map.insert(key.to_string(), json!(kilobytes));
    }

    Value::Object(map)
}

/// Local filesystem usage from `df -lP`.
fn disk_usage() -> Result<Value, RpcError> {
    let text = run(DF, &["-lP"])?;
    Ok(json!(parse_df(&text)))
}

fn parse_df(text: &str) -> Vec<Value> {
    text.lines()
        .skip(1) // header
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            let [filesystem, blocks, used, available, use_pct, mountpoint] = fields[..] else {
                return None;
            };

            Some(json!({
                "filesystem": filesystem,
                "blocks": blocks.parse::<u64>().ok()?,
                "used": used.parse::<u64>().ok()?,
                "available": available.parse::<u64>().ok()?,
                "use_pct": use_pct.trim_end_matches('%').parse::<u64>().ok()?,
                "mountpoint": mountpoint,
            }))
        })
        .collect()
}
