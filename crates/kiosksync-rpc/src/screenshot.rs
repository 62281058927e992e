//! Screenshot capture via scrot

use std::fs;
use std::process::Command;

use serde::Deserialize;

use kiosksync_core::response::Response;

use crate::RpcError;

const SCROT: &str = "/usr/bin/scrot";

/// Supported image file types and their content types.
const FORMATS: &[(&str, &str)] = &[
    ("jpe", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
];

/// Argument envelope for the `screenshot` command.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, default)]
struct ScreenshotArgs {
    filetype: String,
    display: String,
    quality: Option<u8>,
    multidisp: bool,
}

impl Default for ScreenshotArgs {
    fn default() -> Self {
        Self {
            filetype: "jpg".to_string(),
            display: ":0".to_string(),
            quality: None,
            multidisp: false,
        }
    }
}

/// Capture a screenshot with default settings (used by GET /screenshot).
pub fn capture_default() -> Result<Response, RpcError> {
    capture(ScreenshotArgs::default())
}

/// Handle the `screenshot` command.
pub fn handle(args: serde_json::Map<String, serde_json::Value>) -> Result<Response, RpcError> {
    let args: ScreenshotArgs = serde_json::from_value(serde_json::Value::Object(args))
        .map_err(|err| RpcError::InvalidArguments(err.to_string()))?;

    capture(args)
}

fn capture(args: ScreenshotArgs) -> Result<Response, RpcError> {
    let content_type = FORMATS
        .iter()
        .find(|(filetype, _)| *filetype == args.filetype)
        .map(|(_, content_type)| *content_type)
        .ok_or_else(|| RpcError::InvalidArguments("Invalid image file type.".to_string()))?;

    let dir = tempfile::tempdir()
        .map_err(|err| RpcError::CommandFailed(format!("temp dir: {err}")))?;
    let file = dir.path().join(format!("screenshot.{}", args.filetype));

    let mut command = Command::new(SCROT);
    command.args(["--display", &args.display]);

    if let Some(quality) = args.quality {
        command.args(["--quality", &quality.to_string()]);
    }

    if args.multidisp {
        command.arg("--multidisp");
    }

    command.arg(&file);

    let status = command.status().map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            RpcError::NotImplemented
        } else {
            RpcError::CommandFailed(format!("scrot: {err}"))
        }
    })?;

    if !status.success() {
        return Err(RpcError::CommandFailed(format!("scrot exited with {status}")));
    }

    let bytes = fs::read(&file)
        .map_err(|err| RpcError::CommandFailed(format!("screenshot file: {err}")))?;

    Ok(Response::binary(bytes, content_type))
}
