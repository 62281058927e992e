//! Request handling
//!
//! The per-request state machine: read → dispatch → respond. All four
//! verbs funnel their outcome through the uniform
//! [`Response`](kiosksync_core::response::Response) triple and one
//! formatting function, [`render`].
//!
//! Side effects are confined to the live directory (POST), the sync log
//! (successful POST) and the single-flight lock. Everything blocking
//! (tree walks, archive extraction, platform commands) runs on the
//! blocking thread pool.

use std::io::{Seek, SeekFrom, Write};
use std::sync::Arc;

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Method, Request, Response as HyperResponse, StatusCode};
use serde_json::{json, Value};
use tokio::task;
use tracing::{debug, error, info, warn};

use kiosksync_core::response::Response;
use kiosksync_rpc as rpc;
use kiosksync_sync::{apply_update, synclog, walker};

use crate::state::ServerState;

/// Render the uniform response triple as a hyper response.
fn render(response: Response) -> HyperResponse<Full<Bytes>> {
    let status =
        StatusCode::from_u16(response.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let content_type = response.content_type().to_string();

    // The only fallible input here is the header value, which we
    // construct from our own fixed content types.
    HyperResponse::builder()
        .status(status)
        .header("Content-Type", content_type)
        .body(Full::new(Bytes::from(response.into_body())))
        .unwrap_or_else(|_| {
            let mut fallback = HyperResponse::new(Full::new(Bytes::new()));
            *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
}

/// Handle one request. Never fails; every error becomes a status code.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<ServerState>,
) -> HyperResponse<Full<Bytes>>
where
    B: hyper::body::Body<Data = Bytes> + Unpin,
    B::Error: std::fmt::Display,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    debug!(%method, %path, "handling request");

    let response = match (method, path.as_str()) {
        (Method::GET, "" | "/") => get_status(&state).await,
        (Method::GET, "/manifest") => get_manifest(&state).await,
        (Method::GET, "/screenshot") => get_screenshot().await,
        (Method::POST, "" | "/") => post_update(req, &state).await,
        (Method::PUT, "" | "/") => put_command(req, &state).await,
        _ => Response::text("Invalid path.", 404),
    };

    render(response)
}

// ============================================================================
// GET / - aggregate status
// ============================================================================

/// Build the status document: last-sync timestamp plus whatever the
/// best-effort system collectors produce. Never fails as a whole.
async fn get_status(state: &Arc<ServerState>) -> Response {
    let last_sync = state.last_sync().map(|ts| ts.to_rfc3339());

    let mut status = match task::spawn_blocking(rpc::sysinfo::sysinfo).await {
        Ok(info) => info,
        Err(err) => {
            warn!(error = %err, "status collectors panicked");
            serde_json::Map::new()
        }
    };

    status.insert("lastSync".to_string(), json!(last_sync));
    Response::json(Value::Object(status))
}

// ============================================================================
// GET /manifest - checksum walk under the lock
// ============================================================================

async fn get_manifest(state: &Arc<ServerState>) -> Response {
    let Some(guard) = state.lock.try_acquire() else {
        warn!("manifest query while locked");
        return Response::text("System is currently locked.", 503);
    };

    let directory = state.directory.clone();
    let chunk_size = state.chunk_size;

    let walked = task::spawn_blocking(move || {
        // The guard lives for the duration of the walk.
        let _guard = guard;
        walker::gen_manifest(&directory, chunk_size)
    })
    .await;

    let manifest = match walked {
        Ok(Ok(manifest)) => manifest,
        Ok(Err(err)) => {
            error!(error = %err, "manifest generation failed");
            return Response::error(err.to_string(), 500);
        }
        Err(err) => {
            error!(error = %err, "manifest task panicked");
            return Response::error("Manifest generation failed.", 500);
        }
    };

    let mut body = serde_json::Map::new();
    body.insert("manifest".to_string(), json!(manifest));

    // Best-effort extras, matching the status path.
    if let Ok(Ok(application)) = task::spawn_blocking(rpc::application::status_json).await {
        body.insert("application".to_string(), application);
    }

    if let Some(last_sync) = state.last_sync() {
        body.insert("last_sync".to_string(), json!(last_sync.to_rfc3339()));
    }

    debug!("sending manifest");
    Response::json(Value::Object(body))
}

// ============================================================================
// GET /screenshot
// ============================================================================

async fn get_screenshot() -> Response {
    match task::spawn_blocking(rpc::screenshot::capture_default).await {
        Ok(Ok(response)) => response,
        Ok(Err(err)) => err.into_response(),
        Err(err) => {
            error!(error = %err, "screenshot task panicked");
            Response::error("Screenshot failed.", 500)
        }
    }
}

// ============================================================================
// POST - content synchronization
// ============================================================================

async fn post_update<B>(req: Request<B>, state: &Arc<ServerState>) -> Response
where
    B: hyper::body::Body<Data = Bytes> + Unpin,
    B::Error: std::fmt::Display,
{
    info!("incoming sync");

    let Some(guard) = state.lock.try_acquire() else {
        warn!("synchronization already in progress");
        return Response::text("Synchronization already in progress.", 503);
    };

    // Spool the archive stream to disk chunk by chunk; content bundles
    // can be far larger than we are willing to buffer in memory.
    let mut spool = match tempfile::tempfile() {
        Ok(file) => file,
        Err(err) => {
            error!(error = %err, "could not create spool file");
            return Response::text("Synchronization failed.", 500);
        }
    };

    let mut body = req.into_body();
    while let Some(frame) = body.frame().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(err) => {
                error!(error = %err, "error reading sync body");
                return Response::text("Synchronization failed.", 500);
            }
        };

        if let Ok(data) = frame.into_data() {
            if let Err(err) = spool.write_all(&data) {
                error!(error = %err, "error spooling sync body");
                return Response::text("Synchronization failed.", 500);
            }
        }
    }

    let directory = state.directory.clone();
    let chunk_size = state.chunk_size;

    let outcome = task::spawn_blocking(move || {
        let _guard = guard;
        spool.seek(SeekFrom::Start(0))?;

        apply_update(spool, &directory, chunk_size)?;

        // Only a fully successful sync is recorded.
        let timestamp = chrono::Utc::now();
        synclog::record_sync(&directory, timestamp)?;
        Ok::<_, anyhow::Error>(timestamp)
    })
    .await;

    match outcome {
        Ok(Ok(timestamp)) => {
            state.set_last_sync(timestamp);
            info!("system synchronized");
            Response::text("System synchronized.", 200)
        }
        Ok(Err(err)) => {
            error!(error = %err, "synchronization failed");
            Response::text("Synchronization failed.", 500)
        }
        Err(err) => {
            error!(error = %err, "synchronization task panicked");
            Response::text("Synchronization failed.", 500)
        }
    }
}

// ============================================================================
// PUT - administrative command envelope
// ============================================================================

async fn put_command<B>(req: Request<B>, _state: &Arc<ServerState>) -> Response
where
    B: hyper::body::Body<Data = Bytes> + Unpin,
    B::Error: std::fmt::Display,
{
    info!("incoming command");

    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            error!(error = %err, "error reading command body");
            return Response::text("Error reading request body.", 500);
        }
    };

    let Ok(Value::Object(mut envelope)) = serde_json::from_slice::<Value>(&body) else {
        return Response::text("Received data is not JSON.", 406);
    };

    let Some(command) = envelope.remove("command") else {
        return Response::text("No command specified.", 400);
    };

    let Value::String(command) = command else {
        return Response::text("No command specified.", 400);
    };

    debug!(command = %command, "received command");

    if !rpc::is_known_command(&command) {
        return Response::text(format!("Invalid command specified: {command}"), 400);
    }

    match task::spawn_blocking(move || rpc::dispatch(&command, envelope)).await {
        // The lookup was checked above; a None here cannot happen.
        Ok(Some(response)) => response,
        Ok(None) => Response::text("Invalid command specified.", 400),
        Err(err) => {
            error!(error = %err, "command task panicked");
            Response::error("Command failed.", 500)
        }
    }
}
