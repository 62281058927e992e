//! Kiosksync Server - HTTP protocol handler
//!
//! One plain-HTTP listener carries the whole agent protocol:
//!
//! - `GET /` - aggregate status (last sync, best-effort system info)
//! - `GET /manifest` - checksum walk of the live tree, under the lock
//! - `GET /screenshot` - current display content
//! - `POST /` - tar.xz content bundle to apply
//! - `PUT /` - administrative command envelope
//!
//! The protocol is deliberately unauthenticated; the agent relies on
//! network-layer isolation of the terminal network.
//!
//! ## Modules
//!
//! - [`state`] - per-server shared state (config, lock, last sync)
//! - [`handler`] - the request state machine

pub mod handler;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use kiosksync_core::config::Config;

pub use state::ServerState;

/// The agent's HTTP server.
pub struct SyncServer {
    state: Arc<ServerState>,
    addr: SocketAddr,
}

impl SyncServer {
    /// Create a server for the given configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            state: ServerState::new(config),
            addr: SocketAddr::new(config.address, config.port),
        }
    }

    /// Bind and serve until the cancellation token fires.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<()> {
        let listener = TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("failed to bind {}", self.addr))?;
        info!(addr = %self.addr, "kiosksync listening");

        serve(listener, Arc::clone(&self.state), shutdown).await
    }
}

/// Accept loop over an already-bound listener.
///
/// Split out from [`SyncServer::run`] so tests can bind to an ephemeral
/// port first and learn the address.
pub async fn serve(
    listener: TcpListener,
    state: Arc<ServerState>,
    shutdown: CancellationToken,
) -> Result<()> {
    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer) = result.context("accept failed")?;
                let io = TokioIo::new(stream);
                let state = Arc::clone(&state);

                tokio::spawn(async move {
                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move {
                            Ok::<_, std::convert::Infallible>(
                                handler::handle_request(req, state).await,
                            )
                        }
                    });

                    if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                        error!(peer = %peer, error = %e, "connection error");
                    }
                });
            }
            _ = shutdown.cancelled() => {
                info!("server shutting down");
                break;
            }
        }
    }

    Ok(())
}
