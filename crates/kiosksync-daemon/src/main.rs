//! Kiosksync Daemon - Digital signage synchronization agent
//!
//! This binary runs on each signage terminal and handles:
//! - The HTTP protocol endpoint for the fleet server
//! - Discovery of the terminal's VPN address
//! - Graceful shutdown on SIGTERM/SIGINT
//!
//! # Exit codes
//!
//! - `2` - address discovery failed (VPN down or ambiguous addressing)
//! - `3` - the content directory does not exist

use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use kiosksync_core::config::{Config, DEFAULT_CHUNK_SIZE, DEFAULT_PORT};
use kiosksync_server::SyncServer;

mod network;

use network::Ipv4Network;

const EXIT_NETWORK: u8 = 2;
const EXIT_DIRECTORY: u8 = 3;

#[derive(Debug, Parser)]
#[command(name = "kiosksyncd", version, about = "Digital signage synchronization agent")]
struct Args {
    /// Address to bind to; discovered from --network when omitted
    #[arg(short, long)]
    address: Option<IpAddr>,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Terminal network to discover the bind address in
    #[arg(short, long, default_value = "10.8.0.0/16")]
    network: Ipv4Network,

    /// Content directory to synchronize
    #[arg(short, long, default_value = ".")]
    directory: PathBuf,

    /// Chunk size for hashing and copying, in bytes
    #[arg(short, long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    /// Resolve the bind address, discovering it when not given.
    fn resolve_address(&self) -> Result<IpAddr, network::NetworkError> {
        match self.address {
            Some(addr) => Ok(addr),
            None => network::discover_address(self.network).map(IpAddr::V4),
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();
}

/// Waits for SIGTERM or SIGINT and triggers the cancellation token.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received SIGINT");
        }
        _ = terminate => {
            info!("received SIGTERM");
        }
    }

    token.cancel();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let address = match args.resolve_address() {
        Ok(address) => address,
        Err(err) => {
            error!(error = %err, "could not determine bind address");
            return ExitCode::from(EXIT_NETWORK);
        }
    };

    if !args.directory.is_dir() {
        error!(directory = %args.directory.display(), "content directory does not exist");
        return ExitCode::from(EXIT_DIRECTORY);
    }

    let config = Config {
        address,
        port: args.port,
        directory: args.directory,
        chunk_size: args.chunk_size,
    };

    if let Err(err) = config.validate() {
        error!(error = %err, "invalid configuration");
        return ExitCode::from(EXIT_DIRECTORY);
    }

    info!(address = %address, port = args.port, "kiosksync daemon starting");

    let shutdown_token = CancellationToken::new();

    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    let server = SyncServer::new(&config);
    match server.run(shutdown_token).await {
        Ok(()) => {
            info!("kiosksync daemon shut down gracefully");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "kiosksync daemon exiting with error");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["kiosksyncd"]);
        assert_eq!(args.port, DEFAULT_PORT);
        assert_eq!(args.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(args.network.to_string(), "10.8.0.0/16");
        assert!(args.address.is_none());
    }

    #[test]
    fn test_explicit_address_skips_discovery() {
        let args = Args::parse_from(["kiosksyncd", "-a", "127.0.0.1", "-p", "9000"]);
        assert_eq!(
            args.resolve_address().unwrap(),
            "127.0.0.1".parse::<IpAddr>().unwrap()
        );
        assert_eq!(args.port, 9000);
    }
}
