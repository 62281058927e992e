//! Kiosksync RPC - Administrative command dispatch
//!
//! The remote-administration surface of the agent: a name → handler map
//! of platform commands (service toggling, reboot, identification beep,
//! disk health, package updates, screenshots) invoked via HTTP PUT.
//!
//! Every handler is a thin wrapper that shells out to a platform utility
//! and translates its exit status into the uniform
//! [`Response`](kiosksync_core::response::Response) triple. There is no
//! algorithmic complexity here by design; anything clever belongs in the
//! sync engine.
//!
//! ## Error taxonomy
//!
//! [`RpcError`] is the closed set of failure kinds at this boundary,
//! translated to HTTP statuses in exactly one place
//! ([`RpcError::into_response`]): unimplemented → 501, administrative or
//! package-manager conflicts → 503, bad arguments → 400, everything else
//! the platform reports → 500.

pub mod application;
pub mod beep;
pub mod commands;
pub mod error;
pub mod pacman;
pub mod proc;
pub mod reboot;
pub mod screenshot;
pub mod smartctl;
pub mod sysinfo;

pub use commands::{dispatch, is_known_command};
pub use error::RpcError;
