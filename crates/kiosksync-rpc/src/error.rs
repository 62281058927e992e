//! Administrative error taxonomy
//!
//! The closed set of failure kinds every administrative handler can
//! produce, with the single translation step to HTTP statuses.

use thiserror::Error;

use kiosksync_core::response::Response;

/// Errors produced by administrative command handlers.
#[derive(Debug, Error)]
pub enum RpcError {
    /// The action is not implemented on this platform
    #[error("Action is not implemented on this platform.")]
    NotImplemented,

    /// An administrator is logged in, blocking disruptive actions
    #[error("The system is currently under administration.")]
    UnderAdministration,

    /// The package manager is running, blocking conflicting actions
    #[error("The package manager is currently running.")]
    PackageManagerActive,

    /// The command's argument envelope has the wrong shape
    #[error("Invalid arguments specified: {0}")]
    InvalidArguments(String),

    /// The platform utility failed or could not be spawned
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

impl RpcError {
    /// The HTTP status code for this error kind.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::NotImplemented => 501,
            Self::UnderAdministration | Self::PackageManagerActive => 503,
            Self::InvalidArguments(_) => 400,
            Self::CommandFailed(_) => 500,
        }
    }

    /// Translate into the uniform response triple.
    #[must_use]
    pub fn into_response(self) -> Response {
        let status = self.status();
        Response::error(self.to_string(), status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(RpcError::NotImplemented.status(), 501);
        assert_eq!(RpcError::UnderAdministration.status(), 503);
        assert_eq!(RpcError::PackageManagerActive.status(), 503);
        assert_eq!(RpcError::InvalidArguments("x".into()).status(), 400);
        assert_eq!(RpcError::CommandFailed("x".into()).status(), 500);
    }

    #[test]
    fn test_into_response_carries_message() {
        let response = RpcError::UnderAdministration.into_response();
        assert_eq!(response.status(), 503);
        assert_eq!(
            response.into_body(),
            br#"{"message":"The system is currently under administration."}"#
        );
    }
}
