//! Error types shared across the driver surface.

use thiserror::Error;

use crate::client::ClientError;
use crate::session::SessionError;

/// Errors that abort a driver command and surface to the orchestration host.
///
/// Per-action provider failures are not represented here: the service layer
/// captures those locally and reports them as failed results inside an
/// otherwise successful batch response.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum DriverError {
    /// Raised when discovery input fails a domain check.
    #[error("validation failed: {0}")]
    Validation(String),
    /// Raised when the provider connectivity probe fails during discovery.
    #[error("could not connect using given credentials: {0}")]
    Connection(String),
    /// Raised when a required action is missing or duplicated in a parsed
    /// request batch.
    #[error("expected exactly one {kind} action, found {count}")]
    Lookup {
        /// Action kind that was searched for.
        kind: &'static str,
        /// Number of matching actions actually present.
        count: usize,
    },
    /// Raised when the deploy action names a deployment path that has not
    /// been registered.
    #[error("deployment path '{path}' is not supported")]
    UnsupportedConfiguration {
        /// Deployment path received from the host.
        path: String,
    },
    /// Raised when cooperative cancellation is observed between stages of a
    /// multi-stage operation.
    #[error("operation cancelled by the host")]
    Cancelled,
    /// Raised when a request or context payload cannot be parsed or a
    /// response cannot be serialized.
    #[error("malformed payload: {0}")]
    Malformed(String),
    /// Raised when a host-session call fails.
    #[error("host session failure: {0}")]
    Session(#[from] SessionError),
    /// Raised when a pass-through provider call fails outside a
    /// per-action recovery boundary.
    #[error("provider operation failed: {0}")]
    Provider(#[from] ClientError),
}

impl DriverError {
    /// Wraps a serde failure as a [`DriverError::Malformed`] error.
    pub(crate) fn malformed(context: &str, err: &serde_json::Error) -> Self {
        Self::Malformed(format!("{context}: {err}"))
    }
}
