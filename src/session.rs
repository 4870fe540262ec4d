//! Host-session capability.
//!
//! The orchestration host exposes a per-command session used to decrypt app
//! passwords and to push deployed-app updates back. The driver only sees the
//! [`HostSession`] trait; tests substitute recording fakes.

use thiserror::Error;

/// Error raised when a host-session call fails.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("{operation} failed: {message}")]
pub struct SessionError {
    /// Session operation that failed.
    pub operation: &'static str,
    /// Message reported by the host.
    pub message: String,
}

/// Per-command host session.
pub trait HostSession {
    /// Decrypts a password stored by the host.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the host refuses to decrypt.
    fn decrypt_password(&self, encrypted: &str) -> Result<String, SessionError>;

    /// Updates the address recorded on a deployed app.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the update is rejected.
    fn update_resource_address(&self, fullname: &str, address: &str) -> Result<(), SessionError>;

    /// Sets an attribute value on a deployed app.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the update is rejected.
    fn set_attribute_value(
        &self,
        fullname: &str,
        attribute: &str,
        value: &str,
    ) -> Result<(), SessionError>;
}

/// Session for hosts that store passwords in the clear: decryption is the
/// identity and updates are logged and accepted.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlaintextSession;

impl PlaintextSession {
    /// Creates the session.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HostSession for PlaintextSession {
    fn decrypt_password(&self, encrypted: &str) -> Result<String, SessionError> {
        Ok(encrypted.to_owned())
    }

    fn update_resource_address(&self, fullname: &str, address: &str) -> Result<(), SessionError> {
        tracing::info!(fullname, address, "resource address updated");
        Ok(())
    }

    fn set_attribute_value(
        &self,
        fullname: &str,
        attribute: &str,
        value: &str,
    ) -> Result<(), SessionError> {
        tracing::info!(fullname, attribute, value, "attribute value updated");
        Ok(())
    }
}
