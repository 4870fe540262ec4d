//! Logging setup and payload logging helpers.
//!
//! The orchestration host owns the process, so subscriber installation is
//! opt-in: hosts that want the driver's spans on stderr call [`init`] once.

use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::results::canonical_json;

/// Installs a stderr `tracing` subscriber honouring `RUST_LOG`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

/// Logs a named payload in canonical JSON form.
///
/// Empty payloads (null, empty object/array/string) produce a placeholder
/// line instead of an empty body.
pub fn log_value<T: Serialize>(name: &str, value: &T) {
    match canonical_json(value) {
        Ok(json) if matches!(json.as_str(), "null" | "{}" | "[]" | "\"\"") => {
            tracing::info!(name, "payload is empty");
        }
        Ok(json) => {
            tracing::info!(name, payload = %json, "payload");
        }
        Err(err) => {
            tracing::warn!(name, error = %err, "payload could not be serialized");
        }
    }
}
