//! Error enums for the façade, dispatcher and thread bridge (§7, §10.2).
//!
//! Plain enums with hand-written `Display`/`Error` impls, following the
//! reference workspace's own style (`imbolc-core::interaction_log::ReplayError`)
//! rather than a derive-macro error crate.

use std::fmt;

use mcpbridge_types::ErrorKind;

/// An error raised by façade/handler code while serving one request.
#[derive(Debug, Clone)]
pub struct FacadeError {
    pub kind: ErrorKind,
    pub message: String,
}

impl FacadeError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn out_of_range(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::OutOfRange, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn bad_value(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadValue, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unsupported, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl fmt::Display for FacadeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for FacadeError {}

impl From<std::num::ParseIntError> for FacadeError {
    fn from(e: std::num::ParseIntError) -> Self {
        FacadeError::bad_value(e.to_string())
    }
}

/// Outcome of a `ThreadBridge::run_on_main` call that the Dispatcher
/// must translate into a wire response (§4.3, §4.6).
#[derive(Debug)]
pub enum BridgeError {
    /// The scheduled closure did not complete within the configured budget.
    Timeout,
    /// The Host Boundary is tearing down; pending rendezvous are woken
    /// with this instead of waiting out the full timeout (§4.3).
    ShuttingDown,
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::Timeout => write!(f, "Timeout waiting for operation to complete"),
            BridgeError::ShuttingDown => write!(f, "shutting down"),
        }
    }
}

impl std::error::Error for BridgeError {}
