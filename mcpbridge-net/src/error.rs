//! Errors the framing and connection layer can raise. Handler-level
//! failures never reach here; those are already folded into a
//! [`mcpbridge_types::Response`] by the time `mcpbridge-core` returns.

use std::fmt;
use std::io;

#[derive(Debug)]
pub enum ProtocolError {
    Io(io::Error),
    /// A complete frame was read but it is not a well-formed request
    /// object (§4.7: malformed JSON closes the connection).
    Malformed(String),
    /// The in-flight frame exceeded `MAX_FRAME_BYTES` before a complete
    /// JSON value appeared in it.
    FrameTooLarge,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::Io(e) => write!(f, "io error: {e}"),
            ProtocolError::Malformed(msg) => write!(f, "malformed request: {msg}"),
            ProtocolError::FrameTooLarge => write!(f, "frame exceeded maximum size"),
        }
    }
}

impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProtocolError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ProtocolError {
    fn from(e: io::Error) -> Self {
        ProtocolError::Io(e)
    }
}
