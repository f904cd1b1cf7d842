//! The bridge's error taxonomy (§7): kinds, not distinct Rust types.
//!
//! Every crate-specific error enum carries one of these as its tag so
//! logging and the wire message can agree on vocabulary without the
//! crates depending on each other's concrete error types.

use std::fmt;

/// Coarse classification of a handler/dispatch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown handler `type`.
    Unknown,
    /// Index past current count (track, clip, device, send, scene, return).
    OutOfRange,
    /// Browser item/URI or named device not resolvable.
    NotFound,
    /// Parameter value could not be normalized or fails bounds after normalization.
    BadValue,
    /// Slot already occupied and the caller did not opt into overwrite.
    Conflict,
    /// Operation the host API does not expose.
    Unsupported,
    /// Main-thread work did not complete within the Thread Bridge's budget.
    Timeout,
    /// Unparseable JSON or otherwise malformed frame.
    ProtocolError,
    /// Anything else; full trace logged, generic message returned.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Unknown => "unknown",
            ErrorKind::OutOfRange => "out_of_range",
            ErrorKind::NotFound => "not_found",
            ErrorKind::BadValue => "bad_value",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Unsupported => "unsupported",
            ErrorKind::Timeout => "timeout",
            ErrorKind::ProtocolError => "protocol_error",
            ErrorKind::Internal => "internal",
        };
        f.write_str(s)
    }
}
