//! # mcpbridge-types
//!
//! Wire protocol and live-object data model shared between the bridge's
//! core (dispatch, façade) and its network layer.
//!
//! ## Quick Start
//!
//! ```
//! use mcpbridge_types::{Request, Response};
//!
//! let req: Request = serde_json::from_str(
//!     r#"{"type":"get_session_info","params":{}}"#
//! ).unwrap();
//! assert_eq!(req.request_type, "get_session_info");
//!
//! let resp = Response::success(serde_json::json!({"tempo": 120.0}));
//! assert_eq!(resp.status, "success");
//! ```
//!
//! ## Module Overview
//! - [`wire`]: request/response envelopes exchanged over the TCP socket.
//! - [`error_kind`]: the error taxonomy (kinds, not Rust types) shared by
//!   every crate that needs to describe *why* a handler failed.
//! - [`param`]: the tagged parameter-value variant parsed at the JSON
//!   boundary before normalization.
//! - [`view`]: read-projection DTOs (session, track, clip, device,
//!   browser) returned to callers.

pub mod error_kind;
pub mod param;
pub mod view;
pub mod wire;

pub use error_kind::ErrorKind;
pub use param::ParamValue;
pub use view::{
    BrowserCacheEntry, BrowserCacheFile, BrowserNodeView, ClipSlotView, ClipSummary, ClipView, DeviceKind, DeviceSummary,
    MasterTrackView, MonitorState, Note, ParameterView, RoutingView, SendView, SessionView, TrackKind, TrackView,
};
pub use wire::{Request, Response};
