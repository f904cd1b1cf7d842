//! # mcpbridge-core
//!
//! The Live-Object Façade, Handler Registry, Command Dispatcher, and
//! Thread Bridge behind the DAW remote-control bridge. Everything here
//! is transport-agnostic: `mcpbridge-net` hands it parsed
//! [`mcpbridge_types::Request`]s and writes back the
//! [`mcpbridge_types::Response`]s this crate returns.
//!
//! ## Module Overview
//! - [`state`] / [`facade`]: the live object graph and the narrow
//!   vocabulary handlers use to read and mutate it (§4.4).
//! - [`handlers`]: one module per functional area, each a flat list of
//!   `fn(&params, &mut LiveSet) -> Result<Value, FacadeError>` (§4.5).
//! - [`registry`]: the `type` string → handler lookup table (§4.5).
//! - [`scheduler`] / [`bridge`]: the main-thread scheduling adapter and
//!   the blocking rendezvous handlers use to reach it (§4.2, §4.3).
//! - [`dispatcher`]: ties registry + bridge together into one
//!   `Request -> Response` call (§4.6).
//! - [`browser_cache`]: offline browser-asset lookup (§4.9).
//! - [`config`]: environment-driven bridge configuration (§10.3).
//! - [`error`]: the façade and bridge error types (§7, §10.2).

pub mod bridge;
pub mod browser_cache;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod facade;
pub mod handlers;
pub mod params;
pub mod registry;
pub mod scheduler;
pub mod state;

pub use bridge::{RunOutcome, ThreadBridge, T_DEFAULT};
pub use browser_cache::BrowserCacheReader;
pub use config::Config;
pub use dispatcher::Dispatcher;
pub use error::{BridgeError, FacadeError};
pub use registry::{HandlerEntry, HandlerFn, Registry};
pub use scheduler::{ImmediateScheduler, Job, MainThreadScheduler, ScheduleRejected, StalledScheduler};
pub use state::LiveSet;
