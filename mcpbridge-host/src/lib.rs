//! # mcpbridge-host
//!
//! The Host Boundary: the lifecycle object a DAW instantiates when the
//! user selects this control surface (§4.1). Ties `mcpbridge-core`'s
//! façade and dispatcher to `mcpbridge-net`'s server, installs the
//! logging backend, and provides the production
//! [`scheduler::TickScheduler`] that stands in for the host's real
//! "run this on the main thread" primitive.
//!
//! This crate has no `main` and is not meant to run as a standalone
//! process (§6 "CLI: none") — a real binding would be the DAW's own
//! plugin loader calling [`boundary::HostBoundary::on_init`] /
//! [`boundary::HostBoundary::on_disconnect`] directly. `tests/` holds
//! an integration harness that plays that host's part well enough to
//! exercise the whole stack end-to-end over a real TCP socket.

pub mod boundary;
pub mod logging;
pub mod scheduler;

pub use boundary::HostBoundary;
pub use scheduler::TickScheduler;
