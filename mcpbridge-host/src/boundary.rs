//! Host Boundary (§4.1): the lifecycle object a DAW instantiates when
//! the user selects this control surface. Owns the Server and the
//! Thread Bridge's shutdown; exposes `log`/`show` sinks to everything
//! else in the bridge.
//!
//! Grounded on the reference workspace's top-level binary wiring
//! (`imbolc-ui/src/main.rs`, `imbolc-ui/src/network.rs::run_server`):
//! a single entry point that builds the dispatcher, binds the socket,
//! and owns the thread(s) that keep it alive, with `log::` macros as
//! the logging surface throughout.

use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use mcpbridge_core::{Config, Dispatcher, LiveSet, ThreadBridge};
use mcpbridge_net::Server;

use crate::scheduler::TickScheduler;

/// Lifecycle object the host process owns for as long as this control
/// surface is loaded. One instance per loaded surface, matching the
/// spec's "no global mutable state beyond the Host Boundary singleton"
/// (§5).
pub struct HostBoundary {
    config: Config,
    scheduler: Arc<TickScheduler>,
    bridge: Arc<ThreadBridge<TickScheduler>>,
    dispatcher: Arc<Dispatcher<TickScheduler>>,
    server: Mutex<Option<Arc<Server>>>,
    accept_thread: Mutex<Option<JoinHandle<()>>>,
}

impl HostBoundary {
    /// Builds the façade, dispatcher and scheduler, but does not bind
    /// a socket yet — that happens in [`HostBoundary::on_init`], which
    /// is the point the host actually hands us control.
    pub fn new() -> Self {
        let config = Config::load();
        let scheduler = Arc::new(TickScheduler::new());
        let bridge = Arc::new(ThreadBridge::new(scheduler.clone()));
        let live = Arc::new(Mutex::new(LiveSet::new()));
        let dispatcher = Arc::new(Dispatcher::new(bridge.clone(), live));

        Self {
            config,
            scheduler,
            bridge,
            dispatcher,
            server: Mutex::new(None),
            accept_thread: Mutex::new(None),
        }
    }

    /// `on_init` (§4.1): binds the listener and starts its accept
    /// loop on its own thread. On any failure the bridge stays loaded
    /// but inert — no retries, per spec.
    pub fn on_init(&self) {
        match Server::bind(&self.config.host, self.config.port) {
            Ok(server) => {
                let server = Arc::new(server);
                *self.server.lock().unwrap_or_else(|e| e.into_inner()) = Some(server.clone());

                let dispatcher = self.dispatcher.clone();
                let accept_server = server.clone();
                let handle = std::thread::spawn(move || accept_server.serve(dispatcher));
                *self.accept_thread.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);

                self.log(&format!(
                    "listening on {}:{}",
                    self.config.host, self.config.port
                ));
                self.show("AbletonMCP: listening");
            }
            Err(e) => {
                self.log(&format!(
                    "failed to bind {}:{}: {e}",
                    self.config.host, self.config.port
                ));
                self.show("AbletonMCP: failed to start (see log)");
            }
        }
    }

    /// `on_disconnect` (§4.1): idempotent. Stops the listener, wakes
    /// any pending Thread Bridge rendezvous with a shutdown error, and
    /// joins the accept thread with the Server's own bounded wait.
    pub fn on_disconnect(&self) {
        self.bridge.shutdown();

        let server = self.server.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(server) = server {
            server.shutdown();
        }

        let handle = self
            .accept_thread
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }

        self.log("disconnected");
    }

    /// Cheap and safe from any thread (§4.1).
    pub fn log(&self, msg: &str) {
        log::info!("{msg}");
    }

    /// Main-thread-only and best-effort (§4.1). Off the main thread
    /// this schedules itself through the same Thread Bridge every
    /// handler uses rather than touching the (nonexistent, in this
    /// build) host status line directly; a dropped schedule is
    /// acceptable since `show` never reports its own failure back to
    /// the caller.
    pub fn show(&self, msg: &str) {
        if self.scheduler.is_on_main_thread() {
            log::info!("[status] {msg}");
            return;
        }
        let owned = msg.to_string();
        let _ = self.scheduler.schedule(Box::new(move || {
            log::info!("[status] {owned}");
        }));
    }

    /// Lets an embedding test harness (or, in a real DAW binding, the
    /// host's own tick callback) designate the calling thread as main
    /// and drain whatever the Thread Bridge has queued for it. Not
    /// part of the wire-facing contract; §4.2's adapter exists
    /// precisely so handlers never call this directly.
    pub fn run_pending_main_thread_work(&self) {
        self.scheduler.mark_current_thread_as_main();
        self.scheduler.run_pending();
    }

    pub fn bound_addr(&self) -> Option<std::net::SocketAddr> {
        self.server
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .and_then(|s| s.local_addr().ok())
    }
}

impl Default for HostBoundary {
    fn default() -> Self {
        Self::new()
    }
}
