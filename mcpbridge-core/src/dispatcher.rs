//! The Command Dispatcher (§4.6): turns one parsed [`Request`] into a
//! [`Response`], looking the handler up in the [`Registry`] and routing
//! it through the [`ThreadBridge`] when it must run on the main thread.

use std::sync::{Arc, Mutex};

use mcpbridge_types::{Request, Response};

use crate::bridge::{RunOutcome, ThreadBridge};
use crate::registry::Registry;
use crate::scheduler::MainThreadScheduler;
use crate::state::LiveSet;

pub struct Dispatcher<S: MainThreadScheduler> {
    registry: Registry,
    bridge: Arc<ThreadBridge<S>>,
    live: Arc<Mutex<LiveSet>>,
}

impl<S: MainThreadScheduler + 'static> Dispatcher<S> {
    pub fn new(bridge: Arc<ThreadBridge<S>>, live: Arc<Mutex<LiveSet>>) -> Self {
        Self {
            registry: Registry::with_defaults(),
            bridge,
            live,
        }
    }

    /// Step 1-6 of §4.6. Never panics on a handler's behalf: a handler
    /// panic would poison the `Mutex`, but every handler here returns
    /// `Result` rather than unwinding, so that's not a path a caller of
    /// this crate needs to plan for.
    pub fn dispatch(&self, request: &Request) -> Response {
        let entry = match self.registry.lookup(&request.request_type) {
            Some(entry) => entry,
            None => {
                log::warn!("unknown command: {}", request.request_type);
                return Response::error(format!("Unknown command: {}", request.request_type));
            }
        };

        let handler = entry.handler;
        let params = request.params.clone();
        let request_type = request.request_type.clone();

        if !entry.requires_main_thread {
            let live = self.live.clone();
            return match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                let mut guard = live.lock().unwrap_or_else(|e| e.into_inner());
                handler(&params, &mut guard)
            })) {
                Ok(Ok(result)) => Response::success(result),
                Ok(Err(err)) => {
                    log::error!("handler '{}' failed: {}", request_type, err);
                    Response::error(err.to_string())
                }
                Err(_) => {
                    log::error!("handler '{}' panicked", request_type);
                    Response::error(format!("internal error in '{}'", request_type))
                }
            };
        }

        let live = self.live.clone();
        let outcome = self.bridge.run_on_main_default(move || {
            let mut guard = live.lock().unwrap_or_else(|e| e.into_inner());
            handler(&params, &mut guard)
        });

        match outcome {
            RunOutcome::Completed(Ok(result)) => Response::success(result),
            RunOutcome::Completed(Err(err)) => {
                log::error!("handler '{}' failed: {}", request_type, err);
                Response::error(err.to_string())
            }
            RunOutcome::Timeout => {
                log::warn!("handler '{}' timed out waiting for the main thread", request_type);
                Response::error("Timeout waiting for operation to complete")
            }
            RunOutcome::ShuttingDown => {
                log::warn!("handler '{}' rejected: shutting down", request_type);
                Response::error("Bridge is shutting down")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ImmediateScheduler;
    use serde_json::json;
    use std::collections::HashMap;

    fn dispatcher() -> Dispatcher<ImmediateScheduler> {
        Dispatcher::new(
            Arc::new(ThreadBridge::new(Arc::new(ImmediateScheduler))),
            Arc::new(Mutex::new(LiveSet::new())),
        )
    }

    fn request(request_type: &str, params: serde_json::Value) -> Request {
        Request {
            request_type: request_type.to_string(),
            params: serde_json::from_value::<HashMap<String, serde_json::Value>>(params).unwrap(),
        }
    }

    #[test]
    fn dispatches_read_only_handler_directly() {
        let d = dispatcher();
        let resp = d.dispatch(&request("get_session_info", json!({})));
        assert_eq!(resp.status, "success");
        assert!(resp.result.unwrap()["tempo"].as_f64().is_some());
    }

    #[test]
    fn unknown_type_yields_error_response() {
        let d = dispatcher();
        let resp = d.dispatch(&request("not_a_command", json!({})));
        assert_eq!(resp.status, "error");
        assert_eq!(resp.message.unwrap(), "Unknown command: not_a_command");
    }

    #[test]
    fn mutating_handler_runs_through_bridge_and_persists() {
        let d = dispatcher();
        let resp = d.dispatch(&request("create_midi_track", json!({"index": -1})));
        assert_eq!(resp.status, "success");
        let resp = d.dispatch(&request("get_track_info", json!({"track_index": 0})));
        assert_eq!(resp.status, "success");
    }

    #[test]
    fn handler_error_surfaces_as_error_response() {
        let d = dispatcher();
        let resp = d.dispatch(&request("delete_track", json!({"track_index": 0})));
        assert_eq!(resp.status, "error");
        assert!(resp.message.unwrap().contains("out of range"));
    }

}
