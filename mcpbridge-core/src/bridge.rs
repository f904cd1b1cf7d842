//! The Thread Bridge (§4.3): a blocking "run this on the main thread
//! and give me the result" call for I/O workers.
//!
//! The blocking wait is a poll loop in small slices rather than a
//! single `recv_timeout`, so a Host Boundary shutdown can interrupt an
//! in-flight wait promptly instead of making every caller ride out its
//! full budget — the same polling-with-short-slices shape the
//! reference workspace uses for its own bounded external-process wait
//! (`dispatch::server::compile_synthdef`).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::FacadeError;
use crate::scheduler::{Job, MainThreadScheduler};

/// Calibration constant from the reference implementation (§4.3).
pub const T_DEFAULT: Duration = Duration::from_secs(10);

const POLL_SLICE: Duration = Duration::from_millis(100);

/// Outcome of one `run_on_main` call, already split into the three
/// shapes the Command Dispatcher needs to turn into a wire response.
pub enum RunOutcome<T> {
    /// `fn` ran to completion (on the main thread or inline); carries
    /// its own success/failure.
    Completed(Result<T, FacadeError>),
    /// `fn` did not complete within budget. Its effect, if any, is not
    /// rolled back (§5, §7).
    Timeout,
    /// The Host Boundary is tearing down.
    ShuttingDown,
}

pub struct ThreadBridge<S: MainThreadScheduler> {
    scheduler: Arc<S>,
    shutting_down: Arc<AtomicBool>,
}

impl<S: MainThreadScheduler> ThreadBridge<S> {
    pub fn new(scheduler: Arc<S>) -> Self {
        Self {
            scheduler,
            shutting_down: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flip the shutdown flag; pending and future `run_on_main` calls
    /// observe `ShuttingDown` instead of waiting out their budget.
    pub fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
    }

    /// Run `f` on the main thread and wait up to `timeout` for its
    /// result (§4.3). If already on the main thread, `f` runs inline
    /// and this never blocks.
    pub fn run_on_main<F, T>(&self, f: F, timeout: Duration) -> RunOutcome<T>
    where
        F: FnOnce() -> Result<T, FacadeError> + Send + 'static,
        T: Send + 'static,
    {
        if self.scheduler.is_on_main_thread() {
            return RunOutcome::Completed(f());
        }

        if self.shutting_down.load(Ordering::SeqCst) {
            return RunOutcome::ShuttingDown;
        }

        let (tx, rx) = mpsc::channel::<Result<T, FacadeError>>();
        let job: Job = Box::new(move || {
            let _ = tx.send(f());
        });

        if self.scheduler.schedule(job).is_err() {
            // Scheduling itself failed (host refusing, e.g. mid-teardown);
            // the caller sees this the same way it sees a timeout (§4.2).
            return RunOutcome::Timeout;
        }

        let deadline = Instant::now() + timeout;
        loop {
            if self.shutting_down.load(Ordering::SeqCst) {
                return RunOutcome::ShuttingDown;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return RunOutcome::Timeout;
            }
            match rx.recv_timeout(remaining.min(POLL_SLICE)) {
                Ok(result) => return RunOutcome::Completed(result),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return RunOutcome::Timeout,
            }
        }
    }

    /// Convenience wrapper using [`T_DEFAULT`].
    pub fn run_on_main_default<F, T>(&self, f: F) -> RunOutcome<T>
    where
        F: FnOnce() -> Result<T, FacadeError> + Send + 'static,
        T: Send + 'static,
    {
        self.run_on_main(f, T_DEFAULT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{ImmediateScheduler, StalledScheduler};

    #[test]
    fn inline_execution_on_main_thread() {
        let bridge = ThreadBridge::new(Arc::new(ImmediateScheduler));
        let outcome = bridge.run_on_main(|| Ok::<_, FacadeError>(42), Duration::from_millis(50));
        match outcome {
            RunOutcome::Completed(Ok(v)) => assert_eq!(v, 42),
            _ => panic!("expected inline completion"),
        }
    }

    #[test]
    fn stalled_scheduler_times_out() {
        let bridge = ThreadBridge::new(Arc::new(StalledScheduler));
        let start = Instant::now();
        let outcome = bridge.run_on_main(|| Ok::<_, FacadeError>(1), Duration::from_millis(250));
        assert!(matches!(outcome, RunOutcome::Timeout));
        assert!(start.elapsed() >= Duration::from_millis(250));
    }

    #[test]
    fn shutdown_short_circuits_pending_wait() {
        let bridge = Arc::new(ThreadBridge::new(Arc::new(StalledScheduler)));
        let b2 = bridge.clone();
        let handle = std::thread::spawn(move || {
            b2.run_on_main(|| Ok::<_, FacadeError>(1), Duration::from_secs(5))
        });
        std::thread::sleep(Duration::from_millis(150));
        bridge.shutdown();
        let outcome = handle.join().unwrap();
        assert!(matches!(outcome, RunOutcome::ShuttingDown));
    }
}
