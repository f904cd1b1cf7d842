//! Production [`MainThreadScheduler`] (§4.2): a FIFO job queue drained
//! by whichever thread the Host Boundary designates as "the main
//! thread" — standing in for the host's real "run this after N ticks"
//! hook, which this crate has no DAW process to bind to.
//!
//! Grounded on the reference workspace's own tick-loop shape
//! (`imbolc-ui/src/network.rs`'s `run_server` drains queued work once
//! per loop iteration rather than dispatching inline), generalized
//! here into a reusable queue instead of one bespoke loop body.

use std::collections::VecDeque;
use std::sync::{Mutex, OnceLock};
use std::thread::ThreadId;

use mcpbridge_core::scheduler::{Job, MainThreadScheduler, ScheduleRejected};

/// A FIFO queue of main-thread jobs plus a latch recording which
/// thread is "the main thread". Submission order from a single
/// submitter is preserved because the queue is a plain `VecDeque` and
/// every push is `push_back` / every drain is `pop_front` (§4.2's
/// ordering guarantee).
pub struct TickScheduler {
    queue: Mutex<VecDeque<Job>>,
    main_thread: OnceLock<ThreadId>,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            main_thread: OnceLock::new(),
        }
    }

    /// Call once, from the thread that will drive [`TickScheduler::run_pending`].
    /// Idempotent after the first call from a given thread; calling it
    /// again from a different thread is a programming error the host
    /// adapter does not try to detect.
    pub fn mark_current_thread_as_main(&self) {
        let _ = self.main_thread.set(std::thread::current().id());
    }

    /// Run every job currently queued, in submission order. Meant to
    /// be called once per host "tick" from the main thread. A job that
    /// panics is caught so one bad handler can't wedge the tick loop;
    /// its rendezvous sender is simply dropped, which the waiting
    /// `ThreadBridge` call observes as a timeout.
    pub fn run_pending(&self) {
        loop {
            let job = {
                let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
                queue.pop_front()
            };
            match job {
                Some(job) => {
                    if std::panic::catch_unwind(std::panic::AssertUnwindSafe(job)).is_err() {
                        log::error!("main-thread job panicked; its caller will see a timeout");
                    }
                }
                None => break,
            }
        }
    }

    pub fn pending_count(&self) -> usize {
        self.queue.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl MainThreadScheduler for TickScheduler {
    fn schedule(&self, job: Job) -> Result<(), ScheduleRejected> {
        let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        queue.push_back(job);
        Ok(())
    }

    fn is_on_main_thread(&self) -> bool {
        self.main_thread.get() == Some(&std::thread::current().id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn jobs_run_in_submission_order() {
        let scheduler = TickScheduler::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..5 {
            let order = order.clone();
            scheduler.schedule(Box::new(move || order.lock().unwrap().push(i))).unwrap();
        }
        scheduler.run_pending();
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn is_on_main_thread_only_true_on_marked_thread() {
        let scheduler = Arc::new(TickScheduler::new());
        assert!(!scheduler.is_on_main_thread());
        scheduler.mark_current_thread_as_main();
        assert!(scheduler.is_on_main_thread());

        let s2 = scheduler.clone();
        let from_other_thread = std::thread::spawn(move || s2.is_on_main_thread())
            .join()
            .unwrap();
        assert!(!from_other_thread);
    }

    #[test]
    fn a_panicking_job_does_not_stop_later_jobs() {
        let scheduler = TickScheduler::new();
        let ran = Arc::new(AtomicUsize::new(0));
        scheduler.schedule(Box::new(|| panic!("boom"))).unwrap();
        let flag = ran.clone();
        scheduler.schedule(Box::new(move || { flag.fetch_add(1, Ordering::SeqCst); })).unwrap();
        scheduler.run_pending();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }
}
