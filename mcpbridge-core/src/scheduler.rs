//! Main-Thread Scheduler Adapter (§4.2).
//!
//! Thin trait over whatever "run this on the main thread at the next
//! tick" primitive the host exposes. The Thread Bridge is the only
//! caller; handlers never see this directly.

use std::fmt;

/// A unit of work the scheduler will run on the main thread.
pub type Job = Box<dyn FnOnce() + Send>;

#[derive(Debug)]
pub struct ScheduleRejected;

impl fmt::Display for ScheduleRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scheduler refused the job")
    }
}

impl std::error::Error for ScheduleRejected {}

/// Host binding for "run this later on the main thread" (§4.2).
///
/// Implementations must preserve submission order for jobs from the
/// same submitter; the Thread Bridge relies on that for its
/// per-connection FIFO guarantee (§5).
pub trait MainThreadScheduler: Send + Sync {
    fn schedule(&self, job: Job) -> Result<(), ScheduleRejected>;
    fn is_on_main_thread(&self) -> bool;
}

/// Test double: runs every job inline, as if already on the main
/// thread. Useful for handler unit tests that don't need to exercise
/// the Thread Bridge's hop at all.
pub struct ImmediateScheduler;

impl MainThreadScheduler for ImmediateScheduler {
    fn schedule(&self, job: Job) -> Result<(), ScheduleRejected> {
        job();
        Ok(())
    }

    fn is_on_main_thread(&self) -> bool {
        true
    }
}

/// Test double: accepts every job but never runs it, simulating a
/// wedged main thread (§8 scenario 5). The Thread Bridge's caller
/// should observe a timeout, never a hang.
#[derive(Default)]
pub struct StalledScheduler;

impl MainThreadScheduler for StalledScheduler {
    fn schedule(&self, job: Job) -> Result<(), ScheduleRejected> {
        // Intentionally never runs `job` — that's the point of this double.
        let _ = job;
        Ok(())
    }

    fn is_on_main_thread(&self) -> bool {
        false
    }
}
