// ============================================================================
// Scheduler Interface
// ============================================================================

use std::time::Duration;

/// One-shot deferred action
pub type TimerTask = Box<dyn FnOnce() + Send>;

/// Runs a task once after a delay, on a thread other than the caller's.
/// Tasks are never canceled; their handlers must tolerate firing late.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration, task: TimerTask);
}
