// ============================================================================
// Timer Facilities
// One-shot schedulers for ack and parent timeouts
// ============================================================================

use crate::interfaces::{Scheduler, TimerTask};
use crossbeam::channel::{self, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::thread;
use std::time::{Duration, Instant};

/// Heap entry ordered so the earliest deadline pops first; ties keep
/// scheduling order.
struct Scheduled<T> {
    deadline: T,
    seq: u64,
    task: TimerTask,
}

impl<T: Ord> PartialEq for Scheduled<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T: Ord> Eq for Scheduled<T> {}

impl<T: Ord> PartialOrd for Scheduled<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Ord> Ord for Scheduled<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

// ============================================================================
// Thread Timer
// ============================================================================

/// Scheduler backed by one dedicated thread.
///
/// Tasks are handed over a crossbeam channel and kept in a deadline heap.
/// They run on the timer thread, so a slow task delays the ones behind it.
/// Dropping the timer stops the thread; tasks still pending are discarded.
pub struct ThreadTimer {
    sender: Sender<(Instant, TimerTask)>,
}

impl ThreadTimer {
    /// Spawn the timer thread
    ///
    /// Fails when the OS refuses a new thread; a timer without its thread
    /// would accept tasks and never run them.
    pub fn new() -> std::io::Result<Self> {
        let (sender, receiver) = channel::unbounded::<(Instant, TimerTask)>();

        thread::Builder::new()
            .name("flat-timer".to_string())
            .spawn(move || {
                let mut heap: BinaryHeap<Scheduled<Instant>> = BinaryHeap::new();
                let mut seq = 0u64;

                loop {
                    let now = Instant::now();
                    while heap.peek().is_some_and(|next| next.deadline <= now) {
                        if let Some(due) = heap.pop() {
                            (due.task)();
                        }
                    }

                    let received = match heap.peek() {
                        Some(next) => {
                            receiver.recv_timeout(next.deadline.saturating_duration_since(Instant::now()))
                        },
                        None => receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
                    };

                    match received {
                        Ok((deadline, task)) => {
                            heap.push(Scheduled { deadline, seq, task });
                            seq += 1;
                        },
                        Err(RecvTimeoutError::Timeout) => {},
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }

                tracing::debug!("Timer thread stopped with {} pending tasks", heap.len());
            })?;

        Ok(Self { sender })
    }
}

impl Scheduler for ThreadTimer {
    fn schedule(&self, delay: Duration, task: TimerTask) {
        if self.sender.send((Instant::now() + delay, task)).is_err() {
            tracing::warn!("Timer thread gone, dropping task due in {:?}", delay);
        }
    }
}

// ============================================================================
// Manual Scheduler
// ============================================================================

struct ManualState {
    now: Duration,
    seq: u64,
    heap: BinaryHeap<Scheduled<Duration>>,
}

/// Deterministic scheduler driven by `advance`.
///
/// Time only moves when the owner says so, which makes timeout paths
/// reproducible in tests and simulations.
pub struct ManualScheduler {
    state: Mutex<ManualState>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ManualState {
                now: Duration::ZERO,
                seq: 0,
                heap: BinaryHeap::new(),
            }),
        }
    }

    /// Time elapsed since creation
    pub fn elapsed(&self) -> Duration {
        self.state.lock().now
    }

    /// Number of tasks not yet fired
    pub fn pending(&self) -> usize {
        self.state.lock().heap.len()
    }

    /// Move the clock forward and run every task that became due, earliest
    /// first. Returns how many ran. While a task runs the clock reads its
    /// deadline, so work it schedules within the window fires in the same
    /// call.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.state.lock().now + by;

        let mut fired = 0;
        loop {
            let due = {
                let mut state = self.state.lock();
                match state.heap.peek().map(|next| next.deadline) {
                    Some(deadline) if deadline <= target => {
                        state.now = state.now.max(deadline);
                        state.heap.pop()
                    },
                    _ => None,
                }
            };

            // Lock released: tasks may schedule more work
            match due {
                Some(due) => {
                    (due.task)();
                    fired += 1;
                },
                None => break,
            }
        }

        self.state.lock().now = target;
        fired
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: TimerTask) {
        let mut state = self.state.lock();
        let deadline = state.now + delay;
        let seq = state.seq;
        state.seq += 1;
        state.heap.push(Scheduled { deadline, seq, task });
    }
}

// ============================================================================
// Tokio Scheduler
// ============================================================================

/// Scheduler on a tokio runtime. Tasks run on the blocking pool after the
/// delay elapses.
#[cfg(feature = "async")]
pub struct TokioScheduler {
    handle: tokio::runtime::Handle,
}

#[cfg(feature = "async")]
impl TokioScheduler {
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Use the runtime of the calling context. Panics outside a runtime.
    pub fn current() -> Self {
        Self::new(tokio::runtime::Handle::current())
    }
}

#[cfg(feature = "async")]
impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: TimerTask) {
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = tokio::task::spawn_blocking(task).await {
                tracing::error!("Timer task failed: {}", e);
            }
        });
    }
}
