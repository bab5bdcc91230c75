//! Task Schedulers
//!
//! Implementations of the [`Scheduler`] port.
//!
//! - [`TokioScheduler`] spawns each task on the ambient tokio runtime and
//!   tracks it, so a service can drain outstanding work on shutdown.
//! - [`QueuedScheduler`] only queues; the owner decides when queued work
//!   runs. Tests use it to drive delayed deletes deterministically.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio_util::task::TaskTracker;
use tracing::debug;

use crate::domain::ports::{Scheduler, Task};
use crate::error::{Error, Result};

// =============================================================================
// Tokio Scheduler
// =============================================================================

/// Fire-and-forget scheduler backed by the current tokio runtime
///
/// Clones share the same set of tracked tasks.
#[derive(Debug, Clone, Default)]
pub struct TokioScheduler {
    tracker: TaskTracker,
}

impl TokioScheduler {
    /// Create a new scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of spawned tasks that have not finished yet
    pub fn len(&self) -> usize {
        self.tracker.len()
    }

    /// Check if no task is outstanding
    pub fn is_empty(&self) -> bool {
        self.tracker.is_empty()
    }

    /// Stop accepting tasks. Returns false if already closed.
    pub fn close(&self) -> bool {
        self.tracker.close()
    }

    /// Check if the scheduler has been closed
    pub fn is_closed(&self) -> bool {
        self.tracker.is_closed()
    }

    /// Wait for every outstanding task. Only returns once the scheduler
    /// has been closed.
    pub async fn wait(&self) {
        self.tracker.wait().await;
    }

    /// Close the scheduler and wait for every outstanding task
    pub async fn shutdown(&self) {
        self.tracker.close();
        debug!(outstanding = self.tracker.len(), "Draining scheduled tasks");
        self.wait().await;
    }
}

impl Scheduler for TokioScheduler {
    fn submit(&self, task: Task) -> Result<()> {
        if self.tracker.is_closed() {
            return Err(Error::Scheduler("scheduler is closed".to_string()));
        }

        let handle = Handle::try_current()
            .map_err(|e| Error::Scheduler(format!("no tokio runtime: {}", e)))?;

        self.tracker.spawn_on(task, &handle);
        Ok(())
    }
}

// =============================================================================
// Queued Scheduler
// =============================================================================

/// Scheduler that holds tasks until [`QueuedScheduler::run_pending`] is called
#[derive(Default)]
pub struct QueuedScheduler {
    queue: Mutex<VecDeque<Task>>,
    closed: AtomicBool,
}

impl std::fmt::Debug for QueuedScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuedScheduler")
            .field("pending", &self.pending())
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish()
    }
}

impl QueuedScheduler {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued tasks
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Reject every later submission
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Run queued tasks in submission order until the queue is empty.
    ///
    /// Tasks submitted while draining are run too. Returns how many ran.
    pub async fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            // the guard must not be held across the await
            let next = self.queue.lock().pop_front();
            match next {
                Some(task) => {
                    task.await;
                    ran += 1;
                }
                None => return ran,
            }
        }
    }
}

impl Scheduler for QueuedScheduler {
    fn submit(&self, task: Task) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Scheduler("scheduler is closed".to_string()));
        }
        self.queue.lock().push_back(task);
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
