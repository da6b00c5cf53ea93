//! Execution lanes for index tasks.
//!
//! Two lanes with distinct guarantees:
//!
//! - **administrative**: flush, truncate, invalidate and metadata-reload
//!   tasks run inline on the calling thread and the caller blocks until
//!   they finish. Several of these must complete inside a larger
//!   flush/compaction protocol's critical section, so deferring them risks
//!   a cross-component deadlock.
//! - **build**: initial index builds are queued onto a dedicated
//!   single-worker thread, at most one running at a time system-wide, and
//!   the caller gets a [`TaskHandle`] it must not block the schema path on.
//!   Bounding builds to one worker keeps simultaneous rebuilds from
//!   starving the compaction path.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use crate::error::{IndexError, Result};
use crate::index::IndexTask;

/// Completion handle for work submitted to the build lane.
///
/// `ready()` handles resolve immediately; queued handles resolve when the
/// worker finishes the task. Waiting is not cancellable: a hung task hangs
/// the waiter.
pub struct TaskHandle {
    rx: Option<Receiver<Result<()>>>,
}

impl std::fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("pending", &self.rx.is_some())
            .finish()
    }
}

impl TaskHandle {
    /// An immediately-resolved handle, for operations with no deferred work.
    pub fn ready() -> Self {
        Self { rx: None }
    }

    pub(crate) fn pending(rx: Receiver<Result<()>>) -> Self {
        Self { rx: Some(rx) }
    }

    /// Blocks until the task completes and returns its outcome.
    pub fn wait(self) -> Result<()> {
        match self.rx {
            None => Ok(()),
            Some(rx) => match rx.recv() {
                Ok(result) => result,
                Err(_) => Err(IndexError::WorkerUnavailable),
            },
        }
    }
}

struct Job {
    task: IndexTask,
    done: Sender<Result<()>>,
}

/// The single-worker FIFO build lane.
///
/// Tasks run in submission order on one dedicated thread. The worker stops
/// when the executor is dropped; handles for tasks it never ran resolve to
/// [`IndexError::WorkerUnavailable`].
pub struct SerialExecutor {
    tx: Sender<Job>,
}

impl SerialExecutor {
    /// Spawns the worker thread under the given name.
    pub fn new(thread_name: &str) -> Self {
        let (tx, rx) = mpsc::channel::<Job>();
        let name = thread_name.to_string();
        thread::Builder::new()
            .name(name)
            .spawn(move || run_worker(rx))
            .expect("failed to spawn index build worker");
        Self { tx }
    }

    /// Queues a task; returns a handle resolving to its outcome.
    pub fn submit(&self, task: IndexTask) -> TaskHandle {
        let (done_tx, done_rx) = mpsc::channel();
        let job = Job {
            task,
            done: done_tx,
        };
        // A failed send drops the job (and its sender), which surfaces as
        // WorkerUnavailable when the handle is waited on.
        let _ = self.tx.send(job);
        TaskHandle::pending(done_rx)
    }
}

fn run_worker(rx: Receiver<Job>) {
    while let Ok(job) = rx.recv() {
        let Job { task, done } = job;
        let outcome = match catch_unwind(AssertUnwindSafe(move || task())) {
            Ok(result) => result,
            Err(_) => Err(IndexError::build_failed("<worker>", "build task panicked")),
        };
        // Receiver may be gone (fire-and-forget submission); that's fine.
        let _ = done.send(outcome);
    }
}

/// The administrative lane: runs a task inline, caller blocks until done.
/// Absent tasks are a successful no-op.
pub fn execute_blocking(task: Option<IndexTask>) -> Result<()> {
    match task {
        None => Ok(()),
        Some(task) => task(),
    }
}
