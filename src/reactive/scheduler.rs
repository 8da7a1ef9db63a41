//! Deferred execution after the current synchronous batch

use super::lock;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

type Task = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct SchedulerState {
    depth: usize,
    queue: VecDeque<Task>,
}

/// Runs deferred tasks once the outermost batch completes
///
/// A batch is any call wrapped in [`Scheduler::run`]; batches nest. Work passed
/// to [`Scheduler::defer`] inside a batch is queued and executed, in order,
/// right after the outermost batch returns. Outside a batch it runs at once.
///
/// ```text
/// run ─┬─ listener ── defer(fix_page) ──┐
///      └─ listener ── emit(render)      │
///   (batch ends) ◀──────────────────────┘ fix_page()
/// ```
#[derive(Clone, Default)]
pub struct Scheduler {
    state: Arc<Mutex<SchedulerState>>,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("Scheduler")
            .field("depth", &state.depth)
            .field("pending", &state.queue.len())
            .finish()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute `f` as a batch, then drain deferred tasks if this is the outermost batch
    ///
    /// If `f` panics the batch is still closed, but queued tasks wait for the
    /// next batch to finish.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        lock(&self.state).depth += 1;
        let _batch = Batch { scheduler: self };
        f()
    }

    /// Queue `task` until the current batch completes
    pub fn defer(&self, task: impl FnOnce() + Send + 'static) {
        {
            let mut state = lock(&self.state);
            if state.depth > 0 {
                state.queue.push_back(Box::new(task));
                return;
            }
        }
        self.run(task);
    }

    /// Whether a batch is currently executing
    pub fn is_running(&self) -> bool {
        lock(&self.state).depth > 0
    }

    /// Number of queued tasks
    pub fn pending(&self) -> usize {
        lock(&self.state).queue.len()
    }

    fn leave(&self) -> usize {
        let mut state = lock(&self.state);
        state.depth = state.depth.saturating_sub(1);
        state.depth
    }

    fn exit(&self) {
        if self.leave() > 0 {
            return;
        }
        let task = lock(&self.state).queue.pop_front();
        // Each task is a batch of its own, so what it defers runs after it
        // and the rest of the queue drains when it exits
        if let Some(task) = task {
            self.run(task);
        }
    }
}

/// Closes a batch, on unwind too
struct Batch<'a> {
    scheduler: &'a Scheduler,
}

impl Drop for Batch<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.scheduler.leave();
        } else {
            self.scheduler.exit();
        }
    }
}
