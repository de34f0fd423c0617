// SPDX-License-Identifier: Apache-2.0 OR MIT
// Type-erased run-once unit of work with a one-shot result future

use std::any::{Any, TypeId};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::{self, Receiver};

/// Stable task identifier, allocated from a process-wide monotonic counter.
pub type TaskId = u32;

/// Identifier of a task that has never been submitted.
pub const UNASSIGNED_TASK_ID: TaskId = 0;

static NEXT_TASK_ID: AtomicU32 = AtomicU32::new(1);

/// Allocate the next task identifier. Counter wrap in a very long-lived
/// process would collide with identifier-keyed maps; treated as a bug, not
/// guarded.
pub fn next_task_id() -> TaskId {
    NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed)
}

/// Type-erased result of a task.
///
/// A `()`-returning callable erases to the empty value; anything else is
/// boxed and recovered with [`TaskValue::downcast`], which fails cleanly
/// when the expected type does not match the stored one.
pub struct TaskValue(Option<Box<dyn Any + Send>>);

impl TaskValue {
    pub fn empty() -> Self {
        Self(None)
    }

    pub fn of<T: Send + 'static>(value: T) -> Self {
        if TypeId::of::<T>() == TypeId::of::<()>() {
            return Self::empty();
        }
        Self(Some(Box::new(value)))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Recover the stored value. `None` if empty or if `T` is not the
    /// stored type.
    pub fn downcast<T: 'static>(self) -> Option<T> {
        self.0.and_then(|boxed| boxed.downcast::<T>().ok()).map(|boxed| *boxed)
    }
}

impl std::fmt::Debug for TaskValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "TaskValue(empty)")
        } else {
            write!(f, "TaskValue(..)")
        }
    }
}

/// One-shot future over a task's result. Becomes ready when the task runs;
/// consuming it with [`TaskFuture::wait`] yields the erased value exactly
/// once. An invalid future (already taken, or from an empty task) yields
/// the empty value.
pub struct TaskFuture {
    rx: Option<Receiver<TaskValue>>,
}

impl TaskFuture {
    pub fn invalid() -> Self {
        Self { rx: None }
    }

    pub fn is_valid(&self) -> bool {
        self.rx.is_some()
    }

    /// Block until the task has produced its value. Returns the empty value
    /// for an invalid future or a task that was dropped without running.
    pub fn wait(mut self) -> TaskValue {
        match self.rx.take() {
            Some(rx) => rx.recv().unwrap_or_else(|_| TaskValue::empty()),
            None => TaskValue::empty(),
        }
    }
}

/// A deferred unit of work: an owned `FnOnce` binding paired with the
/// sending half of its result channel, a fresh identifier per submission,
/// and a descriptive name.
///
/// Lifecycle: constructed empty, [`Task::submit`] installs a binding,
/// [`Task::run`] or a pool worker executes it exactly once, the future
/// becomes ready.
pub struct Task {
    job: Option<Box<dyn FnOnce() + Send>>,
    future: Option<TaskFuture>,
    id: TaskId,
    name: String,
}

impl Task {
    pub fn new() -> Self {
        Self {
            job: None,
            future: None,
            id: UNASSIGNED_TASK_ID,
            name: String::new(),
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn has_binding(&self) -> bool {
        self.job.is_some()
    }

    /// Bind a callable. Arguments are captured by the closure; both captures
    /// and the result must be `Send`. Re-submitting replaces the previous
    /// binding, future and identifier.
    pub fn submit<F, R>(&mut self, callable: F)
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        self.job = Some(Box::new(move || {
            let value = TaskValue::of(callable());
            let _ = tx.send(value);
        }));
        self.future = Some(TaskFuture { rx: Some(rx) });
        self.id = next_task_id();
    }

    /// Invoke the binding exactly once and hand back the erased result.
    /// Without a binding, or when the future was already taken, the empty
    /// value is returned.
    pub fn run(&mut self) -> TaskValue {
        let Some(job) = self.job.take() else {
            return TaskValue::empty();
        };
        job();
        match self.future.take() {
            Some(future) => future.wait(),
            None => TaskValue::empty(),
        }
    }

    /// Invoke the binding exactly once; the future becomes ready but is not
    /// consumed.
    pub fn run_and_forget(&mut self) {
        if let Some(job) = self.job.take() {
            job();
        }
    }

    /// Extract the binding as a zero-argument procedure equivalent to
    /// [`Task::run_and_forget`]. The pool queues these so task identity
    /// never leaks into the queue. A task whose binding was already taken
    /// yields a no-op.
    pub fn as_callable(&mut self) -> Box<dyn FnOnce() + Send> {
        let job = self.job.take();
        Box::new(move || {
            if let Some(job) = job {
                job();
            }
        })
    }

    /// Consume the future. A second take yields an invalid future.
    pub fn take_future(&mut self) -> TaskFuture {
        self.future.take().unwrap_or_else(TaskFuture::invalid)
    }
}

impl Default for Task {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("bound", &self.has_binding())
            .finish()
    }
}
