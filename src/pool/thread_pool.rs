// SPDX-License-Identifier: Apache-2.0 OR MIT
// Fixed-size worker pool over a FIFO task queue

use super::task::{Task, TaskFuture, TaskId};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

type QueuedJob = (Box<dyn FnOnce() + Send>, TaskId);

/// State shared between the pool handle and its workers.
struct PoolShared {
    /// FIFO of extracted task callables and their ids. Pop is guarded by
    /// this lock; execution happens outside it.
    queue: Mutex<VecDeque<QueuedJob>>,
    /// Tasks queued plus tasks currently running.
    outstanding: AtomicU64,
    /// Workers keep looping while true.
    running: AtomicBool,
    /// While true, workers stop popping; in-flight work continues.
    paused: AtomicBool,
    /// Idle nap in microseconds; zero means cooperative yield.
    idle_sleep_us: AtomicU32,
}

impl PoolShared {
    fn pop(&self) -> Option<QueuedJob> {
        if self.paused.load(Ordering::Acquire) {
            return None;
        }
        let mut queue = self.queue.lock().unwrap();
        if self.paused.load(Ordering::Acquire) {
            return None;
        }
        queue.pop_front()
    }

    fn sleep_or_yield(&self) {
        let nap = self.idle_sleep_us.load(Ordering::Relaxed);
        if nap > 0 {
            std::thread::sleep(Duration::from_micros(nap as u64));
        } else {
            std::thread::yield_now();
        }
    }
}

fn worker_loop(shared: Arc<PoolShared>) {
    while shared.running.load(Ordering::Acquire) {
        if let Some((job, task_id)) = shared.pop() {
            crate::log_dbg!(
                "task {} picked up by worker {:?}",
                task_id,
                std::thread::current().id()
            );
            job();
            shared.outstanding.fetch_sub(1, Ordering::AcqRel);
        } else {
            shared.sleep_or_yield();
        }
    }
}

/// Executes submitted tasks on a fixed set of worker threads.
///
/// Submissions are popped in FIFO order; completion order depends on task
/// duration. The pool supports pause/resume, a live [`ThreadPool::reset`] to
/// a new size, and waits for all outstanding work on drop. There is no
/// cancellation: submitted work runs to completion.
pub struct ThreadPool {
    shared: Arc<PoolShared>,
    workers: Vec<JoinHandle<()>>,
    pool_size: u32,
}

impl ThreadPool {
    /// Pool sized to the machine's hardware concurrency.
    pub fn new() -> Self {
        let default_size = std::thread::available_parallelism()
            .map(|n| n.get() as u32)
            .unwrap_or(1);
        Self::with_size(default_size)
    }

    /// Pool with exactly `pool_size` workers; at least one is required.
    pub fn with_size(pool_size: u32) -> Self {
        assert!(pool_size >= 1, "thread pool size must be at least 1");
        let shared = Arc::new(PoolShared {
            queue: Mutex::new(VecDeque::new()),
            outstanding: AtomicU64::new(0),
            running: AtomicBool::new(true),
            paused: AtomicBool::new(false),
            idle_sleep_us: AtomicU32::new(0),
        });
        let workers = Self::spawn_workers(&shared, pool_size);
        Self {
            shared,
            workers,
            pool_size,
        }
    }

    fn spawn_workers(shared: &Arc<PoolShared>, count: u32) -> Vec<JoinHandle<()>> {
        (0..count)
            .map(|idx| {
                let shared = Arc::clone(shared);
                std::thread::Builder::new()
                    .name(format!("pool-worker-{idx}"))
                    .spawn(move || worker_loop(shared))
                    .expect("failed to spawn pool worker")
            })
            .collect()
    }

    /// Wrap `callable` in a task, enqueue it, and hand back the future for
    /// its result. Thread-safe for any number of producers.
    pub fn submit<F, R>(&self, callable: F) -> TaskFuture
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let mut task = Task::new();
        task.submit(callable);
        let future = task.take_future();
        let job = task.as_callable();
        let task_id = task.id();

        let mut queue = self.shared.queue.lock().unwrap();
        queue.push_back((job, task_id));
        self.shared.outstanding.fetch_add(1, Ordering::AcqRel);
        drop(queue);

        future
    }

    /// Stop workers from popping new work; tasks already popped run to
    /// completion.
    pub fn pause(&self) {
        self.shared.paused.store(true, Ordering::Release);
    }

    pub fn resume(&self) {
        self.shared.paused.store(false, Ordering::Release);
    }

    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::Acquire)
    }

    /// Tasks waiting in the queue.
    pub fn queued_count(&self) -> u64 {
        self.shared.queue.lock().unwrap().len() as u64
    }

    /// Tasks queued plus tasks currently running.
    pub fn outstanding_count(&self) -> u64 {
        self.shared.outstanding.load(Ordering::Acquire)
    }

    /// Tasks currently executing on a worker.
    pub fn running_count(&self) -> u64 {
        self.outstanding_count().saturating_sub(self.queued_count())
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> u32 {
        self.pool_size
    }

    /// Nap duration for idle workers; zero restores the cooperative yield.
    pub fn set_idle_sleep(&self, micros: u32) {
        self.shared.idle_sleep_us.store(micros, Ordering::Relaxed);
    }

    /// Spin-and-yield until all outstanding work has finished. While paused,
    /// only in-flight tasks are waited for; queued work stays queued.
    pub fn wait_for_completion(&self) {
        loop {
            let done = if self.is_paused() {
                self.running_count() == 0
            } else {
                self.outstanding_count() == 0
            };
            if done {
                break;
            }
            self.shared.sleep_or_yield();
        }
    }

    /// Drain, tear all workers down, and respawn with `new_size` threads.
    /// The pause flag is preserved across the reset.
    pub fn reset(&mut self, new_size: u32) {
        assert!(new_size >= 1, "thread pool size must be at least 1");

        self.wait_for_completion();
        let was_paused = self.is_paused();

        self.shared.paused.store(true, Ordering::Release);
        self.shared.running.store(false, Ordering::Release);
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }

        self.pool_size = new_size;
        self.shared.running.store(true, Ordering::Release);
        self.workers = Self::spawn_workers(&self.shared, new_size);
        self.shared.paused.store(was_paused, Ordering::Release);
    }
}

impl Default for ThreadPool {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.wait_for_completion();
        self.shared.running.store(false, Ordering::Release);
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}
