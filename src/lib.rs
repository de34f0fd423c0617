// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Asynchronous structured logging and a general-purpose worker-thread pool.
//!
//! The crate bundles two cooperating subsystems that share one concurrency
//! idiom (work produced on many threads, consumed by a dedicated background
//! thread, dispatched to a sink or executor):
//!
//! - [`logging`] - a bounded-record logging pipeline: producers push fixed
//!   width records into a shared buffer, a watcher thread drains the buffer
//!   and hands batches to a [`logging::RecordSink`] (console or size-rotating
//!   file). Sink failures are captured into an error ledger instead of being
//!   propagated across the watcher boundary.
//! - [`pool`] - a type-erased [`pool::Task`] abstraction with a one-shot
//!   result future, a fixed-size [`pool::ThreadPool`] with pause/resume and
//!   live resize, and a dependency-tracking [`pool::TaskDag`].
//!
//! Both halves are plain OS-thread based; there is no async runtime.

pub mod logging;
pub mod pool;

pub use logging::{LogConfig, LogEngine, LogLevel, SinkKind};
pub use pool::{Task, TaskDag, TaskFuture, TaskValue, ThreadPool};
