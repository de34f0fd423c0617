//! Integration Tests
//!
//! This file makes the integration test modules in the `integration/`
//! directory discoverable by cargo. Without it, tests in subdirectories are
//! not compiled or run.

#[path = "integration/logging_pipeline.rs"]
mod logging_pipeline; // end-to-end producer -> buffer -> watcher -> sink flows

#[path = "integration/file_rotation.rs"]
mod file_rotation; // file sink rotation policy and exception capture

#[path = "integration/pool.rs"]
mod pool; // thread pool scenarios and clock ownership
