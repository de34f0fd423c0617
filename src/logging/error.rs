// SPDX-License-Identifier: Apache-2.0 OR MIT
// Sink error values and the thread-safe exception ledger

use super::clock::{current_thread_id, Clock};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Failures raised while a sink writes a batch or services a file helper.
/// These are captured into the owning sink's [`ErrorLedger`], never thrown
/// across the watcher boundary.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("WRITING_ERROR : [{thread_id}]: to console for record [{record}]")]
    ConsoleStream { thread_id: u64, record: String },

    #[error("file [{path}] neither exists nor can be created: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("WRITING_ERROR : [{thread_id}]: file [{path}] can not be opened to write log data: {source}")]
    Open {
        path: PathBuf,
        thread_id: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("file limit exceeds but [{path}] can not be renamed to [{rotated}]: {source}")]
    Rotate {
        path: PathBuf,
        rotated: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("WRITING_ERROR : [{thread_id}]: write to file [{path}] failed: {source}")]
    Write {
        path: PathBuf,
        thread_id: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("file [{path}] empty to read")]
    EmptyFile { path: PathBuf },

    #[error("out of bound: {detail}")]
    OutOfBounds { detail: String },

    #[error("file [{path}] can't be read: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration problems caught while constructing a [`super::LogEngine`].
#[derive(Debug, Error)]
pub enum InitError {
    #[error("file logging requested but no log file name configured")]
    MissingFileName,

    #[error("log file path [{0}] does not exist or is not a directory")]
    BadPath(String),

    #[error("logging engine is already initialized")]
    AlreadyInitialized,
}

/// Name of the file the ledger is drained into at engine teardown, created
/// in the current working directory.
pub const EXCEPTIONS_FILE: &str = "LoggingExceptionsList.txt";

const FIELD_SEP: &str = "|";
const LEDGER_TIME_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Accumulates sink failures over a sink's lifetime. Shared between the
/// watcher-spawned writer and any caller-initiated file helpers.
pub struct ErrorLedger {
    errors: Mutex<Vec<SinkError>>,
}

impl ErrorLedger {
    pub fn new() -> Self {
        Self {
            errors: Mutex::new(Vec::new()),
        }
    }

    /// Capture one failure.
    pub fn record(&self, error: SinkError) {
        self.errors.lock().unwrap().push(error);
    }

    pub fn len(&self) -> usize {
        self.errors.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read-only view of the captured failures, rendered as messages.
    pub fn snapshot(&self) -> Vec<String> {
        self.errors
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.to_string())
            .collect()
    }

    /// Serialize the ledger to [`EXCEPTIONS_FILE`] in the current working
    /// directory, one timestamped line per captured failure, append mode.
    pub fn drain_to_file(&self) {
        let Ok(cwd) = std::env::current_dir() else {
            return;
        };
        self.drain_to(&cwd);
    }

    /// Same as [`Self::drain_to_file`] but into an explicit directory.
    pub fn drain_to(&self, directory: &Path) {
        let mut errors = self.errors.lock().unwrap();
        if errors.is_empty() {
            return;
        }

        let path = directory.join(EXCEPTIONS_FILE);
        let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&path) else {
            return;
        };

        let clock = Clock::with_format(LEDGER_TIME_FORMAT);
        let tid = current_thread_id();
        for error in errors.drain(..) {
            let _ = writeln!(
                file,
                "{sep}{time}{sep}{tid}{sep}>> {msg}",
                sep = FIELD_SEP,
                time = clock.local_time_str(""),
                tid = tid,
                msg = error,
            );
        }
    }
}

impl Default for ErrorLedger {
    fn default() -> Self {
        Self::new()
    }
}
