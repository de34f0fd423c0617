// SPDX-License-Identifier: Apache-2.0 OR MIT
// Sink contract and the console sink

use super::clock::current_thread_id;
use super::error::{ErrorLedger, SinkError};
use super::record::Record;
use std::collections::VecDeque;
use std::io::Write;
use std::sync::{Arc, Mutex};

/// A sequence of records moved out of the buffer in one drain operation.
pub type Batch = VecDeque<Record>;

/// Consumer of record batches.
///
/// Implementations serialize concurrent `write_batch` calls on a sink-local
/// mutex so only one batch is in flight at a time, and report failure as an
/// error value rather than panicking across the watcher boundary.
pub trait RecordSink: Send + Sync {
    /// Write one drained batch to the underlying medium.
    fn write_batch(&self, batch: Batch) -> Result<(), SinkError>;

    /// The ledger this sink captures failures into.
    fn ledger(&self) -> Arc<ErrorLedger>;
}

/// Rendering of unsigned integers as fixed-width binary text: one character
/// per bit, most significant bit first.
pub trait BitText {
    fn bit_text(&self) -> String;
}

impl BitText for u8 {
    fn bit_text(&self) -> String {
        format!("{self:08b}")
    }
}

impl BitText for u16 {
    fn bit_text(&self) -> String {
        format!("{self:016b}")
    }
}

impl BitText for u32 {
    fn bit_text(&self) -> String {
        format!("{self:032b}")
    }
}

impl BitText for u64 {
    fn bit_text(&self) -> String {
        format!("{self:064b}")
    }
}

enum ConsoleTarget {
    Stdout,
    /// Captures lines for assertions instead of touching stdout.
    Memory(Arc<Mutex<Vec<String>>>),
}

/// Writes each record's text followed by a newline to standard output,
/// flushing after every record. A test-mode instance swaps the stream for an
/// in-memory buffer.
pub struct ConsoleSink {
    write_lock: Mutex<()>,
    target: ConsoleTarget,
    ledger: Arc<ErrorLedger>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            write_lock: Mutex::new(()),
            target: ConsoleTarget::Stdout,
            ledger: Arc::new(ErrorLedger::new()),
        }
    }

    /// Test-mode console: records land in an in-memory line buffer readable
    /// through [`Self::captured`].
    pub fn test() -> Self {
        Self {
            write_lock: Mutex::new(()),
            target: ConsoleTarget::Memory(Arc::new(Mutex::new(Vec::new()))),
            ledger: Arc::new(ErrorLedger::new()),
        }
    }

    /// Lines written so far in test mode; empty for a real console.
    pub fn captured(&self) -> Vec<String> {
        match &self.target {
            ConsoleTarget::Memory(lines) => lines.lock().unwrap().clone(),
            ConsoleTarget::Stdout => Vec::new(),
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordSink for ConsoleSink {
    fn write_batch(&self, mut batch: Batch) -> Result<(), SinkError> {
        if batch.is_empty() {
            return Ok(());
        }
        let _guard = self.write_lock.lock().unwrap();

        let mut first_error = None;
        match &self.target {
            ConsoleTarget::Memory(lines) => {
                let mut lines = lines.lock().unwrap();
                while let Some(record) = batch.pop_front() {
                    lines.push(record.text().to_string());
                }
            }
            ConsoleTarget::Stdout => {
                let mut out = std::io::stdout().lock();
                while let Some(record) = batch.pop_front() {
                    let wrote = writeln!(out, "{}", record.text()).and_then(|()| out.flush());
                    if wrote.is_err() && first_error.is_none() {
                        first_error = Some(SinkError::ConsoleStream {
                            thread_id: current_thread_id(),
                            record: record.text().to_string(),
                        });
                    }
                }
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn ledger(&self) -> Arc<ErrorLedger> {
        Arc::clone(&self.ledger)
    }
}
