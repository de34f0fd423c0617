// SPDX-License-Identifier: Apache-2.0 OR MIT
// Logging engine: owns the record buffer, the watcher thread and the sink

use super::buffer::RecordBuffer;
use super::error::{ErrorLedger, InitError};
use super::file_sink::{FileSink, DEFAULT_MAX_FILE_SIZE};
use super::sink::{BitText, ConsoleSink, RecordSink};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

pub use super::error::EXCEPTIONS_FILE;

/// Which sink an engine built from configuration writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SinkKind {
    #[default]
    Console,
    File,
}

/// Engine configuration. The file fields only matter for [`SinkKind::File`];
/// a file sink without a file name fails initialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub sink: SinkKind,
    /// File stem, optionally carrying its own extension.
    #[serde(default)]
    pub file_name: String,
    /// Directory for the log file; must exist. Empty means cwd.
    #[serde(default)]
    pub file_path: String,
    /// Extension override; wins over one embedded in `file_name`.
    #[serde(default)]
    pub file_extension: String,
    /// Rotation ceiling in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            sink: SinkKind::Console,
            file_name: String::new(),
            file_path: String::new(),
            file_extension: String::new(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

// Engine lifecycle. No writes are accepted once draining begins.
const STATE_RUNNING: u8 = 0;
const STATE_DRAINING: u8 = 1;
const STATE_TERMINATED: u8 = 2;

/// Asynchronous logging engine.
///
/// Producers hand payloads to [`LogEngine::write`]; a watcher thread drains
/// the shared buffer and dispatches each batch to the sink on a transient
/// writer thread, so the buffer lock is never held across sink I/O. Sink
/// failures accumulate in the ledger and are serialized to
/// [`EXCEPTIONS_FILE`] when the engine shuts down.
pub struct LogEngine {
    buffer: Arc<RecordBuffer>,
    sink: Arc<dyn RecordSink>,
    ledger: Arc<ErrorLedger>,
    watcher: Mutex<Option<JoinHandle<()>>>,
    state: AtomicU8,
}

impl LogEngine {
    /// Build an engine around a caller-supplied sink and start the watcher.
    pub fn new(sink: Arc<dyn RecordSink>) -> Self {
        let buffer = Arc::new(RecordBuffer::new());
        let ledger = sink.ledger();
        let watcher = spawn_watcher(Arc::clone(&buffer), Arc::clone(&sink), Arc::clone(&ledger));
        Self {
            buffer,
            sink,
            ledger,
            watcher: Mutex::new(Some(watcher)),
            state: AtomicU8::new(STATE_RUNNING),
        }
    }

    /// Build an engine from configuration, constructing the requested sink.
    pub fn from_config(config: &LogConfig) -> Result<Self, InitError> {
        let sink: Arc<dyn RecordSink> = match config.sink {
            SinkKind::Console => Arc::new(ConsoleSink::new()),
            SinkKind::File => {
                if config.file_name.is_empty() {
                    return Err(InitError::MissingFileName);
                }
                Arc::new(FileSink::new(
                    config.max_file_size,
                    &config.file_name,
                    &config.file_path,
                    &config.file_extension,
                )?)
            }
        };
        Ok(Self::new(sink))
    }

    fn is_running(&self) -> bool {
        self.state.load(Ordering::Acquire) == STATE_RUNNING
    }

    /// Queue one payload for the sink. Dropped silently after shutdown has
    /// begun or for empty input.
    pub fn write(&self, data: &str) {
        if data.is_empty() || !self.is_running() {
            return;
        }
        self.buffer.push(data.as_bytes());
    }

    /// Queue every string in `items`, preserving order.
    pub fn write_all<I, S>(&self, items: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for item in items {
            self.write(item.as_ref());
        }
    }

    /// Queue an unsigned integer rendered as its fixed-width binary text
    /// (8/16/32/64 characters for 1/2/4/8-byte values).
    pub fn write_bits<B: BitText>(&self, value: B) {
        self.write(&value.bit_text());
    }

    /// Queue a stream of integers, each as its binary text.
    pub fn write_bits_all<B, I>(&self, values: I)
    where
        B: BitText,
        I: IntoIterator<Item = B>,
    {
        for value in values {
            self.write_bits(value);
        }
    }

    /// Alias of [`Self::write`].
    pub fn append(&self, data: &str) {
        self.write(data);
    }

    /// Alias of [`Self::write_all`].
    pub fn append_all<I, S>(&self, items: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.write_all(items);
    }

    /// Alias of [`Self::write_bits`].
    pub fn append_bits<B: BitText>(&self, value: B) {
        self.write_bits(value);
    }

    /// Alias of [`Self::write_bits_all`].
    pub fn append_bits_all<B, I>(&self, values: I)
    where
        B: BitText,
        I: IntoIterator<Item = B>,
    {
        self.write_bits_all(values);
    }

    /// Nudge the watcher to deliver whatever is queued.
    pub fn flush(&self) {
        self.buffer.flush();
    }

    /// Stop accepting writes, drain the buffer, join the watcher and
    /// serialize the exception ledger to disk. Safe to call repeatedly;
    /// later calls are no-ops.
    pub fn shutdown(&self) {
        if self
            .state
            .compare_exchange(
                STATE_RUNNING,
                STATE_DRAINING,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return;
        }

        self.buffer.request_shutdown();
        if let Some(watcher) = self.watcher.lock().unwrap().take() {
            let _ = watcher.join();
        }
        self.ledger.drain_to_file();
        self.state.store(STATE_TERMINATED, Ordering::Release);
    }

    /// The sink this engine dispatches to.
    pub fn sink(&self) -> &Arc<dyn RecordSink> {
        &self.sink
    }

    /// Read-only view of the captured sink failures.
    pub fn ledger(&self) -> &ErrorLedger {
        &self.ledger
    }
}

impl Drop for LogEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Watcher loop: wait for readiness or shutdown, drain, hand the batch to a
/// transient writer thread so producers can re-open the buffer during long
/// sink writes, capture any failure, and exit once shutdown was observed.
fn spawn_watcher(
    buffer: Arc<RecordBuffer>,
    sink: Arc<dyn RecordSink>,
    ledger: Arc<ErrorLedger>,
) -> JoinHandle<()> {
    std::thread::Builder::new()
        .name("log-watcher".into())
        .spawn(move || loop {
            let batch = buffer.wait_and_drain();
            if !batch.is_empty() {
                dispatch(&sink, &ledger, batch);
            }

            if buffer.is_shutdown() {
                // Records pushed between the drain above and the shutdown
                // flag being raised are still queued; sweep them out.
                let tail = buffer.drain();
                if !tail.is_empty() {
                    dispatch(&sink, &ledger, tail);
                }
                break;
            }
        })
        .expect("failed to spawn log watcher thread")
}

/// Run one batch through the sink on a transient writer thread and capture
/// any failure into the ledger.
fn dispatch(sink: &Arc<dyn RecordSink>, ledger: &ErrorLedger, batch: super::sink::Batch) {
    let sink = Arc::clone(sink);
    let writer = std::thread::spawn(move || sink.write_batch(batch));
    if let Ok(Err(error)) = writer.join() {
        ledger.record(error);
    }
}

// ---------------------------------------------------------------------------
// Process-wide engine
// ---------------------------------------------------------------------------

static GLOBAL_ENGINE: Mutex<Option<Arc<LogEngine>>> = Mutex::new(None);

/// Initialize the process-wide engine from configuration. Fails if one is
/// already installed.
pub fn init(config: &LogConfig) -> Result<(), InitError> {
    let engine = Arc::new(LogEngine::from_config(config)?);
    install(engine)
}

/// Initialize the process-wide engine around an explicit sink (tests inject
/// an in-memory console this way).
pub fn init_with_sink(sink: Arc<dyn RecordSink>) -> Result<(), InitError> {
    install(Arc::new(LogEngine::new(sink)))
}

fn install(engine: Arc<LogEngine>) -> Result<(), InitError> {
    let mut slot = GLOBAL_ENGINE.lock().unwrap();
    if slot.is_some() {
        return Err(InitError::AlreadyInitialized);
    }
    *slot = Some(engine);
    Ok(())
}

/// Handle to the process-wide engine, if initialized.
pub fn global() -> Option<Arc<LogEngine>> {
    GLOBAL_ENGINE.lock().unwrap().clone()
}

/// Tear down the process-wide engine: drains, joins the watcher and flushes
/// the ledger. A no-op when nothing is installed.
pub fn shutdown() {
    let engine = GLOBAL_ENGINE.lock().unwrap().take();
    if let Some(engine) = engine {
        engine.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_engine() -> (LogEngine, Arc<ConsoleSink>) {
        let sink = Arc::new(ConsoleSink::test());
        let engine = LogEngine::new(Arc::clone(&sink) as Arc<dyn RecordSink>);
        (engine, sink)
    }

    #[test]
    fn test_write_reaches_sink_on_shutdown() {
        let (engine, sink) = test_engine();
        engine.write("hello");
        engine.shutdown();
        assert_eq!(sink.captured(), vec!["hello"]);
    }

    #[test]
    fn test_flush_delivers_before_shutdown() {
        let (engine, sink) = test_engine();
        for i in 0..10 {
            engine.write(&format!("record {i}"));
        }
        engine.flush();
        engine.shutdown();

        let captured = sink.captured();
        assert_eq!(captured.len(), 10);
        assert_eq!(captured[0], "record 0");
        assert_eq!(captured[9], "record 9");
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let (engine, sink) = test_engine();
        engine.write("once");
        engine.shutdown();
        engine.shutdown();
        assert_eq!(sink.captured(), vec!["once"]);
    }

    #[test]
    fn test_write_after_shutdown_dropped() {
        let (engine, sink) = test_engine();
        engine.shutdown();
        engine.write("ghost");
        assert!(sink.captured().is_empty());
    }

    #[test]
    fn test_binary_rendering() {
        let (engine, sink) = test_engine();
        engine.write_bits(0b1010_1010u8);
        engine.write_bits(0x1A2B3C4Du32);
        engine.shutdown();

        let captured = sink.captured();
        assert_eq!(captured[0], "10101010");
        assert_eq!(captured[1], "00011010001010110011110001001101");
        assert_eq!(u32::from_str_radix(&captured[1], 2).unwrap(), 0x1A2B3C4D);
    }

    #[test]
    fn test_write_all_preserves_order() {
        let (engine, sink) = test_engine();
        engine.write_all(["a", "b", "c"]);
        engine.append_all(vec![String::from("d")]);
        engine.shutdown();
        assert_eq!(sink.captured(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_file_config_requires_name() {
        let config = LogConfig {
            sink: SinkKind::File,
            ..LogConfig::default()
        };
        assert!(matches!(
            LogEngine::from_config(&config),
            Err(InitError::MissingFileName)
        ));
    }

    #[test]
    fn test_console_config_builds() {
        let engine = LogEngine::from_config(&LogConfig::default()).unwrap();
        engine.shutdown();
    }
}
