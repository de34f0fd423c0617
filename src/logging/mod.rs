// Asynchronous logging pipeline: record buffer, watcher thread, sinks
//
// Producers push byte payloads into a shared RecordBuffer; a watcher thread
// owned by the LogEngine drains the buffer and hands each batch to the
// configured RecordSink. Sink failures are captured into an ErrorLedger and
// serialized to disk on engine shutdown, never propagated to producers.

mod buffer;
mod clock;
mod engine;
mod error;
mod file_sink;
mod format;
mod level;
mod macros;
mod record;
mod sink;

// Public exports
pub use buffer::{RecordBuffer, NOTIFY_THRESHOLD};
pub use clock::{current_thread_id, Clock, TimeUnits};
pub use engine::{
    global, init, init_with_sink, shutdown, LogConfig, LogEngine, SinkKind, EXCEPTIONS_FILE,
};
pub use error::{ErrorLedger, InitError, SinkError};
pub use file_sink::FileSink;
pub use format::{split_function, strip_stringified_quotes, LogLine};
pub use format::{DEFAULT_MARKER, ENTRY_MARKER, EXIT_MARKER};
pub use level::LogLevel;
pub use macros::{emit, emit_assert, emit_fatal};
pub use record::{split_payload, Record, RECORD_PAYLOAD, RECORD_SIZE};
pub use sink::{Batch, BitText, ConsoleSink, RecordSink};
