// SPDX-License-Identifier: Apache-2.0 OR MIT
// Logging macros: capture file/function/line and forward to the engine

use super::clock::current_thread_id;
use super::engine;
use super::format::{LogLine, DEFAULT_MARKER};
use super::level::LogLevel;

/// Render one record through the facade and hand it to the process-wide
/// engine. A no-op until [`super::init`] has run.
pub fn emit(
    level: LogLevel,
    marker: &str,
    file: &str,
    function: &str,
    line: usize,
    payload: String,
) {
    let Some(engine) = engine::global() else {
        return;
    };
    let rendered = LogLine::new(level, marker)
        .location(file, line)
        .function(function)
        .thread(current_thread_id())
        .render(&payload);
    engine.write(&rendered);
}

/// Emit an assertion-failure record, drain the engine, and terminate.
/// Graceful mode exits with a non-zero status; otherwise the process aborts.
pub fn emit_assert(
    file: &str,
    function: &str,
    line: usize,
    condition: &str,
    graceful: bool,
    payload: String,
) -> ! {
    if let Some(engine) = engine::global() {
        let rendered = LogLine::new(LogLevel::Assert, DEFAULT_MARKER)
            .location(file, line)
            .function(function)
            .thread(current_thread_id())
            .assert_condition(condition)
            .render(&payload);
        engine.write(&rendered);
        engine.flush();
    }
    engine::shutdown();
    if graceful {
        std::process::exit(1);
    } else {
        std::process::abort();
    }
}

/// Emit a fatal record, drain the engine, and abort the process.
pub fn emit_fatal(file: &str, function: &str, line: usize, payload: String) -> ! {
    emit(
        LogLevel::Fatal,
        DEFAULT_MARKER,
        file,
        function,
        line,
        payload,
    );
    if let Some(engine) = engine::global() {
        engine.flush();
    }
    engine::shutdown();
    std::process::abort();
}

/// Fully-qualified path of the enclosing function, for log prefixes.
#[macro_export]
macro_rules! function_path {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        name.strip_suffix("::f").unwrap_or(name)
    }};
}

/// Log an informational message.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logging::emit(
            $crate::logging::LogLevel::Info,
            $crate::logging::DEFAULT_MARKER,
            file!(),
            $crate::function_path!(),
            line!() as usize,
            format!($($arg)*),
        )
    };
}

/// Log an error message.
#[macro_export]
macro_rules! log_err {
    ($($arg:tt)*) => {
        $crate::logging::emit(
            $crate::logging::LogLevel::Err,
            $crate::logging::DEFAULT_MARKER,
            file!(),
            $crate::function_path!(),
            line!() as usize,
            format!($($arg)*),
        )
    };
}

/// Log a warning message.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logging::emit(
            $crate::logging::LogLevel::Warn,
            $crate::logging::DEFAULT_MARKER,
            file!(),
            $crate::function_path!(),
            line!() as usize,
            format!($($arg)*),
        )
    };
}

/// Log an important operational detail.
#[macro_export]
macro_rules! log_imp {
    ($($arg:tt)*) => {
        $crate::logging::emit(
            $crate::logging::LogLevel::Imp,
            $crate::logging::DEFAULT_MARKER,
            file!(),
            $crate::function_path!(),
            line!() as usize,
            format!($($arg)*),
        )
    };
}

/// Log a debug message. Compiled out of release builds.
#[macro_export]
macro_rules! log_dbg {
    ($($arg:tt)*) => {
        if cfg!(debug_assertions) {
            $crate::logging::emit(
                $crate::logging::LogLevel::Debug,
                $crate::logging::DEFAULT_MARKER,
                file!(),
                $crate::function_path!(),
                line!() as usize,
                format!($($arg)*),
            )
        }
    };
}

/// Log a function-entry record (`>>` marker).
#[macro_export]
macro_rules! log_entry {
    () => { $crate::log_entry!("") };
    ($($arg:tt)*) => {
        $crate::logging::emit(
            $crate::logging::LogLevel::Info,
            $crate::logging::ENTRY_MARKER,
            file!(),
            $crate::function_path!(),
            line!() as usize,
            format!($($arg)*),
        )
    };
}

/// Log a function-exit record (`<<` marker).
#[macro_export]
macro_rules! log_exit {
    () => { $crate::log_exit!("") };
    ($($arg:tt)*) => {
        $crate::logging::emit(
            $crate::logging::LogLevel::Info,
            $crate::logging::EXIT_MARKER,
            file!(),
            $crate::function_path!(),
            line!() as usize,
            format!($($arg)*),
        )
    };
}

/// Log a message followed by every line in a list or vector of strings.
#[macro_export]
macro_rules! log_list {
    ($list:expr, $($arg:tt)*) => {{
        $crate::logging::emit(
            $crate::logging::LogLevel::Info,
            $crate::logging::ENTRY_MARKER,
            file!(),
            $crate::function_path!(),
            line!() as usize,
            format!($($arg)*),
        );
        if let Some(engine) = $crate::logging::global() {
            engine.write_all($list);
        }
    }};
}

/// Check `cond`; on failure write an assertion record naming the condition,
/// drain the engine and exit the process with a non-zero status.
#[macro_export]
macro_rules! log_assert {
    ($cond:expr) => {
        $crate::log_assert!($cond, "")
    };
    ($cond:expr, $($arg:tt)*) => {
        if !($cond) {
            $crate::logging::emit_assert(
                file!(),
                $crate::function_path!(),
                line!() as usize,
                stringify!($cond),
                true,
                format!($($arg)*),
            );
        }
    };
}

/// Log a fatal message and abort the process.
#[macro_export]
macro_rules! log_fatal {
    ($($arg:tt)*) => {
        $crate::logging::emit_fatal(
            file!(),
            $crate::function_path!(),
            line!() as usize,
            format!($($arg)*),
        )
    };
}
