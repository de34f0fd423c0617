// Log levels and their wire names

use serde::{Deserialize, Serialize};

/// Log record categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogLevel {
    /// Error conditions
    Err,
    /// Informational
    Info,
    /// Warning conditions
    Warn,
    /// Debug-level records, suppressed outside debug builds at the macro layer
    Debug,
    /// Record is written, then the process aborts
    Fatal,
    /// Important operational detail
    Imp,
    /// Assertion failure; carries the failed condition in the prefix
    Assert,
    /// Fallback for unrecognized level names
    Default,
}

impl LogLevel {
    /// Short name as it appears in the record prefix.
    pub const fn as_str(self) -> &'static str {
        match self {
            LogLevel::Err => "ERR",
            LogLevel::Info => "INF",
            LogLevel::Warn => "WARN",
            LogLevel::Debug => "DBG",
            LogLevel::Fatal => "FATAL",
            LogLevel::Imp => "IMP",
            LogLevel::Assert => "ASRT",
            LogLevel::Default => "DEFAULT",
        }
    }

    /// Parse a level name; anything unrecognized maps to `Default`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "ERR" => LogLevel::Err,
            "INF" => LogLevel::Info,
            "WARN" => LogLevel::Warn,
            "DBG" => LogLevel::Debug,
            "FATAL" => LogLevel::Fatal,
            "IMP" => LogLevel::Imp,
            "ASRT" => LogLevel::Assert,
            _ => LogLevel::Default,
        }
    }

    /// Width of the longest level name, used to align the prefix.
    pub const fn longest_name_len() -> usize {
        LogLevel::Default.as_str().len()
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
