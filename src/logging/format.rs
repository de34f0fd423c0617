// SPDX-License-Identifier: Apache-2.0 OR MIT
// Per-call construction of the log record prefix

use super::clock::Clock;
use super::level::LogLevel;
use std::fmt::Write;

/// Marker for function-entry records.
pub const ENTRY_MARKER: &str = ">>";
/// Marker for function-exit records.
pub const EXIT_MARKER: &str = "<<";
/// Marker for everything else.
pub const DEFAULT_MARKER: &str = ">";

const FIELD_SEP: &str = "|";
const PREFIX_TIME_FORMAT: &str = "%Y%m%d_%H%M%S";

const THREAD_ID_WIDTH: usize = 10;
const FILE_NAME_WIDTH: usize = 20;
const LINE_NO_WIDTH: usize = 4;

/// Builder for one formatted log line. Stateless across calls: construct,
/// fill in the capture-site fields, render, discard.
///
/// The rendered shape is
/// `[<class> : <func>]|<local_time>| <tid>| <file>|<line>|<LEVEL><marker>  <payload>`
/// with fixed-width alignment on the thread id, file and line fields.
pub struct LogLine<'a> {
    level: LogLevel,
    marker: &'a str,
    file: &'a str,
    function: &'a str,
    line: usize,
    thread_id: u64,
    assert_condition: Option<&'a str>,
}

impl<'a> LogLine<'a> {
    pub fn new(level: LogLevel, marker: &'a str) -> Self {
        Self {
            level,
            marker,
            file: "",
            function: "",
            line: 0,
            thread_id: 0,
            assert_condition: None,
        }
    }

    pub fn location(mut self, file: &'a str, line: usize) -> Self {
        self.file = file;
        self.line = line;
        self
    }

    pub fn function(mut self, function: &'a str) -> Self {
        self.function = function;
        self
    }

    pub fn thread(mut self, thread_id: u64) -> Self {
        self.thread_id = thread_id;
        self
    }

    pub fn assert_condition(mut self, condition: &'a str) -> Self {
        self.assert_condition = Some(condition);
        self
    }

    /// Render the prefix and payload into one line (no trailing newline; the
    /// sink appends that).
    pub fn render(&self, payload: &str) -> String {
        let (class_name, func_name) = split_function(self.function);
        let mut out = String::new();

        let _ = write!(out, "[{class_name} : {func_name}]");

        let clock = Clock::with_format(PREFIX_TIME_FORMAT);
        let _ = write!(out, "{FIELD_SEP}{}{FIELD_SEP}", clock.local_time_str(""));

        let _ = write!(out, " {:>width$}{FIELD_SEP}", self.thread_id, width = THREAD_ID_WIDTH);
        let _ = write!(out, " {:<width$}{FIELD_SEP}", self.file, width = FILE_NAME_WIDTH);
        let _ = write!(out, "{:>width$}{FIELD_SEP}", self.line, width = LINE_NO_WIDTH);

        let level_str = self.level.as_str();
        let _ = write!(out, "{level_str}{}", self.marker);
        let pad_to = LogLevel::longest_name_len() + 1;
        let mut written = level_str.len() + self.marker.len();
        while written < pad_to {
            out.push(' ');
            written += 1;
        }
        out.push(' ');

        if let Some(condition) = self.assert_condition {
            let _ = write!(
                out,
                "ASSERTION FAILURE in {} at LN:{}, for [CONDITION: {}] evaluating to FALSE. ",
                self.file, self.line, condition
            );
        }

        out.push_str(&strip_stringified_quotes(payload));
        out
    }
}

/// Split a fully-qualified function path into (class, function). The class is
/// the second-to-last path segment; a bare function name yields an empty
/// class. Trailing parens and closure segments are dropped.
pub fn split_function(function: &str) -> (&str, &str) {
    let segments: Vec<&str> = function
        .split("::")
        .filter(|s| !s.is_empty() && *s != "{{closure}}")
        .collect();
    let func = segments
        .last()
        .copied()
        .unwrap_or("")
        .split('(')
        .next()
        .unwrap_or("");
    let class = if segments.len() >= 2 {
        segments[segments.len() - 2]
    } else {
        ""
    };
    (class, func)
}

/// Remove enclosing double quotes left over from macro stringification.
/// Applied twice, since stringified format arguments can nest one level.
pub fn strip_stringified_quotes(payload: &str) -> String {
    let mut out = payload;
    for _ in 0..2 {
        match (out.find('"'), out.rfind('"')) {
            (Some(first), Some(last)) if first < last => {
                out = &out[first + 1..last];
            }
            _ => break,
        }
    }
    out.to_string()
}
