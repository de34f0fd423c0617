// Wall-clock formatting helpers and an owner-thread stopwatch

use chrono::{Datelike, Local, Timelike, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::thread::ThreadId;
use std::time::{Duration, Instant};

const DEFAULT_TIME_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Units for elapsed-time queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnits {
    Seconds,
    Milliseconds,
    Microseconds,
    Nanoseconds,
}

/// Native thread id, used in log prefixes and the exception ledger.
pub fn current_thread_id() -> u64 {
    #[cfg(target_os = "linux")]
    {
        unsafe { libc::gettid() as u64 }
    }
    #[cfg(not(target_os = "linux"))]
    {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        std::thread::current().id().hash(&mut hasher);
        hasher.finish()
    }
}

struct Stopwatch {
    start: Option<Instant>,
    elapsed: Option<Duration>,
    owner: Option<ThreadId>,
}

/// Time formatting plus a stopwatch owned by the thread that started it.
///
/// The stopwatch can only be stopped or queried by its starting thread;
/// queries from any other thread, or while the timer is still running,
/// return a negative sentinel.
pub struct Clock {
    format: String,
    running: AtomicBool,
    inner: Mutex<Stopwatch>,
}

impl Clock {
    pub fn new() -> Self {
        Self::with_format(DEFAULT_TIME_FORMAT)
    }

    /// Use `format` (strftime-style) as the default for time strings.
    pub fn with_format(format: &str) -> Self {
        Self {
            format: format.to_string(),
            running: AtomicBool::new(false),
            inner: Mutex::new(Stopwatch {
                start: None,
                elapsed: None,
                owner: None,
            }),
        }
    }

    /// Start the stopwatch. A second start while running is a no-op.
    pub fn start(&self) {
        if self.running.load(Ordering::Acquire) {
            return;
        }
        let mut inner = self.inner.lock().unwrap();
        inner.start = Some(Instant::now());
        inner.elapsed = None;
        inner.owner = Some(std::thread::current().id());
        self.running.store(true, Ordering::Release);
    }

    /// Stop the stopwatch. Only the starting thread may stop it; anyone else
    /// is ignored.
    pub fn stop(&self) {
        if !self.running.load(Ordering::Acquire) {
            return;
        }
        let mut inner = self.inner.lock().unwrap();
        if inner.owner != Some(std::thread::current().id()) {
            return;
        }
        inner.elapsed = inner.start.map(|start| start.elapsed());
        self.running.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Elapsed time between start and stop in the requested units. Returns
    /// `-1.0` while running, from a non-owning thread, or before any run.
    pub fn elapsed(&self, units: TimeUnits) -> f64 {
        if self.running.load(Ordering::Acquire) {
            return -1.0;
        }
        let inner = self.inner.lock().unwrap();
        if inner.owner != Some(std::thread::current().id()) {
            return -1.0;
        }
        let Some(elapsed) = inner.elapsed else {
            return -1.0;
        };
        match units {
            TimeUnits::Seconds => elapsed.as_secs() as f64,
            TimeUnits::Milliseconds => elapsed.as_millis() as f64,
            TimeUnits::Microseconds => elapsed.as_micros() as f64,
            TimeUnits::Nanoseconds => elapsed.as_nanos() as f64,
        }
    }

    /// Local time rendered with `format`, or the clock's default format when
    /// `format` is empty.
    pub fn local_time_str(&self, format: &str) -> String {
        let format = if format.is_empty() {
            &self.format
        } else {
            format
        };
        Local::now().format(format).to_string()
    }

    /// GMT time rendered with `format`, or the clock's default format when
    /// `format` is empty.
    pub fn gmt_time_str(&self, format: &str) -> String {
        let format = if format.is_empty() {
            &self.format
        } else {
            format
        };
        Utc::now().format(format).to_string()
    }

    pub fn day_of_week(&self) -> String {
        Local::now().format("%A").to_string()
    }

    pub fn month(&self) -> String {
        Local::now().format("%B").to_string()
    }

    pub fn year(&self) -> String {
        Local::now().year().to_string()
    }

    /// Local (hours, minutes, seconds).
    pub fn time_of_day(&self) -> (u32, u32, u32) {
        let now = Local::now();
        (now.hour(), now.minute(), now.second())
    }

    /// GMT (hours, minutes, seconds).
    pub fn gmt_time_of_day(&self) -> (u32, u32, u32) {
        let now = Utc::now();
        (now.hour(), now.minute(), now.second())
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
