// Shared record buffer between producers and the watcher thread

use super::record::{split_payload, Record};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// Queue length at which a push wakes the watcher without waiting for an
/// explicit flush. Amortizes sink-call overhead during bursty writes; a
/// flush provides the low-latency path.
pub const NOTIFY_THRESHOLD: usize = 256;

/// Ordered record mailbox shared by any number of producers and exactly one
/// consumer. Push and drain are serialized on one mutex; the `ready` and
/// `shutdown` flags are only mutated with that mutex held so the watcher
/// cannot miss a wake-up.
pub struct RecordBuffer {
    records: Mutex<VecDeque<Record>>,
    available: Condvar,
    ready: AtomicBool,
    shutdown: AtomicBool,
}

impl RecordBuffer {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
            ready: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
        }
    }

    /// Append a payload, splitting it into fixed-width records. A zero-length
    /// payload is a no-op, and pushes after shutdown are dropped silently.
    pub fn push(&self, payload: &[u8]) {
        if payload.is_empty() || self.shutdown.load(Ordering::Acquire) {
            return;
        }
        let mut notify = false;
        {
            let mut records = self.records.lock().unwrap();
            for record in split_payload(payload) {
                records.push_back(record);
            }
            if records.len() >= NOTIFY_THRESHOLD {
                self.ready.store(true, Ordering::Release);
                notify = true;
            }
        }
        if notify {
            self.available.notify_one();
        }
    }

    /// Move the entire queue contents out and clear the ready flag.
    pub fn drain(&self) -> VecDeque<Record> {
        let mut records = self.records.lock().unwrap();
        self.ready.store(false, Ordering::Release);
        std::mem::take(&mut *records)
    }

    /// Block until the buffer is ready or shutdown was requested, then hand
    /// the whole queue to the caller. Used by the watcher thread.
    pub fn wait_and_drain(&self) -> VecDeque<Record> {
        let mut records = self.records.lock().unwrap();
        while !self.ready.load(Ordering::Acquire) && !self.shutdown.load(Ordering::Acquire) {
            records = self.available.wait(records).unwrap();
        }
        self.ready.store(false, Ordering::Release);
        std::mem::take(&mut *records)
    }

    /// Wake the watcher if anything is pending, then yield briefly so it has
    /// a chance to run. A cooperative hand-off, not a delivery guarantee.
    pub fn flush(&self) {
        {
            let records = self.records.lock().unwrap();
            if records.is_empty() {
                return;
            }
            self.ready.store(true, Ordering::Release);
        }
        self.available.notify_one();
        std::thread::sleep(Duration::from_micros(200));
    }

    /// Flag the buffer for shutdown and wake the watcher. Later pushes are
    /// dropped.
    pub fn request_shutdown(&self) {
        {
            let _records = self.records.lock().unwrap();
            self.shutdown.store(true, Ordering::Release);
        }
        self.available.notify_one();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RecordBuffer {
    fn default() -> Self {
        Self::new()
    }
}
