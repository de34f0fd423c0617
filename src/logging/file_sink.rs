// SPDX-License-Identifier: Apache-2.0 OR MIT
// Size-rotating file sink and its file helpers

use super::clock::{current_thread_id, Clock};
use super::error::{ErrorLedger, InitError, SinkError};
use super::sink::{Batch, RecordSink};
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const DEFAULT_FILE_EXTN: &str = ".txt";
const ROTATION_TIME_FORMAT: &str = "%d%m%Y_%H%M%S";

/// Default ceiling on the active log file, in bytes.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1_024_000;

struct FileState {
    directory: PathBuf,
    /// File name including extension.
    file_name: String,
    /// Extension including the leading dot.
    extension: String,
    full_path: PathBuf,
    /// Mirror of the last whole-file read.
    content: VecDeque<String>,
}

impl FileState {
    fn stem(&self) -> &str {
        self.file_name
            .strip_suffix(self.extension.as_str())
            .unwrap_or(&self.file_name)
    }

    /// Apply the path policy to (name, path, extension) and rebuild the full
    /// path. Empty arguments keep the current value.
    fn resolve(&mut self, name: &str, path: &str, extension: &str) {
        if !name.is_empty() {
            self.file_name = name.to_string();
        }
        if !path.is_empty() {
            self.directory = PathBuf::from(path);
        }
        if !extension.is_empty() {
            self.extension = extension.to_string();
        }

        if self.extension.is_empty() {
            // No explicit extension: inherit the name's own, or default .txt
            match self.file_name.rfind('.') {
                Some(dot) => self.extension = self.file_name[dot..].to_string(),
                None => {
                    self.extension = DEFAULT_FILE_EXTN.to_string();
                    self.file_name.push_str(DEFAULT_FILE_EXTN);
                }
            }
        } else {
            // An explicitly configured extension wins over one embedded in
            // the name
            if let Some(dot) = self.file_name.rfind('.') {
                self.file_name.truncate(dot);
            }
            if !self.extension.starts_with('.') {
                self.extension.insert(0, '.');
            }
            self.file_name.push_str(&self.extension);
        }

        if self.directory.as_os_str().is_empty() {
            // A path buried in the name is split out; otherwise fall back to
            // the current working directory
            let embedded = self.file_name.rfind(std::path::MAIN_SEPARATOR);
            match embedded {
                Some(sep) => {
                    self.directory = PathBuf::from(&self.file_name[..=sep]);
                    self.file_name = self.file_name[sep + 1..].to_string();
                }
                None => {
                    self.directory = std::env::current_dir().unwrap_or_default();
                }
            }
        }

        self.full_path = self.directory.join(&self.file_name);
    }
}

/// Writes drained batches to a file, rotating it away under a timestamped
/// name whenever the configured size ceiling would be crossed.
pub struct FileSink {
    state: Mutex<FileState>,
    max_bytes: u64,
    ledger: Arc<ErrorLedger>,
}

impl FileSink {
    /// Build a sink from the file-path triple and size ceiling.
    ///
    /// `name` must be non-empty; `path`, when given, must name an existing
    /// directory. An empty `extension` defers to the name's own extension or
    /// `.txt`.
    pub fn new(
        max_bytes: u64,
        name: &str,
        path: &str,
        extension: &str,
    ) -> Result<Self, InitError> {
        if name.is_empty() {
            return Err(InitError::MissingFileName);
        }
        if !path.is_empty() && !Path::new(path).is_dir() {
            return Err(InitError::BadPath(path.to_string()));
        }

        let mut state = FileState {
            directory: PathBuf::new(),
            file_name: String::new(),
            extension: String::new(),
            full_path: PathBuf::new(),
            content: VecDeque::new(),
        };
        state.resolve(name, path, extension);

        Ok(Self {
            state: Mutex::new(state),
            max_bytes,
            ledger: Arc::new(ErrorLedger::new()),
        })
    }

    /// Full path of the active log file.
    pub fn path(&self) -> PathBuf {
        self.state.lock().unwrap().full_path.clone()
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Point the sink at a different file name; the extension policy is
    /// re-applied.
    pub fn set_file_name(&self, name: &str) -> &Self {
        if !name.is_empty() {
            self.state.lock().unwrap().resolve(name, "", "");
        }
        self
    }

    /// Point the sink at a different directory.
    pub fn set_file_path(&self, path: &str) -> &Self {
        if !path.is_empty() {
            self.state.lock().unwrap().resolve("", path, "");
        }
        self
    }

    /// Override the extension; wins over one embedded in the name.
    pub fn set_extension(&self, extension: &str) -> &Self {
        if !extension.is_empty() {
            self.state.lock().unwrap().resolve("", "", extension);
        }
        self
    }

    /// Size of the active file on disk, 0 when absent. Read failures land in
    /// the ledger.
    pub fn file_size(&self) -> u64 {
        let path = self.path();
        if !Self::exists(&path) {
            return 0;
        }
        match std::fs::metadata(&path) {
            Ok(meta) => meta.len(),
            Err(source) => {
                self.ledger.record(SinkError::Read { path, source });
                0
            }
        }
    }

    /// Read `[start, end)` bytes of the active file, validating
    /// `start <= end <= size`. Failures are captured into the ledger and
    /// yield `None`.
    pub fn read_byte_range(&self, start: u64, end: u64) -> Option<Vec<u8>> {
        let path = self.path();
        if Self::is_empty_file(&path) || !Self::exists(&path) {
            self.ledger.record(SinkError::EmptyFile { path });
            return None;
        }

        let size = self.file_size();
        let bound_error = if start > size {
            Some("Start pos is greater than file size")
        } else if end > size {
            Some("End pos is greater than file size")
        } else if start > end {
            Some("Start pos is greater than end pos")
        } else {
            None
        };
        if let Some(detail) = bound_error {
            self.ledger.record(SinkError::OutOfBounds {
                detail: detail.to_string(),
            });
            return None;
        }

        let read = (|| -> std::io::Result<Vec<u8>> {
            let mut file = File::open(&path)?;
            file.seek(SeekFrom::Start(start))?;
            let mut out = vec![0u8; (end - start) as usize];
            file.read_exact(&mut out)?;
            Ok(out)
        })();
        match read {
            Ok(bytes) => Some(bytes),
            Err(source) => {
                self.ledger.record(SinkError::Read { path, source });
                None
            }
        }
    }

    /// Read lines `first..=last` of the active file, 1-based inclusive,
    /// validating `first <= last`. A range past the end returns the lines
    /// that exist. Failures are captured into the ledger and yield `None`.
    pub fn read_line_range(&self, first: usize, last: usize) -> Option<Vec<String>> {
        let path = self.path();
        if Self::is_empty_file(&path) || !Self::exists(&path) {
            self.ledger.record(SinkError::EmptyFile { path });
            return None;
        }
        if first > last {
            self.ledger.record(SinkError::OutOfBounds {
                detail: "Start pos is greater than end pos".to_string(),
            });
            return None;
        }

        let file = match File::open(&path) {
            Ok(file) => file,
            Err(source) => {
                self.ledger.record(SinkError::Read { path, source });
                return None;
            }
        };

        let mut out = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line_no = index + 1;
            if line_no > last {
                break;
            }
            match line {
                Ok(line) if line_no >= first => out.push(line),
                Ok(_) => {}
                Err(source) => {
                    self.ledger.record(SinkError::Read { path, source });
                    return None;
                }
            }
        }
        Some(out)
    }

    /// Re-read the whole active file into the mirror buffer.
    pub fn read_all(&self) -> bool {
        let path = self.path();
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(source) => {
                self.ledger.record(SinkError::Read { path, source });
                return false;
            }
        };

        let mut content = VecDeque::new();
        for line in BufReader::new(file).lines() {
            match line {
                Ok(line) => content.push_back(line),
                Err(source) => {
                    self.ledger.record(SinkError::Read { path, source });
                    return false;
                }
            }
        }
        self.state.lock().unwrap().content = content;
        true
    }

    /// The mirror of the last [`Self::read_all`].
    pub fn content(&self) -> Vec<String> {
        self.state.lock().unwrap().content.iter().cloned().collect()
    }

    /// Rename the active file within its directory. Returns false for an
    /// empty or identical name, or when the file is missing.
    pub fn rename_to(&self, new_name: &str) -> bool {
        let state = self.state.lock().unwrap();
        if new_name.is_empty() || new_name == state.file_name || !state.full_path.exists() {
            return false;
        }
        let target = state.directory.join(new_name);
        std::fs::rename(&state.full_path, target).is_ok()
    }

    /// Delete the active file.
    pub fn delete(&self) -> bool {
        Self::remove(&self.path())
    }

    /// Truncate the active file to zero length.
    pub fn clear(&self) -> bool {
        Self::truncate(&self.path())
    }

    // Path-based helpers, usable without a sink instance. Failures surface
    // as `false` here rather than through a ledger.

    pub fn exists(path: &Path) -> bool {
        !path.as_os_str().is_empty() && path.exists()
    }

    pub fn is_empty_file(path: &Path) -> bool {
        match std::fs::metadata(path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => false,
        }
    }

    /// Create an empty file; false when the path is empty or already taken.
    pub fn create(path: &Path) -> bool {
        if path.as_os_str().is_empty() || Self::exists(path) {
            return false;
        }
        File::create(path).is_ok()
    }

    pub fn remove(path: &Path) -> bool {
        Self::exists(path) && std::fs::remove_file(path).is_ok()
    }

    pub fn truncate(path: &Path) -> bool {
        Self::exists(path)
            && OpenOptions::new()
                .write(true)
                .truncate(true)
                .open(path)
                .is_ok()
    }
}

impl RecordSink for FileSink {
    /// Append the batch to the active file, rotating first when the on-disk
    /// size plus the batch would reach the ceiling. The rotated file keeps
    /// the stem with a local timestamp suffix; a fresh empty file takes the
    /// original path. A single batch larger than the ceiling still lands in
    /// the fresh file.
    fn write_batch(&self, mut batch: Batch) -> Result<(), SinkError> {
        if batch.is_empty() {
            return Ok(());
        }
        let state = self.state.lock().unwrap();
        let path = state.full_path.clone();

        if !path.exists() {
            File::create(&path).map_err(|source| SinkError::Create {
                path: path.clone(),
                source,
            })?;
        }

        let on_disk = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        let batch_bytes: u64 = batch.iter().map(|r| r.len() as u64 + 1).sum();
        if on_disk + batch_bytes >= self.max_bytes {
            let stamp = Clock::with_format(ROTATION_TIME_FORMAT).local_time_str("");
            let rotated = state
                .directory
                .join(format!("{}_{}{}", state.stem(), stamp, state.extension));
            std::fs::rename(&path, &rotated).map_err(|source| SinkError::Rotate {
                path: path.clone(),
                rotated,
                source,
            })?;
            File::create(&path).map_err(|source| SinkError::Create {
                path: path.clone(),
                source,
            })?;
        }

        let mut file = OpenOptions::new()
            .append(true)
            .open(&path)
            .map_err(|source| SinkError::Open {
                path: path.clone(),
                thread_id: current_thread_id(),
                source,
            })?;

        let mut first_error = None;
        while let Some(record) = batch.pop_front() {
            let wrote = writeln!(file, "{}", record.text()).and_then(|()| file.flush());
            if let Err(source) = wrote {
                if first_error.is_none() {
                    first_error = Some(SinkError::Write {
                        path: path.clone(),
                        thread_id: current_thread_id(),
                        source,
                    });
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
