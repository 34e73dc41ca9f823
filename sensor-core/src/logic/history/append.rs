//! Deduplicating CSV Append Log
//!
//! Append-only, one row per accepted decision. A row is skipped when its
//! values (timestamp excluded) equal the last row in the file. The
//! compare-and-append runs under one lock so concurrent appenders cannot
//! both pass the check.
//!
//! Every row is written with a single `write_all` ending in `\n`, so a
//! reader that stops at the last newline only ever sees complete rows. A
//! write that fails part-way is rolled back before the error is returned.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, SubsecRound};
use parking_lot::Mutex;

use super::entry::{header, LogEntry};
use crate::logic::features::SensorRecord;

// ============================================================================
// ERRORS / OUTCOMES
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("append log {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("append log {path} has header {found:?}, expected {expected:?}")]
    HeaderMismatch {
        path: PathBuf,
        found: Vec<String>,
        expected: Vec<String>,
    },

    #[error("cannot encode row: {0}")]
    Encode(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppendOutcome {
    Appended(LogEntry),
    /// Same values as the last row; nothing written
    Skipped { previous: LogEntry },
}

impl AppendOutcome {
    pub fn is_appended(&self) -> bool {
        matches!(self, AppendOutcome::Appended(_))
    }
}

// ============================================================================
// APPEND LOG
// ============================================================================

/// What rows are written through. `File` outside tests.
pub(crate) trait LogFile: Write + Send {
    fn size(&self) -> io::Result<u64>;
    fn truncate_to(&mut self, len: u64) -> io::Result<()>;
    fn sync(&mut self) -> io::Result<()>;
}

impl LogFile for File {
    fn size(&self) -> io::Result<u64> {
        self.metadata().map(|m| m.len())
    }

    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }
}

struct LogInner {
    /// Opened on first append so a fresh log has no file until it has a row
    file: Option<Box<dyn LogFile>>,
    last: Option<LogEntry>,
    has_header: bool,
    /// A failed write left bytes behind that could not be rolled back
    torn: bool,
}

pub struct AppendLog {
    path: PathBuf,
    inner: Mutex<LogInner>,
}

impl AppendLog {
    /// Open (or prepare) the log at `path`.
    ///
    /// An existing file must carry the expected header. A torn trailing
    /// line left by a crash is cut off so the next row starts cleanly.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LogError> {
        let path = path.into();
        let mut inner = LogInner {
            file: None,
            last: None,
            has_header: false,
            torn: false,
        };

        match fs::read(&path) {
            Ok(bytes) => {
                let complete = complete_prefix(&bytes);
                if complete.len() < bytes.len() {
                    log::warn!(
                        "Append log {} ends with a torn row ({} bytes), truncating",
                        path.display(),
                        bytes.len() - complete.len()
                    );
                    truncate(&path, complete.len() as u64)?;
                }

                if !complete.is_empty() {
                    validate_header(&path, complete)?;
                    inner.has_header = true;
                    inner.last = parse_entries(complete).pop();
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => return Err(LogError::Io { path, source }),
        }

        log::info!(
            "Append log ready: {} (last row: {})",
            path.display(),
            inner
                .last
                .as_ref()
                .map(|e| e.timestamp.to_string())
                .unwrap_or_else(|| "none".to_string())
        );

        Ok(Self {
            path,
            inner: Mutex::new(inner),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last row written (or found at open)
    pub fn last_entry(&self) -> Option<LogEntry> {
        self.inner.lock().last.clone()
    }

    /// Append unless the values equal the last row.
    ///
    /// On error nothing is recorded: the file keeps its previous complete
    /// rows and the dedup state still refers to the last row on disk.
    pub fn append(&self, reading: &SensorRecord, anomaly: bool) -> Result<AppendOutcome, LogError> {
        let mut inner = self.inner.lock();

        if let Some(previous) = inner.last.as_ref() {
            if previous.same_values(reading, anomaly) {
                return Ok(AppendOutcome::Skipped {
                    previous: previous.clone(),
                });
            }
        }

        if inner.torn {
            self.repair(&mut inner)?;
        }

        let entry = LogEntry {
            timestamp: Local::now().naive_local().trunc_subsecs(0),
            reading: *reading,
            anomaly,
        };

        let mut buf = Vec::with_capacity(128);
        if !inner.has_header {
            buf.extend(encode_row(header())?);
        }
        buf.extend(encode_row(entry.to_row())?);

        if inner.file.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .map_err(|source| self.io_error(source))?;
            inner.file = Some(Box::new(file));
        }

        let state = &mut *inner;
        if let Some(file) = state.file.as_mut() {
            let start = file.size().map_err(|source| self.io_error(source))?;
            if let Err(source) = file.write_all(&buf).and_then(|_| file.flush()) {
                match file.truncate_to(start) {
                    Ok(()) => log::warn!("Append log write failed, rolled back to {} bytes", start),
                    Err(e) => {
                        log::error!("Append log write failed and cannot be rolled back: {}", e);
                        state.torn = true;
                    }
                }
                return Err(self.io_error(source));
            }
        }

        state.has_header = true;
        state.last = Some(entry.clone());
        Ok(AppendOutcome::Appended(entry))
    }

    /// All complete rows in file order. Unparseable rows are skipped.
    pub fn read_all(&self) -> Result<Vec<LogEntry>, LogError> {
        Ok(match self.read_raw()? {
            Some(bytes) => parse_entries(&bytes),
            None => Vec::new(),
        })
    }

    /// File contents up to the last complete row, `None` if the log has
    /// never been written
    pub fn read_raw(&self) -> Result<Option<Vec<u8>>, LogError> {
        match fs::read(&self.path) {
            Ok(mut bytes) => {
                let len = complete_prefix(&bytes).len();
                bytes.truncate(len);
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(self.io_error(source)),
        }
    }

    /// Push written rows to stable storage
    pub fn flush(&self) -> Result<(), LogError> {
        let mut inner = self.inner.lock();
        if let Some(file) = inner.file.as_mut() {
            file.sync().map_err(|source| LogError::Io {
                path: self.path.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Cut what a failed write left behind back to the last full row
    fn repair(&self, inner: &mut LogInner) -> Result<(), LogError> {
        let bytes = fs::read(&self.path).map_err(|source| self.io_error(source))?;
        let complete = complete_prefix(&bytes).len();
        if complete < bytes.len() {
            log::warn!(
                "Dropping {} bytes of a partial row from {}",
                bytes.len() - complete,
                self.path.display()
            );
            truncate(&self.path, complete as u64)?;
        }
        if complete == 0 {
            inner.has_header = false;
        }
        inner.torn = false;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn replace_file(&self, file: Box<dyn LogFile>) {
        self.inner.lock().file = Some(file);
    }

    fn io_error(&self, source: io::Error) -> LogError {
        LogError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Bytes up to and including the last `\n`
fn complete_prefix(bytes: &[u8]) -> &[u8] {
    match bytes.iter().rposition(|b| *b == b'\n') {
        Some(i) => &bytes[..=i],
        None => &[],
    }
}

fn truncate(path: &Path, len: u64) -> Result<(), LogError> {
    OpenOptions::new()
        .write(true)
        .open(path)
        .and_then(|f| f.set_len(len))
        .map_err(|source| LogError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn encode_row<I, T>(fields: I) -> Result<Vec<u8>, LogError>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer
        .write_record(fields)
        .map_err(|e| LogError::Encode(e.to_string()))?;
    writer.into_inner().map_err(|e| LogError::Encode(e.to_string()))
}

fn reader(bytes: &[u8]) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes)
}

/// Tolerates stray spaces around column names
fn validate_header(path: &Path, bytes: &[u8]) -> Result<(), LogError> {
    let expected: Vec<String> = header().into_iter().map(str::to_string).collect();
    let found: Vec<String> = match reader(bytes).headers() {
        Ok(record) => record.iter().map(str::to_string).collect(),
        Err(_) => Vec::new(),
    };

    if found != expected {
        return Err(LogError::HeaderMismatch {
            path: path.to_path_buf(),
            found,
            expected,
        });
    }
    Ok(())
}

fn parse_entries(bytes: &[u8]) -> Vec<LogEntry> {
    let mut entries = Vec::new();
    for (i, record) in reader(bytes).records().enumerate() {
        let parsed = record
            .map_err(|e| e.to_string())
            .and_then(|r| LogEntry::from_row(&r));
        match parsed {
            Ok(entry) => entries.push(entry),
            // row 1 is the header
            Err(reason) => log::warn!("Skipping append log row {}: {}", i + 2, reason),
        }
    }
    entries
}
