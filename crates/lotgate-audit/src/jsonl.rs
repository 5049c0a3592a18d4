//! # JSON-Lines Audit Log
//!
//! One sealed event per line. Every `append_all` writes its lines with a
//! single `write_all`, then flushes and syncs before the events become
//! visible to readers.
//!
//! A failed write is rolled back by truncating the file to its length
//! before the append. If the truncation also fails the log is poisoned and
//! refuses further appends until it is repaired and reopened.
//!
//! Opening an existing file loads and verifies its chain; appends continue
//! from its head.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::chain::{verify_chain, ChainHead};
use crate::error::AuditError;
use crate::event::{AuditDraft, AuditEvent};
use crate::sink::AuditSink;

/// File-backed append-only log.
#[derive(Debug)]
pub struct JsonlAuditLog {
    path: PathBuf,
    inner: Mutex<FileState>,
}

#[derive(Debug)]
struct FileState {
    file: Box<dyn LogFile>,
    head: ChainHead,
    events: Vec<AuditEvent>,
    poisoned: bool,
}

/// Backing storage for the log.
trait LogFile: Send + std::fmt::Debug {
    /// Current length in bytes.
    fn byte_len(&self) -> io::Result<u64>;
    /// Write `buf` in full and sync it to disk.
    fn write_durably(&mut self, buf: &[u8]) -> io::Result<()>;
    /// Cut the file back to `len` bytes.
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl LogFile for File {
    fn byte_len(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn write_durably(&mut self, buf: &[u8]) -> io::Result<()> {
        self.write_all(buf)?;
        self.flush()?;
        self.sync_data()
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)?;
        self.sync_data()
    }
}

impl JsonlAuditLog {
    /// Open (or create) the log at `path`.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened, a line is malformed, or the
    /// existing chain does not verify.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();
        let events = if path.exists() {
            read_jsonl(&path)?
        } else {
            Vec::new()
        };
        verify_chain(&events)?;
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        tracing::info!(path = %path.display(), events = events.len(), "audit log opened");
        Ok(Self {
            path,
            inner: Mutex::new(FileState {
                file: Box::new(file),
                head: ChainHead::after(&events),
                events,
                poisoned: false,
            }),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for JsonlAuditLog {
    fn append_all(&self, drafts: Vec<AuditDraft>) -> Result<Vec<AuditEvent>, AuditError> {
        let mut guard = self.inner.lock();
        let state = &mut *guard;
        if state.poisoned {
            return Err(AuditError::Unavailable(format!(
                "audit log {} holds a partial write and must be repaired",
                self.path.display()
            )));
        }
        let (sealed, head) = state.head.seal_all(drafts)?;

        let mut buf = Vec::new();
        for event in &sealed {
            serde_json::to_writer(&mut buf, event)?;
            buf.push(b'\n');
        }
        let committed_len = state.file.byte_len()?;
        if let Err(e) = state.file.write_durably(&buf) {
            tracing::error!(path = %self.path.display(), error = %e, "audit append failed");
            if let Err(rollback) = state.file.truncate(committed_len) {
                state.poisoned = true;
                tracing::error!(
                    path = %self.path.display(),
                    error = %rollback,
                    "audit rollback failed, log poisoned"
                );
            }
            return Err(e.into());
        }

        state.events.extend(sealed.iter().cloned());
        state.head = head;
        tracing::debug!(count = sealed.len(), "audit events persisted");
        Ok(sealed)
    }

    fn events(&self) -> Vec<AuditEvent> {
        self.inner.lock().events.clone()
    }

    fn len(&self) -> usize {
        self.inner.lock().events.len()
    }
}

/// Read every event from a JSON-lines log without verifying it.
///
/// Blank lines are skipped.
pub fn read_jsonl(path: impl AsRef<Path>) -> Result<Vec<AuditEvent>, AuditError> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let mut events = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event = serde_json::from_str(&line).map_err(|source| AuditError::MalformedLine {
            line: index + 1,
            source,
        })?;
        events.push(event);
    }
    Ok(events)
}
