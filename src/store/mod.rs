//! Audit record storage on the callee side.
//!
//! Records arrive at-least-once from every caller process. The store keys them by
//! request id, so redelivery returns the id assigned the first time.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use dashmap::DashMap;
use thiserror::Error;

use crate::observability::metrics;
use crate::probe::types::AuditRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record has an empty request id")]
    MissingRequestId,

    #[error("record log {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("record writer poisoned")]
    Poisoned,
}

/// Result of consuming one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consumed {
    Stored(i64),
    Duplicate(i64),
}

impl Consumed {
    pub fn id(&self) -> i64 {
        match self {
            Consumed::Stored(id) | Consumed::Duplicate(id) => *id,
        }
    }
}

/// Idempotent record store with optional JSON-lines persistence.
///
/// Lookups go through the map alone. New records pass through one writer, which
/// assigns the id only once the record is durable, so ids have no gaps.
pub struct RecordStore {
    records: DashMap<String, AuditRecord>,
    writer: Mutex<Writer>,
}

struct Writer {
    next_id: i64,
    log: Option<(PathBuf, File)>,
}

impl Writer {
    fn append(&mut self, record: &AuditRecord) -> Result<(), StoreError> {
        let Some((path, file)) = &mut self.log else {
            return Ok(());
        };
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let io_err = |source| StoreError::Io {
            path: path.clone(),
            source,
        };
        file.write_all(&line).map_err(io_err)?;
        file.sync_data().map_err(io_err)
    }
}

impl RecordStore {
    /// Memory-only store.
    pub fn in_memory() -> Self {
        Self {
            records: DashMap::new(),
            writer: Mutex::new(Writer {
                next_id: 1,
                log: None,
            }),
        }
    }

    /// Open the log at `path`, replaying existing records.
    ///
    /// Unparseable lines (for example a torn last write) are skipped.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let io_err = |source| StoreError::Io {
            path: path.clone(),
            source,
        };

        let records = DashMap::new();
        let mut max_id = 0;
        let mut needs_newline = false;
        if path.exists() {
            let content = fs::read_to_string(&path).map_err(io_err)?;
            needs_newline = !content.is_empty() && !content.ends_with('\n');
            for (line_no, line) in content.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<AuditRecord>(line) {
                    Ok(record) => {
                        max_id = max_id.max(record.id.unwrap_or(0));
                        records.insert(record.request_id.clone(), record);
                    }
                    Err(e) => tracing::warn!(
                        path = %path.display(),
                        line = line_no + 1,
                        error = %e,
                        "Skipping unreadable record"
                    ),
                }
            }
            tracing::info!(count = records.len(), path = %path.display(), "Loaded records from log");
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_err)?;
        if needs_newline {
            // Keep the next record off the torn line.
            file.write_all(b"\n").map_err(io_err)?;
        }

        Ok(Self {
            records,
            writer: Mutex::new(Writer {
                next_id: max_id + 1,
                log: Some((path, file)),
            }),
        })
    }

    /// Store a delivered record unless its request id is already known.
    ///
    /// A new record is durable before it becomes visible; if persisting fails the
    /// delivery is refused so the producer can redeliver.
    pub fn consume(&self, mut record: AuditRecord) -> Result<Consumed, StoreError> {
        if record.request_id.trim().is_empty() {
            return Err(StoreError::MissingRequestId);
        }

        let consumed = match self.existing_id(&record.request_id) {
            Some(id) => Consumed::Duplicate(id),
            None => {
                let mut writer = self.writer.lock().map_err(|_| StoreError::Poisoned)?;
                // Another delivery may have been stored while waiting for the writer.
                match self.existing_id(&record.request_id) {
                    Some(id) => Consumed::Duplicate(id),
                    None => {
                        let id = writer.next_id;
                        record.id = Some(id);
                        writer.append(&record)?;
                        writer.next_id += 1;
                        self.records.insert(record.request_id.clone(), record);
                        Consumed::Stored(id)
                    }
                }
            }
        };

        metrics::record_consumed(matches!(consumed, Consumed::Duplicate(_)));
        Ok(consumed)
    }

    pub fn get(&self, request_id: &str) -> Option<AuditRecord> {
        self.records.get(request_id).map(|r| r.value().clone())
    }

    /// All records ordered by id.
    pub fn list(&self) -> Vec<AuditRecord> {
        let mut all: Vec<AuditRecord> = self.records.iter().map(|r| r.value().clone()).collect();
        all.sort_by_key(|r| r.id);
        all
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn existing_id(&self, request_id: &str) -> Option<i64> {
        self.records.get(request_id).map(|r| r.id.unwrap_or(0))
    }
}
