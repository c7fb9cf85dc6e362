//! JSON-lines file sink.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::probe::types::AuditRecord;
use crate::sink::{AuditSink, SinkError};

/// Appends each record as one JSON line and syncs before acknowledging.
pub struct FileSink {
    path: PathBuf,
    // Serializes appends from overlapping ticks within this process.
    write_lock: Mutex<()>,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditSink for FileSink {
    async fn publish(&self, record: &AuditRecord) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let _held = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.sync_data().await?;

        tracing::debug!(request_id = %record.request_id, path = %self.path.display(), "Record appended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::types::{local_timestamp, ResultKind};
    use tempfile::TempDir;

    fn record(id: &str) -> AuditRecord {
        AuditRecord {
            id: None,
            request_id: id.to_string(),
            message: "World".into(),
            status: 200,
            timestamp: local_timestamp(),
            result_kind: ResultKind::Success,
        }
    }

    #[tokio::test]
    async fn test_appends_one_line_per_record() {
        let dir = TempDir::new().unwrap();
        let sink = FileSink::new(dir.path().join("audit.jsonl"));

        sink.publish(&record("a")).await.unwrap();
        sink.publish(&record("b")).await.unwrap();

        let content = std::fs::read_to_string(sink.path()).unwrap();
        let ids: Vec<String> = content
            .lines()
            .map(|l| serde_json::from_str::<AuditRecord>(l).unwrap().request_id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_unwritable_path_is_an_error() {
        let dir = TempDir::new().unwrap();
        let sink = FileSink::new(dir.path());
        assert!(matches!(sink.publish(&record("a")).await, Err(SinkError::Io(_))));
    }
}
