//! Durable append-only logs: the raw meeting log (JSONL) and the attendee
//! audit log (CSV).
//!
//! Both logs are write-once, read-many. Each append takes an internal mutex
//! and writes the whole record with a single `write_all`, so concurrent
//! webhook events cannot interleave partial records.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::{json, Value};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::model::OutcomeRecord;

const AUDIT_HEADER: &str =
    "timestamp,attendee_name,attendee_email,meeting_title,status,pipedrive_person_id\n";

/// Sentinel written to the `pipedrive_person_id` column when no contact
/// matched. Read by the external viewer; format-stable.
const NO_PERSON_ID: &str = "N/A";

/// Append-only JSONL log of every raw webhook payload received.
///
/// Writing here is the precondition for all downstream processing: if this
/// append fails, the webhook itself reports failure.
#[derive(Debug)]
pub struct RawEventLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl RawEventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one `{"received_at": ..., "payload": ...}` line.
    pub async fn append(&self, payload: &Value) -> Result<()> {
        let entry = json!({
            "received_at": Utc::now().to_rfc3339(),
            "payload": payload,
        });
        let mut line = serde_json::to_string(&entry).context("failed to encode raw log entry")?;
        line.push('\n');

        let _guard = self.lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("failed to open raw log {}", self.path.display()))?;
        file.write_all(line.as_bytes())
            .await
            .with_context(|| format!("failed to append to raw log {}", self.path.display()))?;
        // tokio's File buffers internally; without the flush a dropped handle
        // can lose the append after reporting success.
        file.flush()
            .await
            .with_context(|| format!("failed to flush raw log {}", self.path.display()))?;
        Ok(())
    }
}

/// Append-only CSV audit log, one row per processed (non-excluded) attendee.
///
/// The header row is written once, when the file does not yet exist. Rows are
/// never mutated or deleted.
#[derive(Debug)]
pub struct AuditLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one outcome row, emitting the header first on the very first
    /// write.
    pub async fn append(&self, record: &OutcomeRecord) -> Result<()> {
        let person_id = record
            .person_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| NO_PERSON_ID.to_string());
        let row = format!(
            "{},{},{},{},{},{}\n",
            csv_field(&record.timestamp.to_rfc3339()),
            csv_field(&record.attendee_name),
            csv_field(&record.attendee_email),
            csv_field(&record.meeting_title),
            csv_field(record.status.as_str()),
            csv_field(&person_id),
        );

        let _guard = self.lock.lock().await;
        let exists = tokio::fs::try_exists(&self.path)
            .await
            .with_context(|| format!("failed to stat audit log {}", self.path.display()))?;
        let mut buf = String::new();
        if !exists {
            buf.push_str(AUDIT_HEADER);
        }
        buf.push_str(&row);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("failed to open audit log {}", self.path.display()))?;
        file.write_all(buf.as_bytes())
            .await
            .with_context(|| format!("failed to append to audit log {}", self.path.display()))?;
        file.flush()
            .await
            .with_context(|| format!("failed to flush audit log {}", self.path.display()))?;
        Ok(())
    }
}

/// Quote a CSV field if it contains a delimiter, quote, or line break.
fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OutcomeStatus;
    use serde_json::json;
    use tempfile::tempdir;

    fn record(title: &str, status: OutcomeStatus, person_id: Option<i64>) -> OutcomeRecord {
        OutcomeRecord {
            timestamp: Utc::now(),
            attendee_name: "Alice".to_string(),
            attendee_email: "alice@ext.com".to_string(),
            meeting_title: title.to_string(),
            status,
            person_id,
        }
    }

    #[test]
    fn csv_field_quotes_only_when_needed() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("line\nbreak"), "\"line\nbreak\"");
    }

    #[tokio::test]
    async fn audit_header_written_exactly_once() {
        let td = tempdir().unwrap();
        let log = AuditLog::new(td.path().join("audit.csv"));

        log.append(&record("Sync", OutcomeStatus::FoundAndNoteAdded, Some(42)))
            .await
            .unwrap();
        log.append(&record("Sync", OutcomeStatus::NotFoundInCrm, None))
            .await
            .unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], AUDIT_HEADER.trim_end());
        assert_eq!(content.matches("timestamp,").count(), 1);
        assert!(lines[1].ends_with("Found and Note Added,42"));
        assert!(lines[2].ends_with("Not Found in Pipedrive,N/A"));
    }

    #[tokio::test]
    async fn audit_quotes_title_with_commas() {
        let td = tempdir().unwrap();
        let log = AuditLog::new(td.path().join("audit.csv"));

        log.append(&record(
            "Sync, planning",
            OutcomeStatus::FoundButNoteFailed,
            Some(7),
        ))
        .await
        .unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        assert!(content.contains("\"Sync, planning\""));
    }

    #[tokio::test]
    async fn raw_log_appends_one_line_per_event() {
        let td = tempdir().unwrap();
        let log = RawEventLog::new(td.path().join("raw.jsonl"));

        log.append(&json!({"title": "Sync"})).await.unwrap();
        log.append(&json!({"title": "Retro"})).await.unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        let entries: Vec<Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["payload"]["title"], "Sync");
        assert!(entries[1]["received_at"].is_string());
    }
}
