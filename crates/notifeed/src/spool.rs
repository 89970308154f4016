//! JSON spool file acting as the notification backend.
//!
//! The file holds a JSON array of notifications in the backend's own
//! shape. Other tools (or another `notifeed` process) can edit it while a
//! feed is watching; every poll re-reads it.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use notifeed_core::{
    BackendError, Draft, NotificationBackend, RawNotification, SendResponse, Status,
};

/// Backend reading and appending to a JSON spool file.
#[derive(Debug)]
pub struct SpoolBackend {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl SpoolBackend {
    /// Creates a backend over `path`. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the spool file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Vec<RawNotification>, BackendError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(Vec::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, records: &[RawNotification]) -> Result<(), BackendError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(records)?;
        tokio::fs::write(&self.path, contents).await?;
        Ok(())
    }

    async fn append(
        &self,
        draft: &Draft,
        status: Status,
        send_at_utc: Option<DateTime<Utc>>,
    ) -> Result<SendResponse, BackendError> {
        if draft.recipients.is_empty() {
            return Err(BackendError::Rejected(
                "at least one recipient is required".into(),
            ));
        }

        let _guard = self.write_lock.lock().await;
        let mut records = self.read().await?;
        let mut next_id = records
            .iter()
            .filter_map(|r| r.id.as_ref().and_then(Value::as_u64))
            .max()
            .unwrap_or(0)
            + 1;

        let now = stamp(Utc::now());
        let created: Vec<_> = draft
            .recipients
            .iter()
            .map(|recipient| {
                let record = RawNotification {
                    id: Some(Value::from(next_id)),
                    subject: Some(draft.subject.clone()),
                    body: Some(draft.body.clone()),
                    recipient: Some(recipient.clone()),
                    recipients: None,
                    status: Some(status.as_str().to_owned()),
                    created_at: Some(now.clone()),
                    send_at_utc: send_at_utc.map(stamp),
                    sent_at: (status == Status::Sent).then(|| now.clone()),
                };
                next_id += 1;
                record
            })
            .collect();

        records.extend(created.iter().cloned());
        self.write(&records).await?;
        debug!(
            "Appended {} record(s) to {}",
            created.len(),
            self.path.display()
        );

        Ok(SendResponse::Many(created))
    }
}

impl NotificationBackend for SpoolBackend {
    async fn list_active(&self) -> Result<Vec<RawNotification>, BackendError> {
        self.read().await
    }

    async fn send_now(&self, draft: &Draft) -> Result<SendResponse, BackendError> {
        self.append(draft, Status::Sent, None).await
    }

    async fn schedule_send(
        &self,
        draft: &Draft,
        send_at_utc: DateTime<Utc>,
    ) -> Result<SendResponse, BackendError> {
        if send_at_utc <= Utc::now() {
            return Err(BackendError::Rejected(
                "schedule time must be in the future".into(),
            ));
        }
        self.append(draft, Status::Pending, Some(send_at_utc)).await
    }
}

fn stamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
