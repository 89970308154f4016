//! Notification backend collaborator.
//!
//! The feed talks to the backend only through [`NotificationBackend`]:
//! listing active notifications, sending now, and scheduling. Transport is
//! up to the implementor; [`InMemoryBackend`] keeps everything in process
//! memory.

mod memory;

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{RawNotification, parse_recipients};

pub use memory::InMemoryBackend;

/// Errors reported by a backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The backend could not be reached or did not answer.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// The backend refused the request.
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A message composed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    /// Recipient addresses.
    pub recipients: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// Message body.
    pub body: String,
}

impl Draft {
    /// Creates a draft.
    #[must_use]
    pub fn new(recipients: Vec<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            recipients,
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Creates a draft from compose-form fields.
    ///
    /// The recipient field may hold several addresses separated by commas
    /// or whitespace.
    #[must_use]
    pub fn from_form(recipients: &str, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(parse_recipients(recipients), subject, body)
    }
}

/// Response to a send or schedule request: one record or several.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SendResponse {
    /// One record per recipient.
    Many(Vec<RawNotification>),
    /// A single record.
    One(RawNotification),
}

impl SendResponse {
    /// Flattens the response into a list.
    #[must_use]
    pub fn into_records(self) -> Vec<RawNotification> {
        match self {
            Self::Many(records) => records,
            Self::One(record) => vec![record],
        }
    }
}

impl From<Vec<RawNotification>> for SendResponse {
    fn from(records: Vec<RawNotification>) -> Self {
        Self::Many(records)
    }
}

/// Operations the recent-activity feed needs from the notification service.
pub trait NotificationBackend: Send + Sync {
    /// Lists non-archived notifications of any status.
    fn list_active(
        &self,
    ) -> impl Future<Output = Result<Vec<RawNotification>, BackendError>> + Send;

    /// Sends a draft immediately.
    fn send_now(
        &self,
        draft: &Draft,
    ) -> impl Future<Output = Result<SendResponse, BackendError>> + Send;

    /// Schedules a draft for delivery at `send_at_utc`.
    fn schedule_send(
        &self,
        draft: &Draft,
        send_at_utc: DateTime<Utc>,
    ) -> impl Future<Output = Result<SendResponse, BackendError>> + Send;
}
