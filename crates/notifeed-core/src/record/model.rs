//! Record data models.

use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Identifier of a notification record.
///
/// Server ids are the dedup key. Local ids are only minted for optimistic
/// records whose backend response carried no id; they never compare equal
/// to a server id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordId {
    /// Id assigned by the backend.
    Server(String),
    /// Id synthesized on the client for a not-yet-confirmed record.
    Local(Uuid),
}

impl RecordId {
    /// Creates a server id.
    #[must_use]
    pub fn server(id: impl Into<String>) -> Self {
        Self::Server(id.into())
    }

    /// Mints a fresh local id.
    #[must_use]
    pub fn local() -> Self {
        Self::Local(Uuid::new_v4())
    }

    /// Returns true if this id can key a cache entry.
    ///
    /// A blank server id is not usable.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        match self {
            Self::Server(id) => !id.trim().is_empty(),
            Self::Local(_) => true,
        }
    }

    /// Returns true for ids synthesized on the client.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Server(id) => f.write_str(id),
            Self::Local(uuid) => write!(f, "local-{uuid}"),
        }
    }
}

/// Canonical delivery status of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Queued or scheduled for later delivery.
    Pending,
    /// Delivered.
    Sent,
    /// Delivery failed.
    Failed,
    /// Cancelled before delivery.
    Cancelled,
}

impl Status {
    /// Parse a backend status string.
    ///
    /// Case-insensitive. `SCHEDULED` maps to [`Status::Pending`] and `ERROR`
    /// to [`Status::Failed`]. Returns `None` for anything else, including
    /// an empty string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" | "SCHEDULED" => Some(Self::Pending),
            "SENT" => Some(Self::Sent),
            "FAILED" | "ERROR" => Some(Self::Failed),
            "CANCELLED" | "CANCELED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Sent => "SENT",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notification as the client sees it.
///
/// All timestamps are optional: records from different sources carry
/// different subsets of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRecord {
    /// Dedup key.
    pub id: RecordId,
    /// Subject line (may be empty).
    pub subject: String,
    /// Message body (may be empty).
    pub body: String,
    /// Single recipient, when the backend reports one.
    pub recipient: Option<String>,
    /// Ordered recipient list, when the backend reports one.
    pub recipients: Vec<String>,
    /// Explicit status, if the source supplied a recognizable one.
    pub status: Option<Status>,
    /// When the record was created.
    pub created_at: Option<DateTime<Utc>>,
    /// Target delivery time for scheduled items.
    pub send_at_utc: Option<DateTime<Utc>>,
    /// Actual delivery time.
    pub sent_at: Option<DateTime<Utc>>,
}

impl NotificationRecord {
    /// Creates a record with only an id; every other field empty.
    #[must_use]
    pub const fn new(id: RecordId) -> Self {
        Self {
            id,
            subject: String::new(),
            body: String::new(),
            recipient: None,
            recipients: Vec::new(),
            status: None,
            created_at: None,
            send_at_utc: None,
            sent_at: None,
        }
    }

    /// Sets the subject.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets the single recipient.
    #[must_use]
    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }

    /// Sets the recipient list.
    #[must_use]
    pub fn with_recipients<I, S>(mut self, recipients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.recipients = recipients.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the explicit status.
    #[must_use]
    pub const fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the creation time.
    #[must_use]
    pub const fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    /// Sets the scheduled delivery time.
    #[must_use]
    pub const fn with_send_at_utc(mut self, at: DateTime<Utc>) -> Self {
        self.send_at_utc = Some(at);
        self
    }

    /// Sets the actual delivery time.
    #[must_use]
    pub const fn with_sent_at(mut self, at: DateTime<Utc>) -> Self {
        self.sent_at = Some(at);
        self
    }

    /// The recipient to display: `recipient`, else the first of `recipients`.
    #[must_use]
    pub fn display_recipient(&self) -> Option<&str> {
        self.recipient
            .as_deref()
            .or_else(|| self.recipients.first().map(String::as_str))
    }

    /// The first timestamp present of `created_at`, `sent_at`, `send_at_utc`.
    #[must_use]
    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.created_at.or(self.sent_at).or(self.send_at_utc)
    }

    /// The single timestamp used for ranking.
    ///
    /// Same chain as [`Self::latest_timestamp`]; a record with none of the
    /// fields sorts as the Unix epoch.
    #[must_use]
    pub fn effective_timestamp(&self) -> DateTime<Utc> {
        self.latest_timestamp().unwrap_or(DateTime::UNIX_EPOCH)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, min, 0).unwrap()
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(Status::parse("sent"), Some(Status::Sent));
        assert_eq!(Status::parse(" PENDING "), Some(Status::Pending));
        assert_eq!(Status::parse("Scheduled"), Some(Status::Pending));
        assert_eq!(Status::parse("ERROR"), Some(Status::Failed));
        assert_eq!(Status::parse("cancelled"), Some(Status::Cancelled));
        assert_eq!(Status::parse(""), None);
        assert_eq!(Status::parse("queued"), None);
    }

    #[test]
    fn test_record_id_usable() {
        assert!(RecordId::server("42").is_usable());
        assert!(!RecordId::server("   ").is_usable());
        assert!(RecordId::local().is_usable());
        assert!(RecordId::local().is_local());
        assert_ne!(RecordId::local(), RecordId::local());
    }

    #[test]
    fn test_record_id_display() {
        assert_eq!(RecordId::server("abc").to_string(), "abc");
        assert!(RecordId::local().to_string().starts_with("local-"));
    }

    #[test]
    fn test_display_recipient_prefers_single() {
        let record = NotificationRecord::new(RecordId::server("1"))
            .with_recipient("solo@example.com")
            .with_recipients(["first@example.com", "second@example.com"]);
        assert_eq!(record.display_recipient(), Some("solo@example.com"));

        let record = NotificationRecord::new(RecordId::server("2"))
            .with_recipients(["first@example.com", "second@example.com"]);
        assert_eq!(record.display_recipient(), Some("first@example.com"));

        let record = NotificationRecord::new(RecordId::server("3"));
        assert_eq!(record.display_recipient(), None);
    }

    #[test]
    fn test_effective_timestamp_fallback_chain() {
        let all = NotificationRecord::new(RecordId::server("1"))
            .with_created_at(at(1))
            .with_sent_at(at(2))
            .with_send_at_utc(at(3));
        assert_eq!(all.effective_timestamp(), at(1));

        let sent_and_scheduled = NotificationRecord::new(RecordId::server("2"))
            .with_sent_at(at(2))
            .with_send_at_utc(at(3));
        assert_eq!(sent_and_scheduled.effective_timestamp(), at(2));

        let scheduled = NotificationRecord::new(RecordId::server("3")).with_send_at_utc(at(3));
        assert_eq!(scheduled.effective_timestamp(), at(3));

        let bare = NotificationRecord::new(RecordId::server("4"));
        assert_eq!(bare.effective_timestamp(), DateTime::UNIX_EPOCH);
    }

    #[test]
    fn test_latest_timestamp_matches_ranking_chain() {
        let sent_and_scheduled = NotificationRecord::new(RecordId::server("1"))
            .with_sent_at(at(2))
            .with_send_at_utc(at(3));
        assert_eq!(sent_and_scheduled.latest_timestamp(), Some(at(2)));
        assert_eq!(
            sent_and_scheduled.latest_timestamp(),
            Some(sent_and_scheduled.effective_timestamp())
        );

        let bare = NotificationRecord::new(RecordId::server("2"));
        assert_eq!(bare.latest_timestamp(), None);
    }
}
