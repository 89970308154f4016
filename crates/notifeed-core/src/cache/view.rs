//! Read view over a [`RecentCache`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use super::recent::RecentCache;
use crate::Error;
use crate::record::{NotificationRecord, RecordId, Status, derive_status};

/// Placeholder shown for an empty subject.
pub const NO_SUBJECT: &str = "(no subject)";
/// Placeholder shown when a record has no recipient.
pub const NO_RECIPIENT: &str = "\u{2014}";

/// Status tab selected in the activity panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusTab {
    /// Every record.
    #[default]
    All,
    /// Pending (and scheduled) records.
    Pending,
    /// Delivered records.
    Sent,
    /// Failed records.
    Failed,
    /// Cancelled records.
    Cancelled,
}

impl StatusTab {
    /// Returns true if a record with `status` belongs on this tab.
    #[must_use]
    pub fn matches(self, status: Status) -> bool {
        match self {
            Self::All => true,
            Self::Pending => status == Status::Pending,
            Self::Sent => status == Status::Sent,
            Self::Failed => status == Status::Failed,
            Self::Cancelled => status == Status::Cancelled,
        }
    }
}

impl FromStr for StatusTab {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() || s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        match Status::parse(s) {
            Some(Status::Pending) => Ok(Self::Pending),
            Some(Status::Sent) => Ok(Self::Sent),
            Some(Status::Failed) => Ok(Self::Failed),
            Some(Status::Cancelled) => Ok(Self::Cancelled),
            None => Err(Error::Config(format!("unknown status tab: {s}"))),
        }
    }
}

impl fmt::Display for StatusTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "ALL",
            Self::Pending => "PENDING",
            Self::Sent => "SENT",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        })
    }
}

/// Filters applied to the read view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewQuery {
    /// Case-insensitive substring searched across subject, body,
    /// recipients and derived status. Blank matches everything.
    pub text: String,
    /// Status tab.
    pub tab: StatusTab,
}

impl ViewQuery {
    /// Creates a query with search text and the `All` tab.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tab: StatusTab::All,
        }
    }

    /// Sets the status tab.
    #[must_use]
    pub const fn with_tab(mut self, tab: StatusTab) -> Self {
        self.tab = tab;
        self
    }
}

/// Status counters over the whole cache, not the filtered rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityCounts {
    /// Delivered.
    pub sent: usize,
    /// Pending or scheduled.
    pub pending: usize,
    /// Failed.
    pub failed: usize,
}

/// One display-ready row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRow {
    /// Record id.
    pub id: RecordId,
    /// Subject, or [`NO_SUBJECT`].
    pub subject: String,
    /// Display recipient, or [`NO_RECIPIENT`].
    pub recipient: String,
    /// Status derived at view time.
    pub status: Status,
    /// Ranking timestamp; `None` when the record carries no timestamps.
    pub timestamp: Option<DateTime<Utc>>,
    /// Scheduled delivery time, if any.
    pub scheduled_for: Option<DateTime<Utc>>,
}

/// Filtered rows plus counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecentView {
    /// Rows in ranked order.
    pub rows: Vec<ActivityRow>,
    /// Counters over every cached record.
    pub counts: ActivityCounts,
}

impl RecentCache {
    /// Build the read view at `now`.
    ///
    /// Statuses are derived here on every call, since a scheduled record
    /// turns from pending to sent as time passes.
    #[must_use]
    pub fn view(&self, query: &ViewQuery, now: DateTime<Utc>) -> RecentView {
        let needle = query.text.trim().to_lowercase();
        let mut view = RecentView::default();

        for record in self.records() {
            let status = derive_status(record, now);
            match status {
                Status::Sent => view.counts.sent += 1,
                Status::Pending => view.counts.pending += 1,
                Status::Failed => view.counts.failed += 1,
                Status::Cancelled => {}
            }

            if query.tab.matches(status) && matches_text(record, status, &needle) {
                view.rows.push(row(record, status));
            }
        }

        view
    }
}

fn matches_text(record: &NotificationRecord, status: Status, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    [record.subject.as_str(), record.body.as_str(), status.as_str()]
        .into_iter()
        .chain(record.recipient.as_deref())
        .chain(record.recipients.iter().map(String::as_str))
        .any(|field| field.to_lowercase().contains(needle))
}

fn row(record: &NotificationRecord, status: Status) -> ActivityRow {
    let subject = if record.subject.trim().is_empty() {
        NO_SUBJECT.to_owned()
    } else {
        record.subject.clone()
    };

    ActivityRow {
        id: record.id.clone(),
        subject,
        recipient: record
            .display_recipient()
            .unwrap_or(NO_RECIPIENT)
            .to_owned(),
        status,
        timestamp: record.latest_timestamp(),
        scheduled_for: record.send_at_utc,
    }
}
