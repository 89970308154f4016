//! Plain-text rendering of the recent-activity view.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use notifeed_core::{ActivityRow, RecentView, SendOutcome, Status, relative_time};

const SUBJECT_WIDTH: usize = 28;
const RECIPIENT_WIDTH: usize = 26;

/// Render the counters line followed by one line per row.
pub fn view(view: &RecentView, now: DateTime<Utc>) -> String {
    let mut out = format!(
        "Recent activity  sent {} \u{b7} pending {} \u{b7} failed {}\n",
        view.counts.sent, view.counts.pending, view.counts.failed
    );

    if view.rows.is_empty() {
        out.push_str("  (nothing to show)\n");
        return out;
    }

    for row in &view.rows {
        let _ = writeln!(out, "  {}", line(row, now));
    }
    out
}

fn line(row: &ActivityRow, now: DateTime<Utc>) -> String {
    let when = match (row.status, row.scheduled_for) {
        (Status::Pending, Some(at)) => format!("scheduled {}", relative_time(at, now)),
        _ => row
            .timestamp
            .map_or_else(|| "-".to_owned(), |at| relative_time(at, now)),
    };

    format!(
        "{:<9} {:<sw$} {:<rw$} {when}",
        row.status.as_str(),
        truncate(&row.subject, SUBJECT_WIDTH),
        truncate(&row.recipient, RECIPIENT_WIDTH),
        sw = SUBJECT_WIDTH,
        rw = RECIPIENT_WIDTH,
    )
}

/// Message shown after a send or schedule action.
pub fn outcome(outcome: SendOutcome) -> String {
    match outcome {
        SendOutcome::AllSent(1) => "Notification sent.".to_owned(),
        SendOutcome::AllSent(n) => format!("Sent {n} notifications."),
        SendOutcome::Partial { sent, remaining } => {
            format!("Sent {sent}; {remaining} still pending or failed.")
        }
        SendOutcome::NoneSent => "Nothing was sent yet; check the list below.".to_owned(),
        SendOutcome::Scheduled(1) => "Notification scheduled.".to_owned(),
        SendOutcome::Scheduled(n) => format!("Scheduled {n} notifications."),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_owned();
    }
    let mut short: String = text.chars().take(width.saturating_sub(1)).collect();
    short.push('\u{2026}');
    short
}
