//! Normalization of backend payloads into [`NotificationRecord`]s.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::model::{NotificationRecord, RecordId, Status};
use crate::{Error, Result};

/// A notification exactly as the backend sends it.
///
/// Field names differ between endpoints, so several aliases are accepted.
/// Everything is optional; [`normalize`] decides what is usable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNotification {
    /// String or numeric id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Subject line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Message body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Single recipient.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    /// Recipient list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipients: Option<Vec<String>>,
    /// Status string (`status` or `state`).
    #[serde(default, alias = "state", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Creation time (`createdAt` or `created_at`).
    #[serde(default, alias = "created_at", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Scheduled time (`sendAtUtc` or `scheduledFor`).
    #[serde(default, alias = "scheduledFor", skip_serializing_if = "Option::is_none")]
    pub send_at_utc: Option<String>,
    /// Delivery time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<String>,
}

/// How to fill gaps while normalizing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Used as `created_at` when the payload has none.
    pub fallback_created_at: Option<DateTime<Utc>>,
    /// Used as `send_at_utc` when the payload has none.
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Mint a local id when the payload has no usable id.
    pub synthesize_id: bool,
}

impl NormalizeOptions {
    /// Options for records read from a snapshot: no fallbacks, no local ids.
    #[must_use]
    pub fn snapshot() -> Self {
        Self::default()
    }

    /// Options for records returned by a send or schedule action at `now`.
    #[must_use]
    pub const fn optimistic(now: DateTime<Utc>, scheduled_at: Option<DateTime<Utc>>) -> Self {
        Self {
            fallback_created_at: Some(now),
            scheduled_at,
            synthesize_id: true,
        }
    }
}

/// Normalize a backend payload into a record.
///
/// # Errors
///
/// Returns [`Error::MalformedRecord`] if the payload has no usable id and
/// `options.synthesize_id` is not set.
pub fn normalize(raw: &RawNotification, options: &NormalizeOptions) -> Result<NotificationRecord> {
    let id = match raw.id.as_ref().and_then(id_from_value) {
        Some(id) => RecordId::Server(id),
        None if options.synthesize_id => RecordId::local(),
        None => {
            return Err(Error::MalformedRecord(format!(
                "missing or unusable id: {:?}",
                raw.id
            )));
        }
    };

    Ok(NotificationRecord {
        id,
        subject: raw.subject.clone().unwrap_or_default(),
        body: raw.body.clone().unwrap_or_default(),
        recipient: raw.recipient.clone().filter(|r| !r.trim().is_empty()),
        recipients: raw.recipients.clone().unwrap_or_default(),
        status: raw.status.as_deref().and_then(Status::parse),
        created_at: parse_field(raw.created_at.as_deref()).or(options.fallback_created_at),
        send_at_utc: parse_field(raw.send_at_utc.as_deref()).or(options.scheduled_at),
        sent_at: parse_field(raw.sent_at.as_deref()),
    })
}

/// Split a free-form recipient field on commas and whitespace.
#[must_use]
pub fn parse_recipients(text: &str) -> Vec<String> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(str::to_owned)
        .collect()
}

fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_field(value: Option<&str>) -> Option<DateTime<Utc>> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    let parsed = parse_timestamp(value);
    if parsed.is_none() {
        debug!("Ignoring unparseable timestamp {value:?}");
    }
    parsed
}

/// Parse an RFC 3339 timestamp, or a zone-less one interpreted as UTC.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, m, 0).unwrap()
    }

    #[test]
    fn test_deserialize_aliases() {
        let json = r#"{
            "id": 17,
            "subject": "Hello",
            "recipients": ["a@example.com", "b@example.com"],
            "state": "scheduled",
            "created_at": "2024-01-01T00:00:00Z",
            "scheduledFor": "2024-01-01T01:30:00Z",
            "unknownField": true
        }"#;

        let raw: RawNotification = serde_json::from_str(json).unwrap();
        let record = normalize(&raw, &NormalizeOptions::snapshot()).unwrap();

        assert_eq!(record.id, RecordId::server("17"));
        assert_eq!(record.subject, "Hello");
        assert_eq!(record.body, "");
        assert_eq!(record.display_recipient(), Some("a@example.com"));
        assert_eq!(record.status, Some(Status::Pending));
        assert_eq!(record.created_at, Some(ts(0, 0)));
        assert_eq!(record.send_at_utc, Some(ts(1, 30)));
        assert_eq!(record.sent_at, None);
    }

    #[test]
    fn test_missing_id_is_malformed_for_snapshots() {
        let raw = RawNotification {
            subject: Some("orphan".into()),
            ..RawNotification::default()
        };
        let err = normalize(&raw, &NormalizeOptions::snapshot()).unwrap_err();
        assert!(matches!(err, Error::MalformedRecord(_)));

        let blank = RawNotification {
            id: Some(Value::String("  ".into())),
            ..RawNotification::default()
        };
        assert!(normalize(&blank, &NormalizeOptions::snapshot()).is_err());

        let object = RawNotification {
            id: Some(serde_json::json!({"nested": 1})),
            ..RawNotification::default()
        };
        assert!(normalize(&object, &NormalizeOptions::snapshot()).is_err());
    }

    #[test]
    fn test_optimistic_options_fill_gaps() {
        let now = ts(9, 0);
        let scheduled = ts(10, 0);
        let raw = RawNotification {
            subject: Some("queued".into()),
            ..RawNotification::default()
        };

        let record = normalize(&raw, &NormalizeOptions::optimistic(now, Some(scheduled))).unwrap();
        assert!(record.id.is_local());
        assert_eq!(record.created_at, Some(now));
        assert_eq!(record.send_at_utc, Some(scheduled));
    }

    #[test]
    fn test_payload_values_win_over_fallbacks() {
        let raw = RawNotification {
            id: Some(Value::String("abc".into())),
            created_at: Some("2024-01-01T02:00:00Z".into()),
            send_at_utc: Some("2024-01-01T03:00:00Z".into()),
            ..RawNotification::default()
        };
        let record =
            normalize(&raw, &NormalizeOptions::optimistic(ts(9, 0), Some(ts(10, 0)))).unwrap();

        assert_eq!(record.id, RecordId::server("abc"));
        assert_eq!(record.created_at, Some(ts(2, 0)));
        assert_eq!(record.send_at_utc, Some(ts(3, 0)));
    }

    #[test]
    fn test_timestamp_formats() {
        assert_eq!(parse_timestamp("2024-01-01T05:10:00+02:00"), Some(ts(3, 10)));
        assert_eq!(parse_timestamp("2024-01-01T05:10:00"), Some(ts(5, 10)));
        assert_eq!(parse_timestamp("2024-01-01T05:10:00.250").map(|t| t.timestamp()), Some(ts(5, 10).timestamp()));
        assert_eq!(parse_timestamp("2024-01-01T05:10"), Some(ts(5, 10)));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_unparseable_timestamp_is_absent() {
        let raw = RawNotification {
            id: Some(Value::from(1)),
            created_at: Some("not a date".into()),
            sent_at: Some(String::new()),
            ..RawNotification::default()
        };
        let record = normalize(&raw, &NormalizeOptions::snapshot()).unwrap();
        assert_eq!(record.created_at, None);
        assert_eq!(record.sent_at, None);
    }

    #[test]
    fn test_unknown_status_is_absent() {
        let raw = RawNotification {
            id: Some(Value::from(1)),
            status: Some("queued".into()),
            ..RawNotification::default()
        };
        assert_eq!(normalize(&raw, &NormalizeOptions::snapshot()).unwrap().status, None);
    }

    #[test]
    fn test_parse_recipients() {
        assert_eq!(
            parse_recipients("a@example.com, b@example.com\nc@example.com,,"),
            vec!["a@example.com", "b@example.com", "c@example.com"]
        );
        assert!(parse_recipients("  , ").is_empty());
    }
}
