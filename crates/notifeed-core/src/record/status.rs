//! Status derivation.

use chrono::{DateTime, Utc};

use super::model::{NotificationRecord, Status};

/// Derive the canonical status of a record at `now`.
///
/// An explicit status wins. Otherwise a delivery time means [`Status::Sent`],
/// a scheduled time still ahead of `now` means [`Status::Pending`], and a
/// record with neither signal is treated as already delivered.
///
/// The result depends on `now`, so callers must not cache it.
#[must_use]
pub fn derive_status(record: &NotificationRecord, now: DateTime<Utc>) -> Status {
    if let Some(status) = record.status {
        return status;
    }
    if record.sent_at.is_some() {
        return Status::Sent;
    }
    match record.send_at_utc {
        Some(send_at) if send_at > now => Status::Pending,
        _ => Status::Sent,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::record::RecordId;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn bare() -> NotificationRecord {
        NotificationRecord::new(RecordId::server("1"))
    }

    #[test]
    fn test_explicit_status_wins() {
        let record = bare()
            .with_status(Status::Failed)
            .with_sent_at(now() - Duration::minutes(1));
        assert_eq!(derive_status(&record, now()), Status::Failed);

        let record = bare()
            .with_status(Status::Pending)
            .with_send_at_utc(now() - Duration::days(1));
        assert_eq!(derive_status(&record, now()), Status::Pending);
    }

    #[test]
    fn test_sent_at_means_sent_regardless_of_schedule() {
        let record = bare()
            .with_sent_at(now() - Duration::minutes(5))
            .with_send_at_utc(now() + Duration::hours(1));
        assert_eq!(derive_status(&record, now()), Status::Sent);
    }

    #[test]
    fn test_future_schedule_is_pending() {
        let record = bare().with_send_at_utc(now() + Duration::minutes(10));
        assert_eq!(derive_status(&record, now()), Status::Pending);
    }

    #[test]
    fn test_past_schedule_is_sent() {
        let record = bare().with_send_at_utc(now() - Duration::minutes(10));
        assert_eq!(derive_status(&record, now()), Status::Sent);

        // Exactly now is no longer in the future.
        let record = bare().with_send_at_utc(now());
        assert_eq!(derive_status(&record, now()), Status::Sent);
    }

    #[test]
    fn test_no_signal_defaults_to_sent() {
        assert_eq!(derive_status(&bare(), now()), Status::Sent);
    }

    #[test]
    fn test_derivation_moves_with_time() {
        let record = bare().with_send_at_utc(now() + Duration::minutes(1));
        assert_eq!(derive_status(&record, now()), Status::Pending);
        assert_eq!(
            derive_status(&record, now() + Duration::minutes(2)),
            Status::Sent
        );
    }
}
