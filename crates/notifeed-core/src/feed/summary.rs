//! Outcome of a send or schedule action.

use crate::record::{NotificationRecord, Status};

/// What the user should be told after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Every record came back sent.
    AllSent(usize),
    /// Some records came back sent, the rest pending or failed.
    Partial {
        /// Records reported sent.
        sent: usize,
        /// Records not reported sent.
        remaining: usize,
    },
    /// Nothing came back sent.
    NoneSent,
    /// The notifications were scheduled.
    Scheduled(usize),
}

/// Counts from the records a send or schedule call returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendSummary {
    /// Records returned.
    pub total: usize,
    /// Records whose explicit status is `SENT`.
    pub sent: usize,
    /// Whether this was a schedule request.
    pub scheduled: bool,
}

impl SendSummary {
    pub(crate) fn from_records(records: &[NotificationRecord], scheduled: bool) -> Self {
        Self {
            total: records.len(),
            sent: records
                .iter()
                .filter(|r| r.status == Some(Status::Sent))
                .count(),
            scheduled,
        }
    }

    /// Classify the result.
    ///
    /// A schedule request that returned nothing still counts as one
    /// scheduled notification.
    #[must_use]
    pub fn outcome(&self) -> SendOutcome {
        if self.scheduled {
            return SendOutcome::Scheduled(self.total.max(1));
        }
        let remaining = self.total.saturating_sub(self.sent);
        match (self.sent, remaining) {
            (0, _) => SendOutcome::NoneSent,
            (sent, 0) => SendOutcome::AllSent(sent),
            (sent, remaining) => SendOutcome::Partial { sent, remaining },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordId;

    fn with_status(status: Option<Status>) -> NotificationRecord {
        let record = NotificationRecord::new(RecordId::local());
        match status {
            Some(status) => record.with_status(status),
            None => record,
        }
    }

    #[test]
    fn test_all_sent() {
        let records = [with_status(Some(Status::Sent)), with_status(Some(Status::Sent))];
        let summary = SendSummary::from_records(&records, false);
        assert_eq!(summary.outcome(), SendOutcome::AllSent(2));
    }

    #[test]
    fn test_partial() {
        let records = [
            with_status(Some(Status::Sent)),
            with_status(Some(Status::Failed)),
            with_status(None),
        ];
        let summary = SendSummary::from_records(&records, false);
        assert_eq!(
            summary.outcome(),
            SendOutcome::Partial {
                sent: 1,
                remaining: 2
            }
        );
    }

    #[test]
    fn test_none_sent() {
        let summary = SendSummary::from_records(&[with_status(Some(Status::Failed))], false);
        assert_eq!(summary.outcome(), SendOutcome::NoneSent);
        assert_eq!(SendSummary::from_records(&[], false).outcome(), SendOutcome::NoneSent);
    }

    #[test]
    fn test_scheduled() {
        let records = [with_status(Some(Status::Pending)), with_status(Some(Status::Pending))];
        let summary = SendSummary::from_records(&records, true);
        assert_eq!(summary.outcome(), SendOutcome::Scheduled(2));
        assert_eq!(SendSummary::from_records(&[], true).outcome(), SendOutcome::Scheduled(1));
    }

    #[test]
    fn test_inconsistent_counts_do_not_underflow() {
        let summary = SendSummary {
            total: 1,
            sent: 3,
            scheduled: false,
        };
        assert_eq!(summary.outcome(), SendOutcome::AllSent(3));
    }
}
