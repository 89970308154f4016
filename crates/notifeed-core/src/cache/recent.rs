//! The bounded recent-activity cache.

use tracing::{debug, warn};

use crate::record::{NotificationRecord, RecordId};

/// Counts from a single merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Records merged into the candidate set (new or overwriting).
    pub accepted: usize,
    /// Records rejected for lacking a usable id.
    pub rejected: usize,
    /// Candidates dropped by truncation.
    pub evicted: usize,
}

#[derive(Debug, Clone)]
struct Entry {
    record: NotificationRecord,
    /// Merge sequence; breaks timestamp ties in favour of later merges.
    seq: u64,
}

/// A ranked, deduplicated window over the most recent notifications.
///
/// Snapshots and optimistic writes go through the same merge: a record
/// overwrites any entry with the same id, new ids become candidates, then
/// the candidates are ranked newest first and cut down to `capacity`.
/// Dropped entries are forgotten.
#[derive(Debug, Clone)]
pub struct RecentCache {
    capacity: usize,
    entries: Vec<Entry>,
    next_seq: u64,
}

impl RecentCache {
    /// Capacity used by the compose screen's activity panel.
    pub const DEFAULT_CAPACITY: usize = 4;

    /// Creates an empty cache holding at most `capacity` records.
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Vec::with_capacity(capacity + 1),
            next_seq: 0,
        }
    }

    /// Merge a listing fetched from the backend.
    pub fn ingest_snapshot<I>(&mut self, records: I) -> MergeReport
    where
        I: IntoIterator<Item = NotificationRecord>,
    {
        let report = self.merge(records);
        debug!(
            accepted = report.accepted,
            rejected = report.rejected,
            evicted = report.evicted,
            "Merged snapshot"
        );
        report
    }

    /// Merge records produced by a local send or schedule action.
    ///
    /// Same rule as [`Self::ingest_snapshot`]; the next snapshot corrects
    /// whatever these records got wrong.
    pub fn ingest_optimistic<I>(&mut self, records: I) -> MergeReport
    where
        I: IntoIterator<Item = NotificationRecord>,
    {
        let report = self.merge(records);
        debug!(
            accepted = report.accepted,
            rejected = report.rejected,
            evicted = report.evicted,
            "Merged optimistic records"
        );
        report
    }

    fn merge<I>(&mut self, records: I) -> MergeReport
    where
        I: IntoIterator<Item = NotificationRecord>,
    {
        let mut report = MergeReport::default();

        for record in records {
            if !record.id.is_usable() {
                warn!("Rejecting record without a usable id: {:?}", record.id);
                report.rejected += 1;
                continue;
            }

            self.next_seq += 1;
            let seq = self.next_seq;
            report.accepted += 1;

            match self.entries.iter_mut().find(|e| e.record.id == record.id) {
                Some(existing) => {
                    existing.record = record;
                    existing.seq = seq;
                }
                None => self.entries.push(Entry { record, seq }),
            }
        }

        self.entries.sort_by(|a, b| {
            b.record
                .effective_timestamp()
                .cmp(&a.record.effective_timestamp())
                .then_with(|| b.seq.cmp(&a.seq))
        });

        report.evicted = self.entries.len().saturating_sub(self.capacity);
        self.entries.truncate(self.capacity);
        report
    }

    /// Maximum number of records kept.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of records currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been merged yet (or everything was rejected).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records in ranked order, newest first.
    pub fn records(&self) -> impl ExactSizeIterator<Item = &NotificationRecord> {
        self.entries.iter().map(|e| &e.record)
    }

    /// Looks up a record by id.
    #[must_use]
    pub fn get(&self, id: &RecordId) -> Option<&NotificationRecord> {
        self.records().find(|r| &r.id == id)
    }
}

impl Default for RecentCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::record::Status;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn rec(id: &str) -> NotificationRecord {
        NotificationRecord::new(RecordId::server(id))
    }

    fn created(id: &str, minutes: i64) -> NotificationRecord {
        rec(id).with_created_at(t0() + Duration::minutes(minutes))
    }

    fn ids(cache: &RecentCache) -> Vec<String> {
        cache.records().map(|r| r.id.to_string()).collect()
    }

    #[test]
    fn test_new_cache_is_empty() {
        let cache = RecentCache::default();
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 4);
        assert_eq!(RecentCache::new(0).capacity(), 1);
    }

    #[test]
    fn test_overwrite_by_id() {
        let mut cache = RecentCache::default();
        cache.ingest_snapshot([rec("1").with_subject("a")]);
        cache.ingest_snapshot([rec("1").with_subject("b")]);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&RecordId::server("1")).unwrap().subject, "b");
    }

    #[test]
    fn test_overwrite_replaces_every_field() {
        let mut cache = RecentCache::default();
        cache.ingest_optimistic([created("1", 5).with_status(Status::Sent)]);
        cache.ingest_snapshot([rec("1").with_sent_at(t0())]);

        let record = cache.get(&RecordId::server("1")).unwrap();
        assert_eq!(record.status, None);
        assert_eq!(record.created_at, None);
        assert_eq!(record.sent_at, Some(t0()));
    }

    #[test]
    fn test_ranking_uses_fallback_chain() {
        let mut cache = RecentCache::default();
        cache.ingest_snapshot([
            rec("1").with_send_at_utc(t0() + Duration::minutes(10)),
            rec("2").with_created_at(t0()),
            rec("3").with_sent_at(t0() + Duration::minutes(5)),
        ]);

        assert_eq!(ids(&cache), ["1", "3", "2"]);
    }

    #[test]
    fn test_missing_timestamps_sort_last() {
        let mut cache = RecentCache::default();
        cache.ingest_snapshot([rec("bare"), created("dated", 0)]);
        assert_eq!(ids(&cache), ["dated", "bare"]);
    }

    #[test]
    fn test_ties_favour_latest_merge() {
        let mut cache = RecentCache::default();
        cache.ingest_snapshot([created("a", 0), created("b", 0)]);
        assert_eq!(ids(&cache), ["b", "a"]);

        cache.ingest_optimistic([created("a", 0)]);
        assert_eq!(ids(&cache), ["a", "b"]);
    }

    #[test]
    fn test_truncation_drops_oldest() {
        let mut cache = RecentCache::default();
        let report = cache.ingest_snapshot((0..5).map(|i| created(&i.to_string(), i)));

        assert_eq!(cache.len(), 4);
        assert_eq!(report.accepted, 5);
        assert_eq!(report.evicted, 1);
        assert!(cache.get(&RecordId::server("0")).is_none());
        assert_eq!(ids(&cache), ["4", "3", "2", "1"]);
    }

    #[test]
    fn test_truncated_records_are_forgotten() {
        let mut cache = RecentCache::new(2);
        cache.ingest_snapshot([created("old", 0), created("mid", 1), created("new", 2)]);
        assert_eq!(ids(&cache), ["new", "mid"]);

        // Newer records push "mid" out; "old" does not come back.
        cache.ingest_snapshot([created("newer", 3)]);
        assert_eq!(ids(&cache), ["newer", "new"]);
    }

    #[test]
    fn test_older_snapshot_records_do_not_enter_full_cache() {
        let mut cache = RecentCache::new(2);
        cache.ingest_snapshot([created("a", 10), created("b", 11)]);
        let report = cache.ingest_snapshot([created("ancient", 0)]);

        assert_eq!(report.evicted, 1);
        assert_eq!(ids(&cache), ["b", "a"]);
    }

    #[test]
    fn test_snapshot_is_idempotent() {
        let snapshot = vec![
            created("1", 1),
            created("2", 2),
            created("3", 2),
            rec("4"),
            created("5", 0),
        ];

        let mut once = RecentCache::default();
        once.ingest_snapshot(snapshot.clone());

        let mut twice = RecentCache::default();
        twice.ingest_snapshot(snapshot.clone());
        twice.ingest_snapshot(snapshot);

        assert_eq!(ids(&once), ids(&twice));
    }

    #[test]
    fn test_unusable_ids_are_rejected_without_aborting() {
        let mut cache = RecentCache::default();
        let report = cache.ingest_snapshot([rec(""), created("ok", 1), rec("  ")]);

        assert_eq!(report.rejected, 2);
        assert_eq!(report.accepted, 1);
        assert_eq!(ids(&cache), ["ok"]);
    }

    #[test]
    fn test_duplicate_ids_within_batch_keep_last() {
        let mut cache = RecentCache::default();
        cache.ingest_snapshot([
            created("1", 0).with_subject("first"),
            created("1", 0).with_subject("second"),
        ]);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&RecordId::server("1")).unwrap().subject, "second");
    }

    #[test]
    fn test_local_ids_never_collide_with_server_ids() {
        let mut cache = RecentCache::default();
        cache.ingest_optimistic([NotificationRecord::new(RecordId::local())
            .with_subject("hi")
            .with_created_at(t0())]);
        cache.ingest_snapshot([created("7", 0).with_subject("hi")]);

        // Not reconciled by content: both entries stay.
        assert_eq!(cache.len(), 2);
    }
}
