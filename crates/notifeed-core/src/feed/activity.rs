//! The view-owned recent-activity feed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::poller::{Poller, Snapshot};
use super::summary::SendSummary;
use crate::Result;
use crate::backend::{Draft, NotificationBackend, SendResponse};
use crate::cache::{MergeReport, RecentCache, RecentView, ViewQuery};
use crate::config::FeedConfig;
use crate::record::{NormalizeOptions, normalize};
use crate::time::{Clock, SystemClock};

/// Recent-activity feed bound to one view's lifetime.
///
/// Mounting starts a poll task that feeds snapshots into the cache; send and
/// schedule actions merge their results immediately. Every mutation happens
/// through `&mut self`, so the cache needs no locking. The poll task keeps
/// only the newest unapplied snapshot; [`Self::next_snapshot`] or
/// [`Self::apply_pending`] merges it.
pub struct RecentActivityFeed<B, C = SystemClock> {
    backend: Arc<B>,
    cache: RecentCache,
    snapshots: watch::Receiver<Option<Snapshot>>,
    poller: Option<Poller>,
    clock: C,
}

impl<B> RecentActivityFeed<B, SystemClock>
where
    B: NotificationBackend + 'static,
{
    /// Mount a feed on the system clock.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn mount(backend: Arc<B>, config: &FeedConfig) -> Result<Self> {
        Self::mount_with_clock(backend, config, SystemClock)
    }
}

impl<B, C> RecentActivityFeed<B, C>
where
    B: NotificationBackend + 'static,
    C: Clock,
{
    /// Mount a feed that reads "now" from `clock`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn mount_with_clock(backend: Arc<B>, config: &FeedConfig, clock: C) -> Result<Self> {
        config.validate()?;

        let (tx, snapshots) = watch::channel(None);
        let poller = Poller::spawn(Arc::clone(&backend), config.poll_interval(), tx);
        info!(
            capacity = config.capacity,
            interval_secs = config.poll_interval_secs,
            "Mounted recent-activity feed"
        );

        Ok(Self {
            backend,
            cache: RecentCache::new(config.capacity),
            snapshots,
            poller: Some(poller),
            clock,
        })
    }

    /// Wait for a snapshot newer than the last one applied and merge it.
    ///
    /// Returns `None` once the poll task has stopped.
    pub async fn next_snapshot(&mut self) -> Option<MergeReport> {
        self.snapshots.changed().await.ok()?;
        let snapshot = self.snapshots.borrow_and_update().clone()?;
        Some(self.apply(snapshot))
    }

    /// Merge the newest snapshot if one arrived since the last apply,
    /// without waiting.
    ///
    /// Snapshots superseded while the feed was not applying are skipped.
    pub fn apply_pending(&mut self) -> Option<MergeReport> {
        if !self.snapshots.has_changed().unwrap_or(false) {
            return None;
        }
        let snapshot = self.snapshots.borrow_and_update().clone()?;
        Some(self.apply(snapshot))
    }

    fn apply(&mut self, snapshot: Snapshot) -> MergeReport {
        let options = NormalizeOptions::snapshot();
        let fetched = snapshot.records.len();
        let records: Vec<_> = snapshot
            .records
            .iter()
            .filter_map(|raw| match normalize(raw, &options) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(poll = snapshot.poll, "Skipping snapshot record: {e}");
                    None
                }
            })
            .collect();

        let malformed = fetched - records.len();
        let mut report = self.cache.ingest_snapshot(records);
        report.rejected += malformed;
        debug!(poll = snapshot.poll, size = self.cache.len(), "Applied snapshot");
        report
    }

    /// Send a draft now and show the result immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the request; the cache is
    /// left untouched.
    pub async fn send_now(&mut self, draft: &Draft) -> Result<SendSummary> {
        let response = self.backend.send_now(draft).await?;
        Ok(self.ingest_response(response, None))
    }

    /// Schedule a draft and show the pending records immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the request; the cache is
    /// left untouched.
    pub async fn schedule_send(
        &mut self,
        draft: &Draft,
        send_at_utc: DateTime<Utc>,
    ) -> Result<SendSummary> {
        let response = self.backend.schedule_send(draft, send_at_utc).await?;
        Ok(self.ingest_response(response, Some(send_at_utc)))
    }

    fn ingest_response(
        &mut self,
        response: SendResponse,
        scheduled_at: Option<DateTime<Utc>>,
    ) -> SendSummary {
        let options = NormalizeOptions::optimistic(self.clock.now(), scheduled_at);
        let records: Vec<_> = response
            .into_records()
            .iter()
            .filter_map(|raw| normalize(raw, &options).ok())
            .collect();

        let local = records.iter().filter(|r| r.id.is_local()).count();
        if local > 0 {
            debug!("{local} optimistic record(s) carry local ids");
        }

        let summary = SendSummary::from_records(&records, scheduled_at.is_some());
        self.cache.ingest_optimistic(records);
        summary
    }

    /// Build the read view at the clock's current time.
    #[must_use]
    pub fn view(&self, query: &ViewQuery) -> RecentView {
        self.cache.view(query, self.clock.now())
    }

    /// The underlying cache.
    #[must_use]
    pub const fn cache(&self) -> &RecentCache {
        &self.cache
    }

    /// Stop polling and discard anything not yet applied.
    pub async fn unmount(mut self) {
        if let Some(poller) = self.poller.take() {
            poller.shutdown().await;
        }
        info!(size = self.cache.len(), "Unmounted recent-activity feed");
    }
}

impl<B, C> std::fmt::Debug for RecentActivityFeed<B, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecentActivityFeed")
            .field("cache", &self.cache)
            .field("polling", &self.poller.is_some())
            .finish_non_exhaustive()
    }
}
