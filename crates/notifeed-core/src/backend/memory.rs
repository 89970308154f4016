//! In-memory backend.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use tracing::debug;

use super::{BackendError, Draft, NotificationBackend, SendResponse};
use crate::record::{RawNotification, Status};
use crate::time::{Clock, SystemClock};

#[derive(Debug, Default)]
struct State {
    records: Vec<RawNotification>,
    next_id: u64,
    failing_lists: usize,
    list_calls: usize,
    omit_response_ids: bool,
}

/// A backend that lives in process memory.
///
/// Sends create one `SENT` record per recipient, schedules one `PENDING`
/// record per recipient. Ids are sequential numbers. Outages can be
/// simulated with [`Self::fail_next_lists`].
pub struct InMemoryBackend {
    state: Mutex<State>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBackend")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl InMemoryBackend {
    /// Creates an empty backend on the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty backend that stamps records with `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 1,
                ..State::default()
            }),
            clock,
        }
    }

    /// Adds a record as if another client had created it.
    pub fn insert(&self, record: RawNotification) {
        self.lock().records.push(record);
    }

    /// Makes the next `count` calls to `list_active` fail.
    pub fn fail_next_lists(&self, count: usize) {
        self.lock().failing_lists = count;
    }

    /// Strips ids from send/schedule responses (stored records keep theirs).
    pub fn omit_response_ids(&self, omit: bool) {
        self.lock().omit_response_ids = omit;
    }

    /// Marks pending records whose scheduled time has passed as sent.
    ///
    /// Returns how many records were delivered.
    pub fn deliver_due(&self) -> usize {
        let now = self.clock.now();
        let stamp = rfc3339(now);
        let mut state = self.lock();
        let mut delivered = 0;

        for record in &mut state.records {
            let pending = record.status.as_deref().and_then(Status::parse) == Some(Status::Pending);
            let due = record
                .send_at_utc
                .as_deref()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .is_some_and(|at| at <= now);
            if pending && due {
                record.status = Some(Status::Sent.as_str().to_owned());
                record.sent_at = Some(stamp.clone());
                delivered += 1;
            }
        }

        debug!("Delivered {delivered} scheduled notification(s)");
        delivered
    }

    /// Sets the status string of a stored record.
    ///
    /// Returns false if no record has that id.
    pub fn set_status(&self, id: u64, status: Status) -> bool {
        let mut state = self.lock();
        let target = Value::from(id);
        match state.records.iter_mut().find(|r| r.id.as_ref() == Some(&target)) {
            Some(record) => {
                record.status = Some(status.as_str().to_owned());
                true
            }
            None => false,
        }
    }

    /// Number of `list_active` calls so far, failed ones included.
    #[must_use]
    pub fn list_calls(&self) -> usize {
        self.lock().list_calls
    }

    /// Copy of every stored record.
    #[must_use]
    pub fn records(&self) -> Vec<RawNotification> {
        self.lock().records.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn create(
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

        let now = rfc3339(self.clock.now());
        let mut state = self.lock();
        let mut created = Vec::with_capacity(draft.recipients.len());

        for recipient in &draft.recipients {
            let id = state.next_id;
            state.next_id += 1;

            let record = RawNotification {
                id: Some(Value::from(id)),
                subject: Some(draft.subject.clone()),
                body: Some(draft.body.clone()),
                recipient: Some(recipient.clone()),
                recipients: None,
                status: Some(status.as_str().to_owned()),
                created_at: Some(now.clone()),
                send_at_utc: send_at_utc.map(rfc3339),
                sent_at: (status == Status::Sent).then(|| now.clone()),
            };
            state.records.push(record.clone());
            created.push(record);
        }

        if state.omit_response_ids {
            for record in &mut created {
                record.id = None;
            }
        }

        Ok(if created.len() == 1 {
            SendResponse::One(created.remove(0))
        } else {
            SendResponse::Many(created)
        })
    }
}

impl NotificationBackend for InMemoryBackend {
    async fn list_active(&self) -> Result<Vec<RawNotification>, BackendError> {
        let mut state = self.lock();
        state.list_calls += 1;
        if state.failing_lists > 0 {
            state.failing_lists -= 1;
            return Err(BackendError::Unavailable("simulated outage".into()));
        }
        Ok(state.records.clone())
    }

    async fn send_now(&self, draft: &Draft) -> Result<SendResponse, BackendError> {
        self.create(draft, Status::Sent, None)
    }

    async fn schedule_send(
        &self,
        draft: &Draft,
        send_at_utc: DateTime<Utc>,
    ) -> Result<SendResponse, BackendError> {
        if send_at_utc <= self.clock.now() {
            return Err(BackendError::Rejected(
                "sendAtUtc must be in the future".into(),
            ));
        }
        self.create(draft, Status::Pending, Some(send_at_utc))
    }
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
