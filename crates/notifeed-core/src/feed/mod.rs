//! Recent-activity feed.
//!
//! Ties the cache to its two sources of writes:
//! - **Poll loop**: fetches a snapshot on a fixed interval; failures are
//!   logged and the next tick tries again
//! - **Action path**: send/schedule results are merged as soon as the
//!   backend answers, before the next poll confirms them
//!
//! The feed is owned by a single view. Unmounting stops the poll task and
//! drops any fetch still in flight.

mod activity;
mod poller;
mod summary;

pub use activity::RecentActivityFeed;
pub use poller::Snapshot;
pub use summary::{SendOutcome, SendSummary};
