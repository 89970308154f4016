//! Recent-activity cache.
//!
//! This module provides the bounded window of recent notifications that
//! merges backend snapshots with optimistic local writes, and the read view
//! the activity panel renders from it.

mod recent;
mod view;

pub use recent::{MergeReport, RecentCache};
pub use view::{
    ActivityCounts, ActivityRow, NO_RECIPIENT, NO_SUBJECT, RecentView, StatusTab, ViewQuery,
};
