//! # notifeed-core
//!
//! Core logic for the `notifeed` recent-activity feed.
//!
//! This crate provides:
//! - Notification record model and normalization of backend payloads
//! - Status derivation for records with missing or loose status fields
//! - **Recent Cache** - bounded, ranked, deduplicated window of notifications
//! - **Read View** - text and status-tab filtering with aggregate counts
//! - **Feed** - poll loop and optimistic ingestion bound to a view's lifetime
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use notifeed_core::{Draft, FeedConfig, InMemoryBackend, RecentActivityFeed, ViewQuery};
//!
//! let backend = Arc::new(InMemoryBackend::new());
//! let mut feed = RecentActivityFeed::mount(backend, &FeedConfig::default())?;
//!
//! feed.next_snapshot().await;
//! feed.send_now(&Draft::from_form("a@example.com", "Hi", "Hello")).await?;
//!
//! for row in feed.view(&ViewQuery::default()).rows {
//!     println!("{} {} {}", row.status, row.subject, row.recipient);
//! }
//! feed.unmount().await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod backend;
pub mod cache;
mod config;
mod error;
pub mod feed;
pub mod record;
pub mod time;

pub use backend::{BackendError, Draft, InMemoryBackend, NotificationBackend, SendResponse};
pub use cache::{
    ActivityCounts, ActivityRow, MergeReport, RecentCache, RecentView, StatusTab, ViewQuery,
};
pub use config::FeedConfig;
pub use error::{Error, Result};
pub use feed::{RecentActivityFeed, SendOutcome, SendSummary, Snapshot};
pub use record::{
    NormalizeOptions, NotificationRecord, RawNotification, RecordId, Status, derive_status,
    normalize, parse_recipients,
};
pub use time::{Clock, MockClock, SystemClock, relative_time};
