//! Notification records as seen by the client.
//!
//! This module provides:
//! - **Model**: [`NotificationRecord`], [`RecordId`] and [`Status`]
//! - **Normalization**: turning loosely-shaped backend payloads into records
//! - **Status derivation**: a canonical status for records that lack one

mod model;
mod normalize;
mod status;

pub use model::{NotificationRecord, RecordId, Status};
pub use normalize::{NormalizeOptions, RawNotification, normalize, parse_recipients};
pub use status::derive_status;
