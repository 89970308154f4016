//! Feed configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::RecentCache;
use crate::{Error, Result};

/// Settings for a recent-activity feed.
///
/// Missing fields fall back to the compose panel's defaults: four records,
/// refreshed every eight seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeedConfig {
    /// Maximum number of records kept.
    pub capacity: usize,
    /// Seconds between snapshot polls.
    pub poll_interval_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            capacity: RecentCache::DEFAULT_CAPACITY,
            poll_interval_secs: 8,
        }
    }
}

impl FeedConfig {
    /// Parse and validate a JSON settings document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or a value is out of range.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if capacity or poll interval is zero.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::Config("capacity must be at least 1".into()));
        }
        if self.poll_interval_secs == 0 {
            return Err(Error::Config(
                "pollIntervalSecs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Poll interval as a [`Duration`].
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
