use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::jobs::{MAX_INTERVAL_MINUTES, MIN_INTERVAL_MINUTES};
use crate::domain::{Device, JobId};

/// A recurring ad check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduledJob {
    pub id: JobId,

    pub query: String,

    pub interval_minutes: i32,

    pub location: Option<String>,

    pub device: Device,

    /// Chat that receives this job's alerts instead of the default channel.
    pub notify_chat_id: Option<String>,

    pub is_active: bool,

    pub next_run_at: DateTime<Utc>,

    pub created_at: DateTime<Utc>,
}

impl ScheduledJob {
    /// The job's own location when set and non-blank, else `fallback`.
    #[must_use]
    pub fn effective_location<'a>(&'a self, fallback: Option<&'a str>) -> Option<&'a str> {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .or_else(|| fallback.map(str::trim).filter(|l| !l.is_empty()))
    }

    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.next_run_at <= now
    }
}

/// Input for creating a [`ScheduledJob`]. The store assigns the id and the
/// timestamps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewJob {
    pub query: String,

    pub interval_minutes: i32,

    #[serde(default)]
    pub location: Option<String>,

    #[serde(default)]
    pub device: Device,

    #[serde(default)]
    pub notify_chat_id: Option<String>,
}

impl NewJob {
    /// First run happens one full interval after creation.
    #[must_use]
    pub fn first_run_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        next_run_after(now, self.interval_minutes)
    }
}

/// `now + interval`, never the previous `next_run_at + interval`, so missed
/// cycles do not pile up.
#[must_use]
pub fn next_run_after(now: DateTime<Utc>, interval_minutes: i32) -> DateTime<Utc> {
    now + Duration::minutes(i64::from(interval_minutes))
}

/// Interval bounds shared by every way of creating a job.
#[must_use]
pub fn interval_in_bounds(minutes: i32) -> bool {
    (MIN_INTERVAL_MINUTES..=MAX_INTERVAL_MINUTES).contains(&minutes)
}
