//! Domain primitives shared by the engine, the runtime and the API layer.
//!
//! Identifiers are wrapped in newtypes so a job id can never be passed where a
//! search-log id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier of a [`ScheduledJob`](crate::models::job::ScheduledJob),
/// assigned by the store.
///
/// # Examples
///
/// ```rust
/// use adcheck::domain::JobId;
///
/// let id = JobId::new(7);
/// assert_eq!(id.value(), 7);
/// assert_eq!(id.to_string(), "7");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct JobId(i32);

impl JobId {
    #[must_use]
    pub const fn new(id: i32) -> Self {
        debug_assert!(id >= 0, "JobId should be non-negative");
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<JobId> for i32 {
    fn from(id: JobId) -> Self {
        id.0
    }
}

impl From<i32> for JobId {
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

impl Serialize for JobId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i32(self.0)
    }
}

impl<'de> Deserialize<'de> for JobId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let id = i32::deserialize(deserializer)?;
        Ok(Self::new(id))
    }
}

/// Device profile the search is performed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    #[default]
    Desktop,
    Mobile,
}

impl Device {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Mobile => "mobile",
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Device {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "desktop" => Ok(Self::Desktop),
            "mobile" => Ok(Self::Mobile),
            other => Err(format!("Unknown device '{other}', expected desktop or mobile")),
        }
    }
}

/// Kind of paid placement detected on a results page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdType {
    Search,
    Shopping,
}

impl AdType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Shopping => "shopping",
        }
    }

    /// Serializes tags the way the search log stores them: `"search,shopping"`.
    #[must_use]
    pub fn join(types: &[Self]) -> String {
        types
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Inverse of [`AdType::join`]. Unknown tags are dropped.
    #[must_use]
    pub fn split(raw: &str) -> Vec<Self> {
        raw.split(',')
            .filter_map(|t| match t.trim() {
                "search" => Some(Self::Search),
                "shopping" => Some(Self::Shopping),
                _ => None,
            })
            .collect()
    }
}

impl fmt::Display for AdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule used to pick the winning attempt of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Run every attempt and keep the one with the strictly highest ad count.
    /// Ties keep the earlier attempt.
    #[default]
    BestOfAll,
    /// Stop at the first attempt with at least one ad; otherwise return the
    /// last attempt.
    FirstHit,
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BestOfAll => f.write_str("best_of_all"),
            Self::FirstHit => f.write_str("first_hit"),
        }
    }
}
