use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{AdType, Device};
use crate::models::check::CheckResult;

/// Audit record of one completed check. Append-only.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SearchLog {
    pub id: i64,
    pub query: String,
    pub has_ads: bool,
    pub ads_count: i32,
    pub types: Vec<AdType>,
    pub device: Device,
    pub gl: String,
    pub hl: String,
    pub latency_ms: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSearchLog {
    pub query: String,
    pub has_ads: bool,
    pub ads_count: i32,
    pub types: Vec<AdType>,
    pub device: Device,
    pub gl: String,
    pub hl: String,
    pub latency_ms: i64,
}

impl From<&CheckResult> for NewSearchLog {
    fn from(result: &CheckResult) -> Self {
        Self {
            query: result.query.clone(),
            has_ads: result.has_ads,
            ads_count: i32::try_from(result.ads_count).unwrap_or(i32::MAX),
            types: result.types.clone(),
            device: result.device,
            gl: result.gl.clone(),
            hl: result.hl.clone(),
            latency_ms: i64::try_from(result.latency_ms).unwrap_or(i64::MAX),
        }
    }
}
