use serde::{Deserialize, Serialize};

use crate::domain::{AdType, Device, SelectionPolicy};

/// One paid result as shown to users.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdDetail {
    /// 1-based position on the page.
    pub pos: usize,
    pub title: String,
    pub url: String,
    pub domain: String,
}

/// Outcome of one `check_ads` call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckResult {
    pub query: String,
    pub has_ads: bool,
    pub ads_count: usize,
    pub types: Vec<AdType>,
    pub latency_ms: u64,
    pub gl: String,
    pub hl: String,
    pub device: Device,
    /// Location parameter of the attempt that won, if it had one.
    pub location_used: Option<String>,
    pub policy: SelectionPolicy,
    /// How many attempts were actually sent upstream.
    pub attempts_made: usize,
    pub ads: Vec<AdDetail>,
}

/// Parameters of an on-demand or scheduled check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRequest {
    pub query: String,
    pub gl: String,
    pub hl: String,
    pub device: Device,
    pub location: Option<String>,
}

impl CheckRequest {
    #[must_use]
    pub fn new(query: impl Into<String>, gl: impl Into<String>, hl: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            gl: gl.into(),
            hl: hl.into(),
            device: Device::Desktop,
            location: None,
        }
    }

    #[must_use]
    pub const fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: Option<impl Into<String>>) -> Self {
        self.location = location.map(Into::into);
        self
    }
}
