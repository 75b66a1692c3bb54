use serde::{Deserialize, Serialize};

use crate::domain::Device;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthDto {
    pub ok: bool,
    pub version: &'static str,
    pub uptime_seconds: u64,
}

#[derive(Debug, Deserialize)]
pub struct CheckAdsRequest {
    pub query: String,
    #[serde(default)]
    pub device: Option<Device>,
    #[serde(default)]
    pub gl: Option<String>,
    #[serde(default)]
    pub hl: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Fills device and location from this user's stored preferences.
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub query: String,
    pub interval_minutes: i32,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub device: Device,
    #[serde(default)]
    pub notify_chat_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct TriggerQuery {
    pub secret: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TriggerAck {
    pub status: &'static str,
}
