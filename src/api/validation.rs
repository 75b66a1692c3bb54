use super::ApiError;
use crate::constants::{jobs, limits};
use crate::models::job::interval_in_bounds;

pub fn validate_query(query: &str) -> Result<&str, ApiError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Query cannot be empty"));
    }

    if trimmed.chars().count() > limits::MAX_QUERY_LENGTH {
        return Err(ApiError::validation(format!(
            "Query must be {} characters or less",
            limits::MAX_QUERY_LENGTH
        )));
    }

    Ok(trimmed)
}

pub fn validate_interval(minutes: i32) -> Result<i32, ApiError> {
    if !interval_in_bounds(minutes) {
        return Err(ApiError::validation(format!(
            "Invalid interval: {}. Interval must be between {} and {} minutes",
            minutes,
            jobs::MIN_INTERVAL_MINUTES,
            jobs::MAX_INTERVAL_MINUTES
        )));
    }
    Ok(minutes)
}

pub fn validate_job_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid job ID: {}. ID must be a positive integer",
            id
        )));
    }
    Ok(id)
}

pub fn validate_limit(limit: u64) -> Result<u64, ApiError> {
    const MIN_LIMIT: u64 = 1;

    if !(MIN_LIMIT..=limits::MAX_LOG_LIMIT).contains(&limit) {
        return Err(ApiError::validation(format!(
            "Invalid limit: {}. Limit must be between {} and {}",
            limit,
            MIN_LIMIT,
            limits::MAX_LOG_LIMIT
        )));
    }
    Ok(limit)
}

/// Blank strings count as absent.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
