use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::info;

use super::validation::{non_blank, validate_interval, validate_job_id, validate_query};
use super::{ApiError, ApiResponse, AppState, CreateJobRequest, SetActiveRequest};
use crate::db::JobStore;
use crate::domain::JobId;
use crate::models::job::{NewJob, ScheduledJob};

pub async fn create_job(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ScheduledJob>>), ApiError> {
    let new_job = NewJob {
        query: validate_query(&payload.query)?.to_string(),
        interval_minutes: validate_interval(payload.interval_minutes)?,
        location: non_blank(payload.location),
        device: payload.device,
        notify_chat_id: non_blank(payload.notify_chat_id),
    };

    let job = state.store().add_job(&new_job).await?;
    info!(job_id = %job.id, query = %job.query, interval = job.interval_minutes, "Job created");

    Ok((StatusCode::CREATED, Json(ApiResponse::success(job))))
}

/// Newest first.
pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<ScheduledJob>>>, ApiError> {
    let jobs = state.store().list_jobs().await?;
    Ok(Json(ApiResponse::success(jobs)))
}

pub async fn delete_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    let id = JobId::new(validate_job_id(id)?);
    if state.store().delete_job(id).await? {
        info!(job_id = %id, "Job deleted");
        Ok(Json(ApiResponse::success(true)))
    } else {
        Err(ApiError::not_found("Job", id))
    }
}

pub async fn set_job_active(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<SetActiveRequest>,
) -> Result<Json<ApiResponse<ScheduledJob>>, ApiError> {
    let id = JobId::new(validate_job_id(id)?);
    if !state.store().set_job_active(id, payload.active).await? {
        return Err(ApiError::not_found("Job", id));
    }

    match state.store().get_job(id).await? {
        Some(job) => Ok(Json(ApiResponse::success(job))),
        None => Err(ApiError::not_found("Job", id)),
    }
}
