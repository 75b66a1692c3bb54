use axum::{
    Json,
    extract::{Query, State},
};
use std::sync::Arc;

use super::validation::validate_limit;
use super::{ApiError, ApiResponse, AppState, LogsQuery};
use crate::constants::limits;
use crate::models::search_log::SearchLog;

pub async fn list_logs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LogsQuery>,
) -> Result<Json<ApiResponse<Vec<SearchLog>>>, ApiError> {
    let limit = validate_limit(params.limit.unwrap_or(limits::DEFAULT_LOG_LIMIT))?;
    let logs = state.store().list_logs(limit).await?;
    Ok(Json(ApiResponse::success(logs)))
}
