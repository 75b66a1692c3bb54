use axum::{Json, extract::State};
use std::sync::Arc;
use tracing::warn;

use super::observability;
use super::validation::{non_blank, validate_query};
use super::{ApiError, ApiResponse, AppState, CheckAdsRequest};
use crate::db::JobStore;
use crate::models::check::{CheckRequest, CheckResult};
use crate::models::search_log::NewSearchLog;

/// On-demand check. Every completed check is appended to the search log.
pub async fn check_ads(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CheckAdsRequest>,
) -> Result<Json<ApiResponse<CheckResult>>, ApiError> {
    let query = validate_query(&payload.query)?.to_string();

    let (default_gl, default_hl) = {
        let config = state.config().read().await;
        (
            config.search.default_gl.clone(),
            config.search.default_hl.clone(),
        )
    };

    let preference = match payload.user_id.as_deref() {
        Some(user_id) => state.preferences().get(user_id).await.unwrap_or_default(),
        None => Default::default(),
    };

    let device = payload.device.or(preference.device).unwrap_or_default();
    let location = non_blank(payload.location).or(preference.location);

    let request = CheckRequest::new(
        query,
        non_blank(payload.gl).unwrap_or(default_gl),
        non_blank(payload.hl).unwrap_or(default_hl),
    )
    .with_device(device)
    .with_location(location);

    let result = state.shared.checker.check_ads(&request).await?;
    observability::record_check(&result);

    if let Err(e) = state.store().add_log(&NewSearchLog::from(&result)).await {
        warn!(query = %result.query, error = %e, "Failed to record search log");
    }

    Ok(Json(ApiResponse::success(result)))
}
