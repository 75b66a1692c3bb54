use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::services::Preference;

pub async fn get_preference(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Preference>>, ApiError> {
    match state.preferences().get(&user_id).await {
        Some(pref) => Ok(Json(ApiResponse::success(pref))),
        None => Err(ApiError::not_found("Preferences for user", &user_id)),
    }
}

/// Creates the entry on first use; omitted fields keep their stored value.
pub async fn update_preference(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(payload): Json<Preference>,
) -> Result<Json<ApiResponse<Preference>>, ApiError> {
    let pref = state.preferences().update(&user_id, payload).await;
    Ok(Json(ApiResponse::success(pref)))
}

pub async fn delete_preference(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    if state.preferences().remove(&user_id).await {
        Ok(Json(ApiResponse::success(true)))
    } else {
        Err(ApiError::not_found("Preferences for user", &user_id))
    }
}
