use axum::{
    Json,
    extract::{Query, State},
};
use std::sync::Arc;
use tracing::{info, warn};

use super::{ApiError, ApiResponse, AppState, TriggerAck, TriggerQuery};

/// Starts one scheduler pass in the background and answers right away.
/// The pass's own failures never reach this response.
pub async fn trigger_scheduler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TriggerQuery>,
) -> Result<Json<ApiResponse<TriggerAck>>, ApiError> {
    let expected = state.config().read().await.scheduler.cron_secret.clone();

    match expected.as_deref().filter(|s| !s.is_empty()) {
        Some(secret) if params.secret.as_deref() != Some(secret) => {
            warn!("Rejected scheduler trigger with a wrong secret");
            return Err(ApiError::forbidden("Invalid secret"));
        }
        Some(_) => {}
        None => warn!("CRON_SECRET is not set; accepting unauthenticated scheduler trigger"),
    }

    drop(state.shared.runner.trigger_run());
    info!(event = "scheduler_triggered", "Scheduler run triggered");

    Ok(Json(ApiResponse::success(TriggerAck {
        status: "triggered",
    })))
}
