use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Store;
use crate::services::PreferenceStore;
use crate::state::SharedState;

mod check;
mod error;
mod health;
mod jobs;
mod logs;
mod observability;
mod preferences;
mod trigger;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

use tokio::sync::RwLock;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.shared.store
    }

    #[must_use]
    pub fn preferences(&self) -> &Arc<PreferenceStore> {
        &self.shared.preferences
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config().read().await.server.cors_allowed_origins.clone();

    let v1 = Router::new()
        .route("/check", post(check::check_ads))
        .route("/jobs", get(jobs::list_jobs).post(jobs::create_job))
        .route("/jobs/{id}", delete(jobs::delete_job))
        .route("/jobs/{id}/active", put(jobs::set_job_active))
        .route("/logs", get(logs::list_logs))
        .route("/trigger-scheduler", get(trigger::trigger_scheduler))
        .route(
            "/preferences/{user_id}",
            get(preferences::get_preference)
                .put(preferences::update_preference)
                .delete(preferences::delete_preference),
        );

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .route("/health", get(health::health))
        .route("/metrics", get(observability::get_metrics))
        .nest("/v1", v1)
        .route_layer(middleware::from_fn(observability::track_http_metrics))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(observability::RequestSpan)
                .on_response(observability::LogResponse),
        )
        .with_state(state)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
}
