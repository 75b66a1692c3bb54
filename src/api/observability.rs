//! Request spans, HTTP and check metrics, and the Prometheus scrape route.

use axum::{
    extract::{MatchedPath, Request, State},
    http,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::trace::{MakeSpan, OnResponse};
use tracing::{Span, info, info_span};
use uuid::Uuid;

use crate::api::AppState;
use crate::models::check::CheckResult;

pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.prometheus_handle.as_ref().map_or_else(
        || "Metrics not enabled or failed to initialize".to_string(),
        metrics_exporter_prometheus::PrometheusHandle::render,
    )
}

/// Route template of a request. Raw paths carry job and user ids.
fn route_of<B>(req: &http::Request<B>) -> Option<&str> {
    req.extensions().get::<MatchedPath>().map(MatchedPath::as_str)
}

/// `TraceLayer` span carrying a request id and the matched route.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, req: &http::Request<B>) -> Span {
        info_span!(
            "request",
            request_id = %Uuid::new_v4(),
            method = %req.method(),
            route = route_of(req).unwrap_or_else(|| req.uri().path()),
        )
    }
}

/// `TraceLayer` hook logging one `http_request_finished` event per request.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogResponse;

impl<B> OnResponse<B> for LogResponse {
    fn on_response(self, response: &http::Response<B>, latency: Duration, _span: &Span) {
        let status = response.status();
        info!(
            event = "http_request_finished",
            duration_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
            status_code = status.as_u16(),
            outcome = http_outcome(status),
            "Request finished"
        );
    }
}

fn http_outcome(status: http::StatusCode) -> &'static str {
    if status.is_server_error() {
        "error"
    } else if status.is_client_error() {
        "client_error"
    } else {
        "success"
    }
}

/// Counts requests per route template and status.
pub async fn track_http_metrics(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let route = route_of(&req).unwrap_or("unmatched").to_string();

    let response = next.run(req).await;

    let labels = [
        ("method", method),
        ("route", route),
        ("status", response.status().as_u16().to_string()),
    ];
    metrics::counter!("http_requests_total", &labels).increment(1);
    metrics::histogram!("http_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());

    response
}

fn check_labels(result: &CheckResult) -> [(&'static str, String); 3] {
    [
        ("has_ads", result.has_ads.to_string()),
        ("policy", result.policy.to_string()),
        ("scoped", result.location_used.is_some().to_string()),
    ]
}

/// Records an on-demand check: whether ads were found, under which policy,
/// and whether a location variant won.
#[allow(clippy::cast_precision_loss)]
pub fn record_check(result: &CheckResult) {
    let labels = check_labels(result);
    metrics::counter!("ad_checks_total", &labels).increment(1);
    metrics::histogram!("ad_check_attempts").record(result.attempts_made as f64);
    metrics::histogram!("ad_check_latency_seconds").record(result.latency_ms as f64 / 1000.0);
}
