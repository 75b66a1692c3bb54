use adcheck::clients::serpapi::{RawAd, SearchParams, SerpResponse, UpstreamError};
use adcheck::clients::telegram::NotifyError;
use adcheck::config::Config;
use adcheck::services::{Notifier, SearchBackend};
use adcheck::state::SharedState;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Two ads for "credit card", none for anything else, a 503 for "outage".
#[derive(Default)]
struct FakeSearch {
    calls: Mutex<Vec<SearchParams>>,
}

#[async_trait::async_trait]
impl SearchBackend for FakeSearch {
    async fn search(&self, params: &SearchParams) -> Result<SerpResponse, UpstreamError> {
        self.calls.lock().unwrap().push(params.clone());
        match params.query.as_str() {
            "outage" => Err(UpstreamError::Status {
                status: 503,
                body: "service unavailable".to_string(),
            }),
            "credit card" => Ok(SerpResponse {
                ads: vec![
                    RawAd {
                        title: Some("Best Card".to_string()),
                        link: Some("https://www.bestcard.com/apply".to_string()),
                        ..RawAd::default()
                    },
                    RawAd {
                        headline: Some("Zero Fee Card".to_string()),
                        displayed_link: Some("https://zerofee.com.tr".to_string()),
                        ..RawAd::default()
                    },
                ],
                ..SerpResponse::default()
            }),
            _ => Ok(SerpResponse::default()),
        }
    }
}

#[derive(Default)]
struct FakeNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

#[async_trait::async_trait]
impl Notifier for FakeNotifier {
    async fn send(&self, chat_id: &str, text: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((chat_id.to_string(), text.to_string()));
        Ok(())
    }
}

struct TestApp {
    router: Router,
    search: Arc<FakeSearch>,
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.search.api_key = Some("test-key".to_string());
    config.telegram.notification_chat_id = Some("-100group".to_string());
    config
}

async fn spawn_app_with(config: Config) -> TestApp {
    let search = Arc::new(FakeSearch::default());
    let notifier: Arc<dyn Notifier> = Arc::new(FakeNotifier::default());

    let shared = SharedState::with_collaborators(config, search.clone(), Some(notifier))
        .await
        .expect("Failed to create shared state");
    let state = adcheck::api::create_app_state(Arc::new(shared), None);

    TestApp {
        router: adcheck::api::router(state).await,
        search,
    }
}

async fn spawn_app() -> TestApp {
    spawn_app_with(test_config()).await
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

#[tokio::test]
async fn test_health() {
    let app = spawn_app().await;

    let (status, body) = send(&app.router, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["ok"], json!(true));
}

#[tokio::test]
async fn test_check_finds_ads_and_logs_them() {
    let app = spawn_app().await;

    let (status, body) = send(
        &app.router,
        "POST",
        "/v1/check",
        Some(json!({"query": "credit card", "device": "desktop"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["has_ads"], json!(true));
    assert_eq!(data["ads_count"], json!(2));
    assert_eq!(data["types"], json!(["search"]));
    assert_eq!(data["location_used"], Value::Null);
    assert_eq!(data["ads"][0]["domain"], json!("bestcard.com"));
    assert_eq!(data["ads"][1]["title"], json!("Zero Fee Card"));
    assert_eq!(data["ads"][1]["url"], json!("https://zerofee.com.tr"));

    let calls = app.search.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].gl, "tr");
    assert_eq!(calls[0].location, None);

    let (status, body) = send(&app.router, "GET", "/v1/logs", None).await;
    assert_eq!(status, StatusCode::OK);
    let logs = body["data"].as_array().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["query"], json!("credit card"));
    assert_eq!(logs[0]["types"], json!(["search"]));
}

#[tokio::test]
async fn test_check_with_location_tries_every_variant() {
    let app = spawn_app().await;

    let (status, body) = send(
        &app.router,
        "POST",
        "/v1/check",
        Some(json!({"query": "credit card", "location": "Izmir / Bornova"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["attempts_made"], json!(3));

    let locations: Vec<Option<String>> = app
        .search
        .calls
        .lock()
        .unwrap()
        .iter()
        .map(|c| c.location.clone())
        .collect();
    assert_eq!(
        locations,
        vec![
            None,
            Some("Izmir, Turkey".to_string()),
            Some("Izmir / Bornova".to_string())
        ]
    );
}

#[tokio::test]
async fn test_check_rejects_empty_query() {
    let app = spawn_app().await;

    let (status, body) = send(&app.router, "POST", "/v1/check", Some(json!({"query": "  "}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert!(app.search.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_check_upstream_failure_is_bad_gateway() {
    let app = spawn_app().await;

    let (status, body) = send(&app.router, "POST", "/v1/check", Some(json!({"query": "outage"}))).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("503"));

    let (_, logs) = send(&app.router, "GET", "/v1/logs", None).await;
    assert!(logs["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_check_without_api_key_is_config_error() {
    let mut config = test_config();
    config.search.api_key = None;
    let app = spawn_app_with(config).await;

    let (status, body) = send(
        &app.router,
        "POST",
        "/v1/check",
        Some(json!({"query": "credit card"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("API key"));
    assert!(app.search.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_job_lifecycle() {
    let app = spawn_app().await;

    let (status, first) = send(
        &app.router,
        "POST",
        "/v1/jobs",
        Some(json!({"query": "credit card", "interval_minutes": 30, "location": "Izmir"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["data"]["is_active"], json!(true));
    assert_eq!(first["data"]["device"], json!("desktop"));
    let first_id = first["data"]["id"].as_i64().unwrap();

    let (status, second) = send(
        &app.router,
        "POST",
        "/v1/jobs",
        Some(json!({"query": "konut kredisi", "interval_minutes": 60, "device": "mobile"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let second_id = second["data"]["id"].as_i64().unwrap();

    let (status, list) = send(&app.router, "GET", "/v1/jobs", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = list["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|j| j["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![second_id, first_id]);

    let (status, paused) = send(
        &app.router,
        "PUT",
        &format!("/v1/jobs/{first_id}/active"),
        Some(json!({"active": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paused["data"]["is_active"], json!(false));

    let (status, _) = send(&app.router, "DELETE", &format!("/v1/jobs/{first_id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app.router, "DELETE", &format!("/v1/jobs/{first_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn test_job_validation() {
    let app = spawn_app().await;

    let (status, _) = send(
        &app.router,
        "POST",
        "/v1/jobs",
        Some(json!({"query": "credit card", "interval_minutes": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app.router,
        "POST",
        "/v1/jobs",
        Some(json!({"query": "", "interval_minutes": 10})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app.router,
        "PUT",
        "/v1/jobs/999/active",
        Some(json!({"active": true})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_logs_limit_validation() {
    let app = spawn_app().await;

    let (status, _) = send(&app.router, "GET", "/v1/logs?limit=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app.router, "GET", "/v1/logs?limit=5000", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app.router, "GET", "/v1/logs?limit=10", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_trigger_secret() {
    let mut config = test_config();
    config.scheduler.cron_secret = Some("s3cret".to_string());
    let app = spawn_app_with(config).await;

    let (status, _) = send(&app.router, "GET", "/v1/trigger-scheduler", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app.router, "GET", "/v1/trigger-scheduler?secret=nope", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app.router, "GET", "/v1/trigger-scheduler?secret=s3cret", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("triggered"));
}

#[tokio::test]
async fn test_trigger_without_secret_configured_is_allowed() {
    let app = spawn_app().await;

    let (status, _) = send(&app.router, "GET", "/v1/trigger-scheduler", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_preferences_fill_check_defaults() {
    let app = spawn_app().await;

    let (status, _) = send(&app.router, "GET", "/v1/preferences/user-7", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app.router,
        "PUT",
        "/v1/preferences/user-7",
        Some(json!({"device": "mobile", "location": "Ankara"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["device"], json!("mobile"));

    let (status, body) = send(
        &app.router,
        "POST",
        "/v1/check",
        Some(json!({"query": "credit card", "user_id": "user-7"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["device"], json!("mobile"));

    let calls = app.search.calls.lock().unwrap().clone();
    assert!(calls.iter().all(|c| c.device.as_str() == "mobile"));
    assert!(
        calls
            .iter()
            .any(|c| c.location.as_deref() == Some("Ankara, Turkey"))
    );

    let (status, _) = send(&app.router, "DELETE", "/v1/preferences/user-7", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app.router, "DELETE", "/v1/preferences/user-7", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
