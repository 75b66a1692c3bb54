use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::domain::Device;

/// Failure of a single search request. Never retried at this layer.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("search request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("search API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed search response: {0}")]
    Decode(String),

    #[error("invalid search endpoint: {0}")]
    Endpoint(String),
}

/// Fully resolved parameters of one search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub query: String,
    pub gl: String,
    pub hl: String,
    pub google_domain: String,
    pub api_key: String,
    pub device: Device,
    pub num: u32,
    pub location: Option<String>,
}

impl SearchParams {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("engine", "google".to_string()),
            ("q", self.query.clone()),
            ("gl", self.gl.clone()),
            ("hl", self.hl.clone()),
            ("google_domain", self.google_domain.clone()),
            ("api_key", self.api_key.clone()),
            ("device", self.device.as_str().to_string()),
            ("num", self.num.to_string()),
        ];
        if let Some(location) = &self.location {
            pairs.push(("location", location.clone()));
        }
        pairs
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAd {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub displayed_link: Option<String>,
    #[serde(default)]
    pub tracking_link: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EchoedParameters {
    #[serde(default)]
    pub location: Option<String>,
}

/// The parts of a SerpApi Google response this crate reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SerpResponse {
    #[serde(default)]
    pub ads: Vec<RawAd>,
    #[serde(default)]
    pub ad_results: Vec<RawAd>,
    #[serde(default)]
    pub shopping_results: Option<serde_json::Value>,
    #[serde(default)]
    pub inline_shopping_results: Option<serde_json::Value>,
    #[serde(default)]
    pub search_parameters: Option<EchoedParameters>,
    #[serde(default)]
    pub error: Option<String>,
}

impl SerpResponse {
    /// `ads` when present and non-empty, otherwise `ad_results`.
    #[must_use]
    pub fn raw_ads(&self) -> &[RawAd] {
        if self.ads.is_empty() {
            &self.ad_results
        } else {
            &self.ads
        }
    }

    #[must_use]
    pub fn has_shopping(&self) -> bool {
        is_non_empty(self.shopping_results.as_ref())
            || is_non_empty(self.inline_shopping_results.as_ref())
    }

    #[must_use]
    pub fn echoed_location(&self) -> Option<&str> {
        self.search_parameters
            .as_ref()
            .and_then(|p| p.location.as_deref())
            .filter(|l| !l.is_empty())
    }
}

fn is_non_empty(value: Option<&serde_json::Value>) -> bool {
    match value {
        None | Some(serde_json::Value::Null) => false,
        Some(serde_json::Value::Array(items)) => !items.is_empty(),
        Some(serde_json::Value::Object(map)) => !map.is_empty(),
        Some(serde_json::Value::Bool(b)) => *b,
        Some(serde_json::Value::String(s)) => !s.is_empty(),
        Some(serde_json::Value::Number(_)) => true,
    }
}

#[derive(Clone)]
pub struct SerpApiClient {
    client: Client,
    base_url: String,
}

impl SerpApiClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("adcheck/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build search HTTP client: {e}"))?;

        Ok(Self::with_shared_client(client, base_url))
    }

    #[must_use]
    pub fn with_shared_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }

    fn build_url(&self, params: &SearchParams) -> Result<Url, UpstreamError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| UpstreamError::Endpoint(e.to_string()))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params.query_pairs() {
                pairs.append_pair(key, &value);
            }
        }
        Ok(url)
    }

    pub async fn search(&self, params: &SearchParams) -> Result<SerpResponse, UpstreamError> {
        let url = self.build_url(params)?;
        let start = Instant::now();

        debug!(
            query = %params.query,
            device = %params.device,
            location = ?params.location,
            "Sending search request"
        );

        let result = self.fetch(url).await;

        let outcome = if result.is_ok() { "success" } else { "error" };
        metrics::counter!("search_requests_total", "outcome" => outcome).increment(1);
        metrics::histogram!("search_request_duration_seconds")
            .record(start.elapsed().as_secs_f64());

        result
    }

    async fn fetch(&self, url: Url) -> Result<SerpResponse, UpstreamError> {
        // The URL carries the API key; keep it out of error messages.
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| UpstreamError::Transport(e.without_url()))?;
        let parsed: SerpResponse =
            serde_json::from_str(&body).map_err(|e| UpstreamError::Decode(e.to_string()))?;

        if let Some(message) = &parsed.error {
            debug!("Search API reported: {}", message);
        }

        Ok(parsed)
    }
}
