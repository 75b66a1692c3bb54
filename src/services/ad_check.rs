//! Query strategy engine: runs the location attempts of one check, picks the
//! winning response and turns it into a [`CheckResult`].

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::clients::serpapi::{RawAd, SearchParams, SerpApiClient, SerpResponse, UpstreamError};
use crate::config::SearchConfig;
use crate::domain::{AdType, SelectionPolicy};
use crate::models::check::{AdDetail, CheckRequest, CheckResult};
use crate::services::attempts::{Attempt, LocationRules, build_attempts};

/// One search request against the external API.
#[async_trait::async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, params: &SearchParams) -> Result<SerpResponse, UpstreamError>;
}

#[async_trait::async_trait]
impl SearchBackend for SerpApiClient {
    async fn search(&self, params: &SearchParams) -> Result<SerpResponse, UpstreamError> {
        Self::search(self, params).await
    }
}

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

#[derive(Debug, Clone)]
pub struct AdCheckSettings {
    pub api_key: Option<String>,
    pub google_domain: String,
    pub result_count: u32,
    pub policy: SelectionPolicy,
    pub location_rules: LocationRules,
}

impl From<&SearchConfig> for AdCheckSettings {
    fn from(config: &SearchConfig) -> Self {
        Self {
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            google_domain: config.google_domain.clone(),
            result_count: config.result_count,
            policy: config.selection_policy,
            location_rules: LocationRules::from_config(config),
        }
    }
}

pub struct AdCheckService {
    backend: Arc<dyn SearchBackend>,
    settings: AdCheckSettings,
}

impl AdCheckService {
    #[must_use]
    pub fn new(backend: Arc<dyn SearchBackend>, settings: AdCheckSettings) -> Self {
        Self { backend, settings }
    }

    #[must_use]
    pub const fn policy(&self) -> SelectionPolicy {
        self.settings.policy
    }

    /// Runs every attempt the policy asks for, sequentially.
    ///
    /// # Errors
    /// [`CheckError::Config`] when no API key is configured, before any
    /// request is sent. [`CheckError::Upstream`] as soon as one attempt fails.
    pub async fn check_ads(&self, request: &CheckRequest) -> Result<CheckResult, CheckError> {
        let api_key = self
            .settings
            .api_key
            .clone()
            .ok_or_else(|| CheckError::Config("search API key is not set".to_string()))?;

        let attempts = build_attempts(
            request.location.as_deref(),
            &self.settings.location_rules,
        );
        let start = Instant::now();
        let mut selection = Selection::new(self.settings.policy);

        for (index, attempt) in attempts.into_iter().enumerate() {
            let params = self.params_for(request, &api_key, &attempt);
            let response = self.backend.search(&params).await?;
            let ads_seen = response.raw_ads().len();

            debug!(
                query = %request.query,
                attempt = attempt.kind.as_str(),
                location = ?attempt.location,
                ads = ads_seen,
                "Search attempt finished"
            );

            let flow = selection.offer(Candidate {
                index,
                ads_seen,
                attempt,
                response,
            });
            if flow.is_break() {
                break;
            }
        }

        let attempts_made = selection.attempts_made;
        let Some(winner) = selection.into_winner() else {
            return Err(CheckError::Config(
                "no search attempt could be built".to_string(),
            ));
        };

        let ads = extract_ads(&winner.response, self.settings.result_count);
        let has_ads = !ads.is_empty();
        let mut types = Vec::new();
        if has_ads {
            types.push(AdType::Search);
        }
        if winner.response.has_shopping() {
            types.push(AdType::Shopping);
        }

        let location_used = winner
            .response
            .echoed_location()
            .map(str::to_string)
            .or(winner.attempt.location);

        let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        info!(
            event = "ad_check_completed",
            query = %request.query,
            device = %request.device,
            policy = %self.settings.policy,
            attempts = attempts_made,
            winning_attempt = winner.index,
            ads_count = ads.len(),
            duration_ms = latency_ms,
            "Ad check completed"
        );
        metrics::counter!(
            "ad_checks_total",
            "has_ads" => if has_ads { "true" } else { "false" }
        )
        .increment(1);

        Ok(CheckResult {
            query: request.query.clone(),
            has_ads,
            ads_count: ads.len(),
            types,
            latency_ms,
            gl: request.gl.clone(),
            hl: request.hl.clone(),
            device: request.device,
            location_used,
            policy: self.settings.policy,
            attempts_made,
            ads,
        })
    }

    fn params_for(&self, request: &CheckRequest, api_key: &str, attempt: &Attempt) -> SearchParams {
        SearchParams {
            query: request.query.clone(),
            gl: request.gl.clone(),
            hl: request.hl.clone(),
            google_domain: self.settings.google_domain.clone(),
            api_key: api_key.to_string(),
            device: request.device,
            num: self.settings.result_count,
            location: attempt.location.clone(),
        }
    }
}

struct Candidate {
    index: usize,
    ads_seen: usize,
    attempt: Attempt,
    response: SerpResponse,
}

/// Keeps the current winner while attempts come in.
struct Selection {
    policy: SelectionPolicy,
    winner: Option<Candidate>,
    attempts_made: usize,
}

impl Selection {
    const fn new(policy: SelectionPolicy) -> Self {
        Self {
            policy,
            winner: None,
            attempts_made: 0,
        }
    }

    /// `Break` when no further attempt may change the outcome.
    fn offer(&mut self, candidate: Candidate) -> ControlFlow<()> {
        self.attempts_made += 1;

        match self.policy {
            SelectionPolicy::BestOfAll => {
                let better = self
                    .winner
                    .as_ref()
                    .is_none_or(|best| candidate.ads_seen > best.ads_seen);
                if better {
                    self.winner = Some(candidate);
                }
                ControlFlow::Continue(())
            }
            SelectionPolicy::FirstHit => {
                let hit = candidate.ads_seen > 0;
                self.winner = Some(candidate);
                if hit {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            }
        }
    }

    fn into_winner(self) -> Option<Candidate> {
        self.winner
    }
}

fn extract_ads(response: &SerpResponse, limit: u32) -> Vec<AdDetail> {
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    response
        .raw_ads()
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, raw)| {
            let url = resolve_url(raw);
            AdDetail {
                pos: i + 1,
                title: resolve_title(raw),
                domain: host(&url),
                url,
            }
        })
        .collect()
}

fn first_non_blank<'a>(candidates: &[Option<&'a String>]) -> Option<&'a str> {
    candidates
        .iter()
        .copied()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
}

fn resolve_title(raw: &RawAd) -> String {
    first_non_blank(&[raw.title.as_ref(), raw.headline.as_ref()])
        .unwrap_or_default()
        .to_string()
}

fn resolve_url(raw: &RawAd) -> String {
    first_non_blank(&[
        raw.link.as_ref(),
        raw.displayed_link.as_ref(),
        raw.tracking_link.as_ref(),
    ])
    .unwrap_or_default()
    .to_string()
}

/// Bare domain of `url`: scheme and a leading `www.` removed. Scheme-less
/// display links are read as https. Anything unparsable comes back unchanged.
#[must_use]
pub fn host(url: &str) -> String {
    let parsed = match Url::parse(url) {
        Ok(parsed) => Ok(parsed),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("https://{url}")),
        Err(e) => Err(e),
    };

    let Ok(parsed) = parsed else {
        return url.to_string();
    };
    let Some(host) = parsed.host_str().filter(|h| !h.is_empty()) else {
        return url.to_string();
    };

    let host = host.strip_prefix("www.").unwrap_or(host);
    match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}
