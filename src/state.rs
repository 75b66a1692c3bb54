use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::clients::serpapi::SerpApiClient;
use crate::clients::telegram::TelegramClient;
use crate::config::Config;
use crate::db::{JobStore, Store};
use crate::services::{
    AdCheckService, AdCheckSettings, JobRunner, Notifier, PreferenceStore, RunnerSettings,
    SearchBackend,
};

/// Build the HTTP client used for search requests.
fn build_search_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent(concat!("adcheck/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(4)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build search HTTP client: {e}"))
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub checker: Arc<AdCheckService>,

    pub runner: Arc<JobRunner>,

    pub preferences: Arc<PreferenceStore>,
}

impl SharedState {
    /// Wires the SerpApi client and, when a bot token is configured, the
    /// Telegram notifier.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let http_client =
            build_search_http_client(config.search.request_timeout_seconds.into())?;
        let backend: Arc<dyn SearchBackend> = Arc::new(SerpApiClient::with_shared_client(
            http_client,
            &config.search.base_url,
        ));

        let notifier: Option<Arc<dyn Notifier>> = match config
            .telegram
            .bot_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
        {
            Some(token) => Some(Arc::new(TelegramClient::new(
                &config.telegram.api_base_url,
                token,
                Duration::from_secs(config.telegram.request_timeout_seconds.into()),
            )?)),
            None => {
                warn!("No Telegram bot token configured; scheduled alerts will not be sent");
                None
            }
        };

        Self::with_collaborators(config, backend, notifier).await
    }

    /// Same as [`new`](Self::new) with caller-supplied search and messaging
    /// collaborators.
    pub async fn with_collaborators(
        config: Config,
        backend: Arc<dyn SearchBackend>,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        if config.search.api_key.is_none() {
            warn!("No search API key configured; ad checks will fail until SERPAPI_KEY is set");
        }

        let checker = Arc::new(AdCheckService::new(
            backend,
            AdCheckSettings::from(&config.search),
        ));

        let job_store: Arc<dyn JobStore> = Arc::new(store.clone());
        let runner = Arc::new(JobRunner::new(
            job_store,
            checker.clone(),
            notifier,
            RunnerSettings::from(&config),
        ));

        info!(
            policy = %checker.policy(),
            "Ad check engine ready"
        );

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            checker,
            runner,
            preferences: Arc::new(PreferenceStore::new()),
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
