use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::domain::SelectionPolicy;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub search: SearchConfig,

    pub telegram: TelegramConfig,

    pub scheduler: SchedulerConfig,

    pub server: ServerConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    #[serde(default)]
    pub suppress_connection_errors: bool,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/adcheck.db".to_string(),
            log_level: "info".to_string(),
            suppress_connection_errors: false,
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub base_url: String,

    /// SerpApi key. Checks fail with a configuration error while unset.
    pub api_key: Option<String>,

    pub google_domain: String,

    pub default_gl: String,

    pub default_hl: String,

    /// `num` sent upstream and the cap on extracted ads.
    pub result_count: u32,

    pub request_timeout_seconds: u32,

    pub selection_policy: SelectionPolicy,

    /// Used for scheduled jobs that have no location of their own.
    pub default_location: Option<String>,

    /// Appended as `", <suffix>"` when normalizing free-text locations.
    /// Empty disables the suffix.
    pub location_country_suffix: String,

    /// Lowercase needle -> canonical location. Matched by substring.
    pub location_aliases: BTreeMap<String, String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        let mut aliases = BTreeMap::new();
        aliases.insert("istanbul".to_string(), "Istanbul, Turkey".to_string());

        Self {
            base_url: "https://serpapi.com/search".to_string(),
            api_key: None,
            google_domain: "google.com.tr".to_string(),
            default_gl: "tr".to_string(),
            default_hl: "tr".to_string(),
            result_count: 10,
            request_timeout_seconds: 20,
            selection_policy: SelectionPolicy::BestOfAll,
            default_location: None,
            location_country_suffix: "Turkey".to_string(),
            location_aliases: aliases,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub api_base_url: String,

    pub bot_token: Option<String>,

    /// Default chat for scheduled alerts when a job has no target of its own.
    pub notification_chat_id: Option<String>,

    pub request_timeout_seconds: u32,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.telegram.org".to_string(),
            bot_token: None,
            notification_chat_id: None,
            request_timeout_seconds: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,

    /// Sleep between two passes of the run body in loop mode.
    pub poll_interval_seconds: u32,

    /// When set, passes are driven by this cron expression instead of the
    /// fixed-delay loop.
    pub cron_expression: Option<String>,

    /// Shared secret expected by the external trigger endpoint.
    pub cron_secret: Option<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_seconds: 60,
            cron_expression: None,
            cron_secret: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 10000,
            cors_allowed_origins: vec![
                "http://localhost:10000".to_string(),
                "http://127.0.0.1:10000".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = HashMap::new();
        labels.insert("app".to_string(), "adcheck".to_string());

        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

impl Config {
    /// Loads `.env`, the first config file found, then environment overrides.
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            info!("Loaded environment from: {}", path.display());
        }

        let mut config = Self::load_file()?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        for path in &Self::config_paths() {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("adcheck").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".adcheck").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            Self::default().save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Secrets and deployment knobs usually come from the environment.
    /// Blank values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("SERPAPI_KEY") {
            self.search.api_key = Some(v);
        }
        if let Some(v) = get("GOOGLE_DOMAIN") {
            self.search.google_domain = v;
        }
        if let Some(v) = get("DEFAULT_GL") {
            self.search.default_gl = v;
        }
        if let Some(v) = get("DEFAULT_HL") {
            self.search.default_hl = v;
        }
        if let Some(v) = get("DEFAULT_LOCATION") {
            self.search.default_location = Some(v);
        }
        if let Some(v) = get("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = Some(v);
        }
        if let Some(v) = get("TELEGRAM_NOTIFICATION_GROUP_ID") {
            self.telegram.notification_chat_id = Some(v);
        }
        if let Some(v) = get("CRON_SECRET") {
            self.scheduler.cron_secret = Some(v);
        }
        if let Some(v) = get("DATABASE_URL") {
            self.general.database_path = v;
        }
        if let Some(port) = get("PORT").and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.scheduler.enabled
            && self.scheduler.poll_interval_seconds == 0
            && self.scheduler.cron_expression.is_none()
        {
            anyhow::bail!("Scheduler poll interval must be > 0 or cron expression must be set");
        }

        if self.search.result_count == 0 {
            anyhow::bail!("search.result_count must be > 0");
        }

        if self.search.base_url.is_empty() {
            anyhow::bail!("search.base_url cannot be empty");
        }

        crate::db::sqlite_file(&self.general.database_path)
            .context("general.database_path (DATABASE_URL) is invalid")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scheduler.poll_interval_seconds, 60);
        assert_eq!(config.search.result_count, 10);
        assert_eq!(config.search.google_domain, "google.com.tr");
        assert_eq!(config.search.selection_policy, SelectionPolicy::BestOfAll);
        assert!(config.search.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[search]"));
        assert!(toml_str.contains("[scheduler]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [search]
            selection_policy = "first_hit"
            default_location = "Ankara"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.search.selection_policy, SelectionPolicy::FirstHit);
        assert_eq!(config.search.default_location.as_deref(), Some("Ankara"));

        assert_eq!(config.search.default_gl, "tr");
        assert_eq!(config.scheduler.poll_interval_seconds, 60);
    }

    #[test]
    fn env_overrides_take_precedence_and_skip_blanks() {
        let env: HashMap<&str, &str> = [
            ("SERPAPI_KEY", "secret"),
            ("TELEGRAM_NOTIFICATION_GROUP_ID", "-100123"),
            ("DEFAULT_GL", "  "),
            ("PORT", "8088"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|k| env.get(k).map(|v| (*v).to_string()));

        assert_eq!(config.search.api_key.as_deref(), Some("secret"));
        assert_eq!(
            config.telegram.notification_chat_id.as_deref(),
            Some("-100123")
        );
        assert_eq!(config.search.default_gl, "tr");
        assert_eq!(config.server.port, 8088);
    }

    #[test]
    fn validate_rejects_zero_interval_without_cron() {
        let mut config = Config::default();
        config.scheduler.poll_interval_seconds = 0;
        assert!(config.validate().is_err());

        config.scheduler.cron_expression = Some("0 * * * * *".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_non_sqlite_database_url() {
        let mut config = Config::default();
        config.apply_overrides(|k| {
            (k == "DATABASE_URL").then(|| "postgres://user:pw@db.internal/ads".to_string())
        });

        let err = config.validate().unwrap_err();
        assert!(format!("{err:#}").contains("only sqlite: URLs are supported"));

        config.general.database_path = "sqlite::memory:".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn notification_timeout_defaults_to_single_digit_seconds() {
        let config = Config::default();
        assert!(config.telegram.request_timeout_seconds < 10);
    }
}
