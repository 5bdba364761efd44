use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use config::{Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub bind: SocketAddr,
    /// Allowed CORS origins. Empty allows any origin.
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 5000)),
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 12,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".into(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Minimum spacing between two outbound requests, across all stores.
    pub delay_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { delay_ms: 3000 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub attempts: u32,
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub freshness_secs: u64,
    /// Where cached upstream bodies are persisted. `None` keeps them in memory.
    pub path: Option<PathBuf>,
    /// Cache blank upstream bodies too.
    pub store_empty: bool,
    pub sweep_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            freshness_secs: 1800,
            path: Some(PathBuf::from("data/cache.json")),
            store_empty: false,
            sweep_interval_secs: 600,
        }
    }
}

impl CacheConfig {
    pub fn freshness(&self) -> Duration {
        Duration::from_secs(self.freshness_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    pub path: Option<PathBuf>,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            path: Some(PathBuf::from("data/backup.json")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    /// Deadline for one full aggregate run.
    pub timeout_secs: u64,
    pub estimated_promo_days: i64,
    pub include_upcoming: bool,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 3600,
            timeout_secs: 120,
            estimated_promo_days: 7,
            include_upcoming: true,
        }
    }
}

impl ScraperConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub enabled: bool,
    /// Replaces the built-in upstream URL.
    pub url: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub level: String,
    pub api: ApiConfig,
    pub fetch: FetchConfig,
    pub rate_limit: RateLimitConfig,
    pub retry: RetryConfig,
    pub cache: CacheConfig,
    pub backup: BackupConfig,
    pub scraper: ScraperConfig,
    /// Per-extractor overrides keyed by source name (`epic_temporary`, ...).
    pub sources: HashMap<String, SourceConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: "info".into(),
            api: ApiConfig::default(),
            fetch: FetchConfig::default(),
            rate_limit: RateLimitConfig::default(),
            retry: RetryConfig::default(),
            cache: CacheConfig::default(),
            backup: BackupConfig::default(),
            scraper: ScraperConfig::default(),
            sources: HashMap::new(),
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let environment = env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        let config_file = match environment.as_str() {
            "production" => "prod",
            _ => "dev",
        };

        let mut config: Self = config::Config::builder()
            .add_source(File::with_name("config/default.yaml").required(false))
            .add_source(File::with_name(&format!("config/{}.yaml", config_file)).required(false))
            .add_source(File::with_name("config/local.yaml").required(false))
            .add_source(Environment::with_prefix("APP").prefix_separator("__").separator("__"))
            .build()
            .context("building configuration")?
            .try_deserialize()
            .context("parsing configuration")?;

        if let Ok(port) = env::var("PORT") {
            let port = port.parse::<u16>().context("PORT must be a port number")?;
            config.api.bind.set_port(port);
        }

        Ok(config)
    }

    pub fn source(&self, name: &str) -> SourceConfig {
        self.sources.get(name).cloned().unwrap_or_default()
    }
}
