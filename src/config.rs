use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;
use crate::types::CatalogKind;

/// Env var that points at an alternative config file
pub const CONFIG_PATH_ENV: &str = "PRICE_RECONCILER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub transport: TransportConfig,
    pub orchestrator: OrchestratorConfig,
    pub catalogs: CatalogsConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TransportConfig {
    pub timeout_seconds: u64,
    pub max_attempts: u32,
    pub backoff_jitter_min_ms: u64,
    pub backoff_jitter_max_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 16,
            max_attempts: 3,
            backoff_jitter_min_ms: 500,
            backoff_jitter_max_ms: 1500,
        }
    }
}

impl TransportConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// How the two catalog passes of a paired run are scheduled
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PairStrategy {
    #[default]
    Sequential,
    Concurrent,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// In-flight fetches per catalog pass
    pub concurrency: usize,
    pub pacing_min_ms: u64,
    pub pacing_max_ms: u64,
    pub pair_strategy: PairStrategy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            pacing_min_ms: 500,
            pacing_max_ms: 2000,
            pair_strategy: PairStrategy::Sequential,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogsConfig {
    pub praktis: CatalogEndpoint,
    pub praktiker: CatalogEndpoint,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogEndpoint {
    /// Search URL template with a single `{}` placeholder
    pub search_url: Option<String>,
}

impl CatalogsConfig {
    pub fn search_url(&self, kind: CatalogKind) -> &str {
        let endpoint = match kind {
            CatalogKind::Praktis => &self.praktis,
            CatalogKind::Praktiker => &self.praktiker,
        };
        endpoint
            .search_url
            .as_deref()
            .unwrap_or_else(|| kind.default_search_url())
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: String,
    pub log_directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "output".to_string(),
            log_directory: "logs".to_string(),
        }
    }
}

impl Config {
    /// Loads `PRICE_RECONCILER_CONFIG` or `config.toml`; a missing default file
    /// yields the built-in defaults.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(&path),
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::from_file(DEFAULT_CONFIG_PATH),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.orchestrator.concurrency == 0 {
            return Err(ConfigError::Invalid {
                field: "orchestrator.concurrency",
                reason: "must be at least 1".into(),
            });
        }
        if self.transport.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "transport.max_attempts",
                reason: "must be at least 1".into(),
            });
        }
        if self.orchestrator.pacing_min_ms > self.orchestrator.pacing_max_ms {
            return Err(ConfigError::Invalid {
                field: "orchestrator.pacing_min_ms",
                reason: "must not exceed pacing_max_ms".into(),
            });
        }
        if self.transport.backoff_jitter_min_ms > self.transport.backoff_jitter_max_ms {
            return Err(ConfigError::Invalid {
                field: "transport.backoff_jitter_min_ms",
                reason: "must not exceed backoff_jitter_max_ms".into(),
            });
        }
        for kind in CatalogKind::ALL {
            let template = self.catalogs.search_url(kind);
            if template.matches("{}").count() != 1 {
                return Err(ConfigError::Invalid {
                    field: "catalogs.search_url",
                    reason: format!("{} template needs exactly one '{{}}': {}", kind, template),
                });
            }
        }
        Ok(())
    }
}
