use crate::env_config::error::ConfigError;
use crate::env_config::models::app_env::Env;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log: LogConfig,
    pub clickhouse: ClickhouseConfig,
    pub ingestion: IngestionConfig,
    pub quotes: QuotesConfig,
    pub query: QueryConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ClickhouseConfig {
    pub timeout: u64,
    pub startup_retries: u32,
    pub retry_delay_seconds: u64,
    pub table: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    pub workers: usize,
    pub lookback_days: i64,
    pub default_interval: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct QuotesConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub default_days: i64,
    pub buffer_days: i64,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

impl Default for ClickhouseConfig {
    fn default() -> Self {
        Self {
            timeout: 10,
            startup_retries: 10,
            retry_delay_seconds: 3,
            table: "stock_prices".to_string(),
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            lookback_days: 30,
            default_interval: "1d".to_string(),
        }
    }
}

impl Default for QuotesConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com/v8/finance".to_string(),
            timeout_seconds: 10,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_days: 252,
            buffer_days: 10,
        }
    }
}

impl AppConfig {
    /// Loads `<config_dir>/<env>.toml`.
    pub fn new(config_dir: &str, env: &Env) -> Result<AppConfig, ConfigError> {
        let path = Path::new(config_dir).join(format!("{env}.toml"));
        let path_display = path.display().to_string();

        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::ReadFile {
            path: path_display.clone(),
            source,
        })?;

        Self::from_toml_str(&raw).map_err(|source| ConfigError::ParseFile {
            path: path_display,
            source,
        })
    }

    pub fn from_toml_str(raw: &str) -> Result<AppConfig, toml::de::Error> {
        toml::from_str(raw)
    }
}
