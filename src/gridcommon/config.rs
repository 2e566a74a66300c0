//! 电网图表配置模块

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use crate::gridcommon::{AppError, Result};

/// 系统配置常量
pub mod constants {
    /// Default configuration file, relative to the working directory
    pub const DEFAULT_CONFIG_PATH: &str = "config/GridChartConfig.toml";

    /// Public Fingrid open data API
    pub const DEFAULT_API_BASE_URL: &str = "https://data.fingrid.fi/api";

    /// Rows requested per page; large to keep the request count low
    pub const DEFAULT_PAGE_SIZE: u32 = 1000;

    /// Fixed wait before retrying a rate-limited page
    pub const DEFAULT_RATE_LIMIT_DELAY_MS: u64 = 1000;

    /// Length of the fetch window ending now
    pub const WINDOW_HOURS: i64 = 24;

    pub const DEFAULT_USER_AGENT: &str = concat!("grid_chart/", env!("CARGO_PKG_VERSION"));

    pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
}

use constants::*;

/// 电网图表配置
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GridChartConfig {
    /// API配置
    pub api: ApiConfig,

    /// 分页抓取配置
    pub fetch: FetchConfig,

    /// HTTP客户端配置
    pub http: HttpConfig,

    /// 日志配置
    pub logging: LoggingConfig,

    /// 图表配置
    pub chart: ChartConfig,
}

/// API配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL; dataset endpoints live under `{base_url}/datasets/{id}/data`
    pub base_url: String,

    /// Static API key sent as `x-api-key`. Usually supplied through the
    /// `API_KEY` environment variable instead of the file.
    pub api_key: Option<String>,
}

/// 分页抓取配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// 每页数据条数
    pub page_size: u32,

    /// 遇到429后的等待时间（毫秒）
    pub rate_limit_delay_ms: u64,
}

/// HTTP客户端配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// 请求超时（秒）
    pub timeout_secs: u64,

    /// 连接超时（秒）
    pub connect_timeout_secs: u64,

    /// Optional proxy, e.g. `socks5://127.0.0.1:1080`
    pub proxy_url: Option<String>,

    pub user_agent: String,
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别 (trace, debug, info, warn, error)
    pub log_level: String,

    /// Also write logs to this file when set
    pub log_file: Option<String>,

    /// 使用JSON格式输出
    pub json: bool,
}

/// 图表配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Draw every observation as a point on top of the line
    pub show_markers: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: None,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            rate_limit_delay_ms: DEFAULT_RATE_LIMIT_DELAY_MS,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
            proxy_url: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: None,
            json: false,
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self { show_markers: true }
    }
}

impl GridChartConfig {
    /// 从文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(AppError::IoError)?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| AppError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load the configuration file, falling back to defaults when the
    /// default path does not exist. A path the user named explicitly must
    /// exist.
    pub fn load<P: AsRef<Path>>(path: P, explicit: bool) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            return Self::from_file(path);
        }

        if explicit {
            return Err(AppError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        debug!("No config file at {}, using defaults", path.display());
        let config = Self::default();
        config.validate()?;
        Ok(config)
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(AppError::ConfigError("api.base_url must not be empty".to_string()));
        }

        if self.fetch.page_size == 0 {
            return Err(AppError::ConfigError("fetch.page_size must be greater than 0".to_string()));
        }

        let level = self.logging.log_level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(AppError::ConfigError(format!(
                "Unknown logging.log_level: {}",
                self.logging.log_level
            )));
        }

        Ok(())
    }

    /// Replace the file's API key with one given on the command line or in
    /// the environment. Blank values are ignored.
    pub fn apply_api_key_override(&mut self, api_key: Option<String>) {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.api.api_key = Some(key);
        }
    }
}

impl ApiConfig {
    /// The configured API key, or a `ConfigError` when none is set.
    pub fn require_api_key(&self) -> Result<&str> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(AppError::ConfigError(
                "API_KEY is not set (use --api-key, the API_KEY environment variable, a .env file or api.api_key)"
                    .to_string(),
            )),
        }
    }
}

/// 加载 .env 文件中的环境变量
///
/// With `None` the file is searched from the working directory upwards.
/// Variables already set in the process environment are not overwritten.
/// A missing file is not an error; the loaded path is returned otherwise.
pub fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>> {
    let loaded = match path {
        Some(path) => dotenvy::from_path(path).map(|_| path.to_path_buf()),
        None => dotenvy::dotenv(),
    };

    match loaded {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(AppError::ConfigError(format!("Failed to load .env file: {}", e))),
    }
}
