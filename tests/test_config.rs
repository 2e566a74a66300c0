//! 配置文件测试

use std::fs;
use std::path::PathBuf;

use grid_chart::gridcommon::config::constants::{DEFAULT_CONFIG_PATH, DEFAULT_USER_AGENT};
use grid_chart::gridcommon::{load_env_file, AppError, GridChartConfig};

fn shipped_config_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CONFIG_PATH)
}

#[test]
fn test_shipped_config_is_valid() {
    let config = GridChartConfig::from_file(shipped_config_path()).expect("配置文件应能解析");

    assert_eq!(config.api.base_url, "https://data.fingrid.fi/api");
    assert!(config.api.api_key.is_none(), "示例配置不应包含 API key");
    assert_eq!(config.fetch.page_size, 1000);
    assert_eq!(config.fetch.rate_limit_delay_ms, 1000);
    assert!(config.http.proxy_url.is_none());
    // 文件中未写的字段使用默认值
    assert_eq!(config.http.user_agent, DEFAULT_USER_AGENT);
    assert!(config.chart.show_markers);
}

#[test]
fn test_api_key_override() {
    let mut config = GridChartConfig::from_file(shipped_config_path()).unwrap();

    config.apply_api_key_override(Some("   ".to_string()));
    assert!(config.api.require_api_key().is_err(), "空白 key 不应生效");

    config.apply_api_key_override(Some("from-env".to_string()));
    assert_eq!(config.api.require_api_key().unwrap(), "from-env");

    config.apply_api_key_override(None);
    assert_eq!(config.api.require_api_key().unwrap(), "from-env");
}

#[test]
fn test_missing_key_error_classification() {
    let config = GridChartConfig::default();
    let err = config.api.require_api_key().unwrap_err();

    assert!(matches!(err, AppError::ConfigError(_)));
    assert_eq!(err.get_error_type_summary(), "grid_chart_configuration_invalid");
    assert!(err.to_string().contains("API_KEY"));
}

#[test]
fn test_env_file_feeds_environment() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".env");
    fs::write(
        &path,
        "GRID_CHART_TEST_ENV_KEY=from-dotenv\nGRID_CHART_TEST_ENV_PRESET=from-dotenv\n",
    )
    .unwrap();

    // 已存在的环境变量优先于 .env
    std::env::set_var("GRID_CHART_TEST_ENV_PRESET", "from-shell");

    let loaded = load_env_file(Some(&path)).expect(".env 应能加载");
    assert_eq!(loaded.as_deref(), Some(path.as_path()));
    assert_eq!(std::env::var("GRID_CHART_TEST_ENV_KEY").unwrap(), "from-dotenv");
    assert_eq!(std::env::var("GRID_CHART_TEST_ENV_PRESET").unwrap(), "from-shell");

    // .env 中的 key 经 CLI/环境变量覆盖进入配置
    let mut config = GridChartConfig::default();
    config.apply_api_key_override(std::env::var("GRID_CHART_TEST_ENV_KEY").ok());
    assert_eq!(config.api.require_api_key().unwrap(), "from-dotenv");
}

#[test]
fn test_missing_env_file_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = load_env_file(Some(&dir.path().join(".env"))).unwrap();
    assert!(loaded.is_none());
}
