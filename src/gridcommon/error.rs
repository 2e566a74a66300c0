use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AppError {
    /// 获取错误类型的简洁摘要
    ///
    /// Returns a stable category string, logged as `error.summary` so that
    /// failures can be grouped without parsing the message text.
    pub fn get_error_type_summary(&self) -> &'static str {
        match self {
            // 数据获取
            AppError::ApiError(_) => "grid_data_acquisition_failed",
            AppError::HttpError(_) => "grid_api_connection_failed",

            // 数据处理
            AppError::JsonError(_) => "grid_data_parsing_failed",
            AppError::CsvError(_) => "grid_table_export_failed",

            // 系统资源
            AppError::IoError(_) => "grid_io_operation_failed",

            // 配置
            AppError::ConfigError(_) => "grid_chart_configuration_invalid",
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
