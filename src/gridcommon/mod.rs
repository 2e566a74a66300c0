// 导出共享模块
pub mod config;
pub mod error;
pub mod logging_setup;
pub mod models;

// 重新导出常用类型，方便使用
pub use config::{load_env_file, ApiConfig, ChartConfig, FetchConfig, GridChartConfig, HttpConfig, LoggingConfig};
pub use error::{AppError, Result};
pub use logging_setup::{init_logging, LogGuard};
pub use models::{DataPage, FetchTask, GridDataset, Observation, RawObservation, SeriesAxis, TimeWindow};
