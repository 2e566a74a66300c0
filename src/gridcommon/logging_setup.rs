//! 日志系统初始化模块
//!
//! Console output always goes to stderr so that `--output csv` keeps stdout
//! clean. An optional log file is written through a non-blocking appender.

use crate::gridcommon::{AppError, LoggingConfig, Result};
use std::path::Path;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

/// 自定义Guard trait，避免dyn Drop警告
pub trait LogGuard: Send + Sync {}

/// 空的Guard实现，用于未启用日志文件时的占位符
pub struct DummyGuard;

impl LogGuard for DummyGuard {}

/// 为 tracing_appender 的 WorkerGuard 实现 LogGuard trait
impl LogGuard for tracing_appender::non_blocking::WorkerGuard {}

/// Build the filter string for the configured level.
///
/// HTTP internals are capped at `warn` unless `RUST_LOG` says otherwise.
pub fn business_filter(config: &LoggingConfig, verbose: bool) -> String {
    let level = if verbose {
        "debug".to_string()
    } else {
        config.log_level.to_ascii_lowercase()
    };
    format!("{},hyper=warn,reqwest=warn,h2=warn", level)
}

fn build_filter(filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter))
}

/// 初始化日志系统
///
/// The returned guard must be held until the program exits, otherwise
/// buffered file output is lost.
pub fn init_logging(config: &LoggingConfig, verbose: bool) -> Result<Box<dyn LogGuard>> {
    let filter = business_filter(config, verbose);

    let console_layer = if config.json {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .json()
            .with_filter(build_filter(&filter))
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(build_filter(&filter))
            .boxed()
    };

    let (file_layer, guard): (Option<_>, Box<dyn LogGuard>) = match &config.log_file {
        Some(log_file) => {
            let path = Path::new(log_file);
            let directory = match path.parent() {
                Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
                _ => Path::new(".").to_path_buf(),
            };
            let file_name = path
                .file_name()
                .ok_or_else(|| AppError::ConfigError(format!("Invalid log file path: {}", log_file)))?;

            std::fs::create_dir_all(&directory)?;

            let appender = tracing_appender::rolling::never(&directory, file_name);
            let (writer, worker_guard) = tracing_appender::non_blocking(appender);

            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_filter(build_filter(&filter));

            (Some(layer), Box::new(worker_guard))
        }
        None => (None, Box::new(DummyGuard)),
    };

    Registry::default()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| AppError::ConfigError(format!("Failed to initialize logging: {}", e)))?;

    Ok(guard)
}
