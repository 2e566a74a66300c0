// 电网数据图表主程序 - 获取最近24小时的发电与排放数据并绘图
use std::io;
use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, ValueEnum};
use tracing::{error, info};

use grid_chart::gridchart::{run_tui, App, GridTable};
use grid_chart::gridcommon::config::constants::{DEFAULT_CONFIG_PATH, WINDOW_HOURS};
use grid_chart::gridcommon::{init_logging, load_env_file, GridChartConfig, Result, TimeWindow};
use grid_chart::griddata::Downloader;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputMode {
    /// Interactive terminal chart
    Chart,
    /// Timestamp-aligned table as CSV on stdout
    Csv,
}

/// Fingrid wind, hydro and nuclear generation against CO2 emissions
#[derive(Debug, Parser)]
#[command(name = "grid_chart", version, about)]
struct Args {
    /// Configuration file
    #[arg(short, long, env = "CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Fingrid open data API key; also read from a `.env` file
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// What to do with the fetched data
    #[arg(short, long, value_enum, default_value_t = OutputMode::Chart)]
    output: OutputMode,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // 先加载 .env，使 clap 能从环境变量读取 API_KEY 等参数
    let env_file = load_env_file(None).context("failed to load .env file")?;
    let args = Args::parse();

    let explicit = args.config.is_some();
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let mut config = GridChartConfig::load(&config_path, explicit)
        .with_context(|| format!("failed to load configuration from {}", config_path.display()))?;
    config.apply_api_key_override(args.api_key.clone());

    // 持有 guard，直到 main 函数结束，确保文件被正确写入
    let _log_guard = init_logging(&config.logging, args.verbose)?;
    if let Some(path) = &env_file {
        info!("Loaded environment from {}", path.display());
    }

    if let Err(e) = run_app(&config, args.output).await {
        error!(
            error.summary = e.get_error_type_summary(),
            error.details = %e,
            "grid_chart failed"
        );
        return Err(e.into());
    }

    Ok(())
}

/// 应用程序的核心业务逻辑
async fn run_app(config: &GridChartConfig, output: OutputMode) -> Result<()> {
    // 缺少 API key 时在任何网络请求之前退出
    let downloader = Downloader::from_config(config)?;

    let window = TimeWindow::last_hours(Utc::now(), WINDOW_HOURS);
    info!("Fetching grid data for {}", window);

    let snapshot = downloader.run(window).await;
    info!(
        "Fetched {} observations across {} datasets",
        snapshot.total_observations(),
        snapshot.series.len()
    );

    match output {
        OutputMode::Csv => {
            let table = GridTable::from_snapshot(&snapshot);
            table.write_csv(io::stdout().lock())?;
            info!("Wrote {} rows", table.len());
        }
        OutputMode::Chart => {
            run_tui(App::new(&snapshot, &config.chart))?;
        }
    }

    Ok(())
}
