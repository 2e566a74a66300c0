// 导出图表与表格相关模块
pub mod app;
pub mod chart;
pub mod events;
pub mod table;
pub mod terminal;
pub mod ui;

// 重新导出
pub use app::{App, SeriesSummary};
pub use chart::{ChartBounds, ChartModel, ChartSeries};
pub use table::{GridRow, GridTable};
pub use terminal::run_tui;
