// 导出模块
pub mod gridchart;
pub mod gridcommon;
pub mod griddata;

// Re-export error types
pub use gridcommon::error::AppError;
