// 导出数据获取相关模块
pub mod api;
pub mod downloader;
pub mod paginator;

// 重新导出
pub use api::FingridApi;
pub use downloader::{Downloader, GridSnapshot};
pub use paginator::{fetch_all_pages, FetchOutcome, FetchTermination, PageResponse, PageSource, RetryPolicy};
