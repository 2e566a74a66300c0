//! Paginated fetch loop.
//!
//! Walks pages starting at 1 until a page comes back without rows. A 429
//! repeats the same page after a fixed delay, any other failure ends the
//! dataset with whatever was collected so far.

use crate::gridcommon::{DataPage, FetchTask, GridDataset, Observation, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Outcome of a single page request that reached the server
#[derive(Debug, Clone)]
pub enum PageResponse {
    /// HTTP 200 with a decoded body
    Data(DataPage),
    /// HTTP 429
    RateLimited,
    /// Any other status; the body is kept for the log
    Failed { status: u16, body: String },
}

/// A source of pages for one dataset.
///
/// `Err` means the request itself failed (transport or decoding); status
/// codes are reported through [`PageResponse`].
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, task: &FetchTask, page: u32) -> Result<PageResponse>;
}

/// Rate limit handling. The retry count is not capped.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub rate_limit_delay: Duration,
}

impl RetryPolicy {
    pub fn from_millis(ms: u64) -> Self {
        Self {
            rate_limit_delay: Duration::from_millis(ms),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_millis(crate::gridcommon::config::constants::DEFAULT_RATE_LIMIT_DELAY_MS)
    }
}

/// Why the loop stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchTermination {
    /// An empty page was returned
    Exhausted,
    /// A request failed; rows fetched before it are kept
    Aborted(String),
}

/// Everything fetched for one dataset
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub dataset: GridDataset,
    pub observations: Vec<Observation>,
    /// Pages that returned rows
    pub pages_fetched: u32,
    pub rate_limit_retries: u32,
    /// Rows dropped for a missing or unparseable `startTime`/`value`
    pub skipped_rows: usize,
    pub termination: FetchTermination,
}

impl FetchOutcome {
    fn new(dataset: GridDataset) -> Self {
        Self {
            dataset,
            observations: Vec::new(),
            pages_fetched: 0,
            rate_limit_retries: 0,
            skipped_rows: 0,
            termination: FetchTermination::Exhausted,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.termination, FetchTermination::Aborted(_))
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// 抓取一个数据集的全部分页
#[instrument(skip(source, policy), fields(dataset = %task.dataset))]
pub async fn fetch_all_pages<S>(source: &S, task: &FetchTask, policy: &RetryPolicy) -> FetchOutcome
where
    S: PageSource + ?Sized,
{
    let mut outcome = FetchOutcome::new(task.dataset);
    let mut page: u32 = 1;

    loop {
        debug!(page, "Requesting page");

        match source.fetch_page(task, page).await {
            Ok(PageResponse::Data(data_page)) => {
                if let Some(pagination) = &data_page.pagination {
                    debug!(
                        page,
                        total = ?pagination.total,
                        last_page = ?pagination.last_page,
                        "Pagination info"
                    );
                }

                if data_page.data.is_empty() {
                    debug!(page, "Empty page, no more data");
                    outcome.termination = FetchTermination::Exhausted;
                    break;
                }

                let received = data_page.data.len();
                let before = outcome.observations.len();
                outcome
                    .observations
                    .extend(data_page.data.iter().filter_map(Observation::from_raw));
                outcome.skipped_rows += received - (outcome.observations.len() - before);
                outcome.pages_fetched += 1;

                debug!(page, rows = received, "Page received");
                page += 1;
            }
            Ok(PageResponse::RateLimited) => {
                outcome.rate_limit_retries += 1;
                warn!(
                    "Rate limit exceeded. Retrying in {:?} (Page {})...",
                    policy.rate_limit_delay, page
                );
                tokio::time::sleep(policy.rate_limit_delay).await;
            }
            Ok(PageResponse::Failed { status, body }) => {
                error!(
                    status,
                    body = %body,
                    "Failed to fetch {} page {}. Status code: {}",
                    task.dataset, page, status
                );
                outcome.termination = FetchTermination::Aborted(format!("HTTP {} on page {}", status, page));
                break;
            }
            Err(e) => {
                error!(
                    error.summary = e.get_error_type_summary(),
                    error.details = %e,
                    "Failed to fetch {} page {}",
                    task.dataset, page
                );
                outcome.termination = FetchTermination::Aborted(format!("{} on page {}", e, page));
                break;
            }
        }
    }

    if outcome.skipped_rows > 0 {
        warn!(
            "{}: skipped {} rows without a valid startTime/value",
            task.dataset, outcome.skipped_rows
        );
    }

    info!(
        rows = outcome.observations.len(),
        pages = outcome.pages_fetched,
        retries = outcome.rate_limit_retries,
        "Finished fetching {}",
        task.dataset
    );

    outcome
}
