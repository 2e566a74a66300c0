use crate::gridcommon::{AppError, FetchTask, GridChartConfig, GridDataset, Result};
use crate::griddata::paginator::{PageResponse, PageSource};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Fingrid open data API客户端
#[derive(Clone)]
pub struct FingridApi {
    client: Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for FingridApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // API key 不输出到日志
        f.debug_struct("FingridApi")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl FingridApi {
    /// Create a client from the configuration.
    ///
    /// Fails with `ConfigError` when no API key is configured, before any
    /// connection is attempted.
    pub fn new(config: &GridChartConfig) -> Result<Self> {
        let api_key = config.api.require_api_key()?.to_string();

        // 创建带有超时设置的HTTP客户端
        let client_builder = Client::builder()
            .timeout(Duration::from_secs(config.http.timeout_secs))
            .connect_timeout(Duration::from_secs(config.http.connect_timeout_secs))
            .user_agent(config.http.user_agent.clone());

        // 添加代理设置
        let client = match &config.http.proxy_url {
            Some(proxy_url) => match reqwest::Proxy::all(proxy_url) {
                Ok(proxy) => {
                    info!("Using proxy: {}", proxy_url);
                    client_builder
                        .proxy(proxy)
                        .build()
                        .map_err(|e| AppError::ApiError(format!("Failed to create HTTP client with proxy: {}", e)))?
                }
                Err(e) => {
                    warn!("Invalid proxy {}, connecting directly: {}", proxy_url, e);
                    client_builder
                        .build()
                        .map_err(|e| AppError::ApiError(format!("Failed to create HTTP client: {}", e)))?
                }
            },
            // 未配置代理时不读取环境变量中的代理
            None => client_builder
                .no_proxy()
                .build()
                .map_err(|e| AppError::ApiError(format!("Failed to create HTTP client: {}", e)))?,
        };

        info!("Initialized Fingrid API client, endpoint: {}", config.api.base_url);

        Ok(Self {
            client,
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Data endpoint of one dataset
    pub fn dataset_url(&self, dataset: GridDataset) -> String {
        format!("{}/datasets/{}/data", self.base_url, dataset.id())
    }
}

#[async_trait]
impl PageSource for FingridApi {
    async fn fetch_page(&self, task: &FetchTask, page: u32) -> Result<PageResponse> {
        let url = self.dataset_url(task.dataset);
        let params = task.query_params(page);
        debug!("GET {} {:?}", url, params);

        let response = self
            .client
            .get(&url)
            .header("x-api-key", &self.api_key)
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        match status {
            StatusCode::OK => {
                let text = response.text().await?;
                let data_page = serde_json::from_str(&text).map_err(|e| {
                    debug!(
                        "Undecodable response from {}, first 500 chars: {}",
                        url,
                        text.chars().take(500).collect::<String>()
                    );
                    AppError::JsonError(e)
                })?;
                Ok(PageResponse::Data(data_page))
            }
            StatusCode::TOO_MANY_REQUESTS => Ok(PageResponse::RateLimited),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Ok(PageResponse::Failed {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}
