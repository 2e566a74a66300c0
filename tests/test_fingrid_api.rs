//! Fingrid API 客户端测试
//!
//! 在本地启动一个模拟的 datasets 接口，验证分页、限流重试和失败处理。

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{TimeZone, Utc};
use serde_json::json;

use grid_chart::gridcommon::{AppError, GridChartConfig, GridDataset, Result, TimeWindow};
use grid_chart::griddata::{Downloader, FetchTermination};

const API_KEY: &str = "test-key";

/// 模拟服务器收到的一次请求
#[derive(Debug, Clone)]
struct RecordedRequest {
    dataset: u32,
    api_key: Option<String>,
    params: HashMap<String, String>,
}

impl RecordedRequest {
    fn page(&self) -> u32 {
        self.params
            .get("page")
            .and_then(|p| p.parse().ok())
            .unwrap_or(0)
    }
}

#[derive(Default)]
struct MockState {
    requests: Vec<RecordedRequest>,
    rate_limited: HashSet<(u32, u32)>,
}

type Shared = Arc<Mutex<MockState>>;

fn row(dataset: u32, minute: u32, value: Option<f64>) -> serde_json::Value {
    json!({
        "datasetId": dataset,
        "startTime": format!("2024-05-01T10:{:02}:00.000Z", minute),
        "endTime": format!("2024-05-01T10:{:02}:00.000Z", minute + 3),
        "value": value,
    })
}

fn page(rows: Vec<serde_json::Value>, current: u32) -> Response {
    Json(json!({
        "data": rows,
        "pagination": { "currentPage": current, "perPage": 2 }
    }))
    .into_response()
}

/// Wind: 两页数据后 `"data": null`
/// Hydro: 第一页先返回一次 429
/// Nuclear: 第二页返回 500
/// CO2: 第一页含缺少 value 和 value 非数字的记录，第二页正常
async fn dataset_data(
    Path(dataset): Path<u32>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    State(state): State<Shared>,
) -> Response {
    let request = RecordedRequest {
        dataset,
        api_key: headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        params,
    };
    let page_no = request.page();

    let mut state = state.lock().unwrap();
    state.requests.push(request);

    match (dataset, page_no) {
        (181, 1) => page(vec![row(181, 0, Some(1400.0)), row(181, 3, Some(1450.5))], 1),
        (181, 2) => page(vec![row(181, 6, Some(1500.0))], 2),
        (181, 3) => Json(json!({ "data": null })).into_response(),

        (191, 1) if state.rate_limited.insert((191, 1)) => {
            (StatusCode::TOO_MANY_REQUESTS, "rate limit exceeded").into_response()
        }
        (191, 1) => page(vec![row(191, 0, Some(2100.0))], 1),

        (188, 1) => page(vec![row(188, 0, Some(4000.0))], 1),
        (188, 2) => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),

        (266, 1) => {
            let mut not_numeric = row(266, 6, None);
            not_numeric["value"] = json!("n/a");
            page(vec![row(266, 0, Some(42.5)), row(266, 3, None), not_numeric], 1)
        }
        (266, 2) => page(vec![row(266, 9, Some(41.0))], 2),

        (_, current) => page(Vec::new(), current),
    }
}

async fn start_mock_server() -> (String, Shared) {
    let state: Shared = Arc::new(Mutex::new(MockState::default()));
    let app = Router::new()
        .route("/api/datasets/:dataset/data", get(dataset_data))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/api", addr), state)
}

fn test_config(base_url: &str, api_key: Option<&str>) -> GridChartConfig {
    let mut config = GridChartConfig::default();
    config.api.base_url = base_url.to_string();
    config.api.api_key = api_key.map(str::to_string);
    config.fetch.page_size = 2;
    config.fetch.rate_limit_delay_ms = 10;
    config.http.timeout_secs = 5;
    config
}

fn test_window() -> TimeWindow {
    TimeWindow::last_hours(Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap(), 24)
}

#[tokio::test]
async fn test_fetch_all_datasets_from_mock_api() -> Result<()> {
    let (base_url, state) = start_mock_server().await;
    let downloader = Downloader::from_config(&test_config(&base_url, Some(API_KEY)))?;

    let snapshot = downloader.run(test_window()).await;
    assert_eq!(snapshot.series.len(), 4, "应返回四个数据集");

    // `"data": null` 与空页一样结束分页
    let wind = snapshot.get(GridDataset::Wind).unwrap();
    assert_eq!(wind.observations.len(), 3);
    assert_eq!(wind.pages_fetched, 2);
    assert_eq!(wind.termination, FetchTermination::Exhausted);
    assert_eq!(wind.observations[1].value, 1450.5);

    // 429 后重试同一页，数据不重复
    let hydro = snapshot.get(GridDataset::Hydro).unwrap();
    assert_eq!(hydro.observations.len(), 1);
    assert_eq!(hydro.rate_limit_retries, 1);
    assert!(!hydro.is_aborted());

    // 500 终止该数据集，已获取的数据保留
    let nuclear = snapshot.get(GridDataset::Nuclear).unwrap();
    assert_eq!(nuclear.observations.len(), 1);
    assert_eq!(
        nuclear.termination,
        FetchTermination::Aborted("HTTP 500 on page 2".to_string())
    );

    // 缺少 value 或 value 非数字的记录被跳过，同页和后续页的数据照常保留
    let co2 = snapshot.get(GridDataset::Co2).unwrap();
    let values: Vec<f64> = co2.observations.iter().map(|o| o.value).collect();
    assert_eq!(values, vec![42.5, 41.0]);
    assert_eq!(co2.skipped_rows, 2);
    assert_eq!(co2.pages_fetched, 2);
    assert_eq!(co2.termination, FetchTermination::Exhausted);

    let requests = state.lock().unwrap().requests.clone();
    let order: Vec<(u32, u32)> = requests.iter().map(|r| (r.dataset, r.page())).collect();
    assert_eq!(
        order,
        vec![
            (181, 1),
            (181, 2),
            (181, 3),
            (191, 1),
            (191, 1),
            (191, 2),
            (188, 1),
            (188, 2),
            (266, 1),
            (266, 2),
            (266, 3),
        ],
        "数据集按顺序依次抓取"
    );

    Ok(())
}

#[tokio::test]
async fn test_request_carries_key_and_window() -> Result<()> {
    let (base_url, state) = start_mock_server().await;
    let downloader = Downloader::from_config(&test_config(&base_url, Some(API_KEY)))?;
    downloader.run(test_window()).await;

    let requests = state.lock().unwrap().requests.clone();
    assert!(!requests.is_empty());

    for request in &requests {
        assert_eq!(request.api_key.as_deref(), Some(API_KEY), "每个请求都应携带 x-api-key");
        assert_eq!(request.params.get("pageSize").map(String::as_str), Some("2"));
        assert_eq!(
            request.params.get("startTime").map(String::as_str),
            Some("2024-05-01T00:00:00Z")
        );
        assert_eq!(
            request.params.get("endTime").map(String::as_str),
            Some("2024-05-02T00:00:00Z")
        );
    }

    Ok(())
}

#[tokio::test]
async fn test_missing_api_key_makes_no_request() {
    let (base_url, state) = start_mock_server().await;

    let result = Downloader::from_config(&test_config(&base_url, None));
    assert!(matches!(result, Err(AppError::ConfigError(_))), "缺少 API key 应返回配置错误");

    let blank = Downloader::from_config(&test_config(&base_url, Some("   ")));
    assert!(blank.is_err());

    assert!(state.lock().unwrap().requests.is_empty(), "不应发出任何请求");
}

#[tokio::test]
async fn test_unreachable_server_aborts_each_dataset() -> Result<()> {
    // 绑定后立即释放端口，连接会被拒绝
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);

    let downloader =
        Downloader::from_config(&test_config(&format!("http://{}/api", addr), Some(API_KEY)))?;
    let snapshot = downloader.run(test_window()).await;

    assert_eq!(snapshot.series.len(), 4);
    for outcome in &snapshot.series {
        assert!(outcome.is_aborted(), "{} 应被终止", outcome.dataset);
        assert!(outcome.is_empty());
    }
    assert_eq!(snapshot.total_observations(), 0);

    Ok(())
}
