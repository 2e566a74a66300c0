use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use std::fmt;

/// Wire format for `startTime`/`endTime` query parameters
pub const API_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Which y axis a dataset is drawn against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesAxis {
    /// Generation in MW (left axis)
    Primary,
    /// Emissions, rescaled onto the primary range (right axis)
    Secondary,
}

/// 电网数据集
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GridDataset {
    Wind,
    Hydro,
    Nuclear,
    Co2,
}

impl GridDataset {
    /// Fetch order, also the column order of the aligned table
    pub const ALL: [GridDataset; 4] = [
        GridDataset::Wind,
        GridDataset::Hydro,
        GridDataset::Nuclear,
        GridDataset::Co2,
    ];

    /// Numeric dataset id on the API side
    pub fn id(&self) -> u32 {
        match self {
            GridDataset::Wind => 181,
            GridDataset::Hydro => 191,
            GridDataset::Nuclear => 188,
            GridDataset::Co2 => 266,
        }
    }

    /// Human readable series name
    pub fn label(&self) -> &'static str {
        match self {
            GridDataset::Wind => "Wind Power",
            GridDataset::Hydro => "Hydro Power",
            GridDataset::Nuclear => "Nuclear Power",
            GridDataset::Co2 => "CO2 Emissions",
        }
    }

    /// Column name used in the CSV export
    pub fn column(&self) -> &'static str {
        match self {
            GridDataset::Wind => "wind_mw",
            GridDataset::Hydro => "hydro_mw",
            GridDataset::Nuclear => "nuclear_mw",
            GridDataset::Co2 => "co2",
        }
    }

    pub fn axis(&self) -> SeriesAxis {
        match self {
            GridDataset::Co2 => SeriesAxis::Secondary,
            _ => SeriesAxis::Primary,
        }
    }

    /// Position in [`GridDataset::ALL`]
    pub fn index(&self) -> usize {
        match self {
            GridDataset::Wind => 0,
            GridDataset::Hydro => 1,
            GridDataset::Nuclear => 2,
            GridDataset::Co2 => 3,
        }
    }
}

impl fmt::Display for GridDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.id())
    }
}

/// 单条原始观测数据，字段都可能缺失
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawObservation {
    #[serde(default)]
    pub dataset_id: Option<u32>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
}

/// A validated `{timestamp, value}` row
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub value: f64,
}

impl Observation {
    /// Convert a raw API row, returning `None` when the row has no usable
    /// `startTime` or `value`.
    pub fn from_raw(raw: &RawObservation) -> Option<Self> {
        let start_time = parse_api_timestamp(raw.start_time.as_deref()?).ok()?;
        let end_time = raw
            .end_time
            .as_deref()
            .and_then(|s| parse_api_timestamp(s).ok());

        Some(Self {
            start_time,
            end_time,
            value: raw.value?,
        })
    }
}

/// Pagination block returned next to `data`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub current_page: Option<u32>,
    #[serde(default)]
    pub last_page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

/// 一页API响应
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataPage {
    /// `null` or a missing field reads as an empty page
    #[serde(default, deserialize_with = "lenient_rows")]
    pub data: Vec<RawObservation>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Decode each row on its own. A row that does not match
/// [`RawObservation`] (wrong field types, not an object) becomes an empty
/// row, which [`Observation::from_raw`] rejects, so one bad row cannot
/// fail the whole page.
fn lenient_rows<'de, D>(deserializer: D) -> std::result::Result<Vec<RawObservation>, D::Error>
where
    D: Deserializer<'de>,
{
    let rows: Option<Vec<serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(rows
        .unwrap_or_default()
        .into_iter()
        .map(|row| serde_json::from_value(row).unwrap_or_default())
        .collect())
}

/// Closed time range a fetch is limited to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Window ending at `now` and reaching `hours` back
    pub fn last_hours(now: DateTime<Utc>, hours: i64) -> Self {
        Self {
            start: now - Duration::hours(hours),
            end: now,
        }
    }

    pub fn start_param(&self) -> String {
        self.start.format(API_TIME_FORMAT).to_string()
    }

    pub fn end_param(&self) -> String {
        self.end.format(API_TIME_FORMAT).to_string()
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.start_param(), self.end_param())
    }
}

/// 下载任务：一个数据集的分页抓取参数
#[derive(Debug, Clone)]
pub struct FetchTask {
    pub dataset: GridDataset,
    pub page_size: u32,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl FetchTask {
    pub fn new(dataset: GridDataset, page_size: u32, window: Option<&TimeWindow>) -> Self {
        Self {
            dataset,
            page_size,
            start_time: window.map(|w| w.start),
            end_time: window.map(|w| w.end),
        }
    }

    /// Query parameters for one page, in the order they are sent
    pub fn query_params(&self, page: u32) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("pageSize", self.page_size.to_string()),
            ("page", page.to_string()),
        ];

        // 添加可选的起始时间
        if let Some(start_time) = self.start_time {
            params.push(("startTime", start_time.format(API_TIME_FORMAT).to_string()));
        }

        // 添加可选的结束时间
        if let Some(end_time) = self.end_time {
            params.push(("endTime", end_time.format(API_TIME_FORMAT).to_string()));
        }

        params
    }
}

/// Parse a timestamp as sent by the API.
///
/// RFC 3339 is tried first (`2024-05-01T00:03:00.000Z`); a bare
/// `YYYY-MM-DDTHH:MM:SS[.fff]` is read as UTC.
pub fn parse_api_timestamp(s: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    match DateTime::parse_from_rfc3339(s) {
        Ok(dt) => Ok(dt.with_timezone(&Utc)),
        Err(_) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").map(|naive| naive.and_utc()),
    }
}
