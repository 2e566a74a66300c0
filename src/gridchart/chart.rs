//! Dual-axis chart model.
//!
//! Generation series share the left axis. CO2 has its own range on the right
//! and is drawn rescaled onto the left range so all series fit one canvas.

use crate::gridcommon::{GridDataset, SeriesAxis};
use crate::griddata::GridSnapshot;
use chrono::{DateTime, Utc};

/// Relative padding added on both ends of an axis range
const AXIS_PADDING: f64 = 0.05;

/// Plot points of one dataset, `(unix_seconds, value)`
#[derive(Debug, Clone)]
pub struct ChartSeries {
    pub dataset: GridDataset,
    pub points: Vec<(f64, f64)>,
}

impl ChartSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Axis bounds computed for the currently visible series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartBounds {
    pub x: [f64; 2],
    pub primary: [f64; 2],
    pub secondary: [f64; 2],
}

#[derive(Debug, Clone)]
pub struct ChartModel {
    series: Vec<ChartSeries>,
}

impl ChartModel {
    pub fn from_snapshot(snapshot: &GridSnapshot) -> Self {
        let series = GridDataset::ALL
            .iter()
            .map(|dataset| {
                let mut points: Vec<(f64, f64)> = snapshot
                    .get(*dataset)
                    .map(|outcome| {
                        outcome
                            .observations
                            .iter()
                            .map(|obs| (to_x(obs.start_time), obs.value))
                            .collect()
                    })
                    .unwrap_or_default();
                points.sort_by(|a, b| a.0.total_cmp(&b.0));
                ChartSeries { dataset: *dataset, points }
            })
            .collect();

        Self { series }
    }

    /// Series in [`GridDataset::ALL`] order
    pub fn series(&self) -> &[ChartSeries] {
        &self.series
    }

    pub fn get(&self, dataset: GridDataset) -> &ChartSeries {
        &self.series[dataset.index()]
    }

    pub fn has_data(&self) -> bool {
        self.series.iter().any(|s| !s.is_empty())
    }

    /// Bounds over the series whose `visible` flag is set
    pub fn bounds(&self, visible: &[bool; 4]) -> ChartBounds {
        let shown = || {
            self.series
                .iter()
                .filter(move |s| visible[s.dataset.index()] && !s.is_empty())
        };

        let axis_values = |axis: SeriesAxis| {
            shown()
                .filter(move |s| s.dataset.axis() == axis)
                .flat_map(|s| s.points.iter().map(|p| p.1))
        };

        let x = padded_range(shown().flat_map(|s| s.points.iter().map(|p| p.0)), 0.0);
        let secondary = padded_range(axis_values(SeriesAxis::Secondary), AXIS_PADDING);
        // 没有发电曲线时左轴沿用 CO2 的范围
        let primary = if axis_values(SeriesAxis::Primary).next().is_some() {
            padded_range(axis_values(SeriesAxis::Primary), AXIS_PADDING)
        } else {
            secondary
        };

        ChartBounds { x, primary, secondary }
    }
}

/// Chart x coordinate of a timestamp
pub fn to_x(ts: DateTime<Utc>) -> f64 {
    ts.timestamp() as f64
}

/// `[min, max]` of the values with relative padding.
///
/// An empty input yields `[0, 1]`; a single distinct value is widened by 1
/// on each side.
pub fn padded_range<I: IntoIterator<Item = f64>>(values: I, padding: f64) -> [f64; 2] {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in values.into_iter().filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }

    if lo > hi {
        return [0.0, 1.0];
    }
    if lo == hi {
        return [lo - 1.0, hi + 1.0];
    }

    let pad = (hi - lo) * padding;
    [lo - pad, hi + pad]
}

/// Map `value` from the `from` range onto the `to` range
pub fn rescale(value: f64, from: [f64; 2], to: [f64; 2]) -> f64 {
    let span = from[1] - from[0];
    if span == 0.0 {
        return to[0];
    }
    to[0] + (value - from[0]) / span * (to[1] - to[0])
}

/// Secondary series points placed on the primary axis
pub fn rescale_points(points: &[(f64, f64)], bounds: &ChartBounds) -> Vec<(f64, f64)> {
    points
        .iter()
        .map(|(x, y)| (*x, rescale(*y, bounds.secondary, bounds.primary)))
        .collect()
}

/// `count` evenly spaced values from `range[0]` to `range[1]`
pub fn ticks(range: [f64; 2], count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![range[0]],
        _ => {
            let step = (range[1] - range[0]) / (count - 1) as f64;
            (0..count).map(|i| range[0] + step * i as f64).collect()
        }
    }
}

/// Time labels (`HH:MM`, UTC) for the x axis
pub fn time_labels(range: [f64; 2], count: usize) -> Vec<String> {
    ticks(range, count)
        .into_iter()
        .map(|x| match DateTime::<Utc>::from_timestamp(x.round() as i64, 0) {
            Some(ts) => ts.format("%H:%M").to_string(),
            None => String::new(),
        })
        .collect()
}

/// Value labels with a fixed number of decimals
pub fn value_labels(range: [f64; 2], count: usize, decimals: usize) -> Vec<String> {
    ticks(range, count)
        .into_iter()
        .map(|v| format!("{:.*}", decimals, v))
        .collect()
}
