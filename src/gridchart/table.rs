//! Timestamp-aligned table of all series.

use crate::gridcommon::{GridDataset, Result};
use crate::griddata::GridSnapshot;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;
use std::io::Write;

/// One row of the aligned table; `values` is indexed by [`GridDataset::index`]
#[derive(Debug, Clone, PartialEq)]
pub struct GridRow {
    pub start_time: DateTime<Utc>,
    pub values: [Option<f64>; 4],
}

impl GridRow {
    pub fn value(&self, dataset: GridDataset) -> Option<f64> {
        self.values[dataset.index()]
    }
}

/// Outer join of the four series on `startTime`
#[derive(Debug, Clone, Default)]
pub struct GridTable {
    rows: BTreeMap<DateTime<Utc>, [Option<f64>; 4]>,
}

impl GridTable {
    pub fn from_snapshot(snapshot: &GridSnapshot) -> Self {
        let mut rows: BTreeMap<DateTime<Utc>, [Option<f64>; 4]> = BTreeMap::new();

        for outcome in &snapshot.series {
            let column = outcome.dataset.index();
            for obs in &outcome.observations {
                // 同一时间戳重复出现时以后到的为准
                rows.entry(obs.start_time).or_insert([None; 4])[column] = Some(obs.value);
            }
        }

        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in ascending timestamp order
    pub fn rows(&self) -> impl Iterator<Item = GridRow> + '_ {
        self.rows.iter().map(|(start_time, values)| GridRow {
            start_time: *start_time,
            values: *values,
        })
    }

    /// Write the table as CSV; missing values are left empty.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);

        let mut header = vec!["startTime"];
        header.extend(GridDataset::ALL.iter().map(|d| d.column()));
        wtr.write_record(&header)?;

        for row in self.rows() {
            let mut record = Vec::with_capacity(5);
            record.push(row.start_time.to_rfc3339_opts(SecondsFormat::Secs, true));
            for value in row.values {
                record.push(value.map(|v| v.to_string()).unwrap_or_default());
            }
            wtr.write_record(&record)?;
        }

        wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gridcommon::{Observation, TimeWindow};
    use crate::griddata::{FetchOutcome, FetchTermination};
    use chrono::TimeZone;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, minute, 0).unwrap()
    }

    fn outcome(dataset: GridDataset, points: &[(u32, f64)]) -> FetchOutcome {
        FetchOutcome {
            dataset,
            observations: points
                .iter()
                .map(|(m, v)| Observation { start_time: at(*m), end_time: None, value: *v })
                .collect(),
            pages_fetched: 1,
            rate_limit_retries: 0,
            skipped_rows: 0,
            termination: FetchTermination::Exhausted,
        }
    }

    fn snapshot() -> GridSnapshot {
        GridSnapshot {
            window: TimeWindow::last_hours(at(0), 24),
            series: vec![
                outcome(GridDataset::Wind, &[(3, 1500.0), (0, 1400.0)]),
                outcome(GridDataset::Hydro, &[(0, 2100.0)]),
                outcome(GridDataset::Nuclear, &[]),
                outcome(GridDataset::Co2, &[(6, 42.5), (6, 43.0)]),
            ],
        }
    }

    #[test]
    fn test_outer_join_sorted_by_time() {
        let table = GridTable::from_snapshot(&snapshot());
        let rows: Vec<GridRow> = table.rows().collect();

        assert_eq!(table.len(), 3);
        assert_eq!(rows[0].start_time, at(0));
        assert_eq!(rows[0].values, [Some(1400.0), Some(2100.0), None, None]);
        assert_eq!(rows[1].value(GridDataset::Wind), Some(1500.0));
        assert_eq!(rows[1].value(GridDataset::Hydro), None);
        // 重复时间戳取最后一条
        assert_eq!(rows[2].value(GridDataset::Co2), Some(43.0));
    }

    #[test]
    fn test_write_csv() {
        let table = GridTable::from_snapshot(&snapshot());
        let mut out = Vec::new();
        table.write_csv(&mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "startTime,wind_mw,hydro_mw,nuclear_mw,co2");
        assert_eq!(lines[1], "2024-05-01T00:00:00Z,1400,2100,,");
        assert_eq!(lines[3], "2024-05-01T00:06:00Z,,,,43");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_empty_snapshot() {
        let empty = GridSnapshot {
            window: TimeWindow::last_hours(at(0), 24),
            series: Vec::new(),
        };
        let table = GridTable::from_snapshot(&empty);
        assert!(table.is_empty());

        let mut out = Vec::new();
        table.write_csv(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "startTime,wind_mw,hydro_mw,nuclear_mw,co2\n");
    }
}
