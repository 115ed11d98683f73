//! Results table: one row per processed recording.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub group: String,
    pub file: String,
    /// Wingbeat frequency rounded to 0.1 Hz, `NaN` when no peak was found.
    pub frequency_hz: f64,
}

/// Per-group distribution of estimates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub group: String,
    pub files: usize,
    pub estimated: usize,
    pub mean_hz: Option<f64>,
    pub median_hz: Option<f64>,
    pub min_hz: Option<f64>,
    pub max_hz: Option<f64>,
}

pub fn write_results_csv(path: &Path, rows: &[ResultRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_results_csv(path: &Path) -> Result<Vec<ResultRow>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row.context("reading result row")?);
    }
    Ok(rows)
}

/// Summaries in group-name order; `NaN` rows count as files but not as estimates.
pub fn summarize_by_group(rows: &[ResultRow]) -> Vec<GroupSummary> {
    let mut groups: BTreeMap<&str, Vec<&ResultRow>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.group.as_str()).or_default().push(row);
    }
    groups
        .into_iter()
        .map(|(group, members)| {
            let mut freqs: Vec<f64> = members
                .iter()
                .map(|r| r.frequency_hz)
                .filter(|f| f.is_finite())
                .collect();
            freqs.sort_by(|a, b| a.total_cmp(b));
            let n = freqs.len();
            let mean_hz = (n > 0).then(|| freqs.iter().sum::<f64>() / n as f64);
            let median_hz = (n > 0).then(|| {
                if n % 2 == 1 {
                    freqs[n / 2]
                } else {
                    0.5 * (freqs[n / 2 - 1] + freqs[n / 2])
                }
            });
            GroupSummary {
                group: group.to_string(),
                files: members.len(),
                estimated: n,
                mean_hz,
                median_hz,
                min_hz: freqs.first().copied(),
                max_hz: freqs.last().copied(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(group: &str, file: &str, f: f64) -> ResultRow {
        ResultRow {
            group: group.into(),
            file: file.into(),
            frequency_hz: f,
        }
    }

    #[test]
    fn csv_keeps_missing_estimates_as_nan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("peak_freqs.csv");
        let rows = vec![row("bee", "a.csv", 12.0), row("bee", "b.csv", f64::NAN)];
        write_results_csv(&path, &rows).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("group,file,frequency_hz\n"));
        assert!(text.contains("bee,b.csv,NaN"));

        let back = read_results_csv(&path).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[0], rows[0]);
        assert!(back[1].frequency_hz.is_nan());
    }

    #[test]
    fn summary_per_group() {
        let rows = vec![
            row("moth", "1", 20.0),
            row("bee", "1", 12.0),
            row("bee", "2", f64::NAN),
            row("bee", "3", 10.0),
            row("bee", "4", 13.0),
        ];
        let summary = summarize_by_group(&rows);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].group, "bee");
        assert_eq!(summary[0].files, 4);
        assert_eq!(summary[0].estimated, 3);
        assert_eq!(summary[0].median_hz, Some(12.0));
        assert_eq!(summary[0].min_hz, Some(10.0));
        assert_eq!(summary[0].max_hz, Some(13.0));
        assert!((summary[0].mean_hz.unwrap() - 35.0 / 3.0).abs() < 1e-12);
        assert_eq!(summary[1].median_hz, Some(20.0));
    }
}
