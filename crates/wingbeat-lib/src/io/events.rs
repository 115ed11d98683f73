//! Event-camera CSV ingestion and per-bin event counting.

use crate::error::{Error, Result};
use crate::signal::TimeSeries;
use anyhow::Context;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Longest event-count series a single recording may bin into.
pub const MAX_EVENT_BINS: usize = 1 << 24;

/// How raw event timestamps become an event-count series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinningConfig {
    /// Histogram bin width in milliseconds.
    pub bin_ms: f64,
    /// Header of the timestamp column (microseconds).
    pub time_column: String,
}

impl Default for BinningConfig {
    fn default() -> Self {
        Self {
            bin_ms: 1.0,
            time_column: "t".into(),
        }
    }
}

impl BinningConfig {
    pub fn sample_rate_hz(&self) -> f64 {
        1000.0 / self.bin_ms
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.bin_ms.is_finite() && self.bin_ms > 0.0) {
            return Err(Error::InvalidConfiguration(format!(
                "binning.bin_ms must be positive, got {}",
                self.bin_ms
            )));
        }
        Ok(())
    }
}

/// Read the timestamp column (microseconds) of an event CSV with a header row.
pub fn read_event_times(path: &Path, time_column: &str) -> anyhow::Result<Vec<f64>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);
    let headers = reader.headers().context("reading header")?.clone();
    let col = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(time_column))
        .ok_or_else(|| {
            anyhow::anyhow!(
                "column '{}' not found in {} (have: {})",
                time_column,
                path.display(),
                headers.iter().collect::<Vec<_>>().join(", ")
            )
        })?;

    let mut times = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("reading record {}", row + 1))?;
        let raw = record
            .get(col)
            .ok_or_else(|| anyhow::anyhow!("record {} has no '{}' field", row + 1, time_column))?;
        let t: f64 = raw
            .parse()
            .with_context(|| format!("record {}: '{}' is not a timestamp", row + 1, raw))?;
        if !t.is_finite() {
            anyhow::bail!("record {}: timestamp '{}' is not finite", row + 1, raw);
        }
        times.push(t);
    }
    Ok(times)
}

/// Count events per `bin_ms` bin, starting at the earliest event.
///
/// Bin edges run `min, min + bin, ...` while below `max + bin`; the last bin includes its
/// right edge. Fewer than two edges (all events at one instant, or no events) produce an
/// empty series. Non-finite timestamps and spans above [`MAX_EVENT_BINS`] bins are
/// `InvalidInput`.
pub fn bin_event_counts(times_us: &[f64], bin_ms: f64) -> Result<TimeSeries> {
    let fs = 1000.0 / bin_ms;
    if times_us.is_empty() {
        return Ok(TimeSeries::new(fs, Vec::new()));
    }
    if let Some(pos) = times_us.iter().position(|t| !t.is_finite()) {
        return Err(Error::InvalidInput(format!(
            "event {} has non-finite timestamp {}",
            pos, times_us[pos]
        )));
    }
    let times_ms: Vec<f64> = times_us.iter().map(|t| t / 1000.0).collect();
    let min = times_ms.iter().copied().fold(f64::INFINITY, f64::min);
    let max = times_ms.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let edges = ((max + bin_ms - min) / bin_ms).ceil();
    if edges > MAX_EVENT_BINS as f64 + 1.0 {
        return Err(Error::InvalidInput(format!(
            "events span {:.1} ms, more than {} bins of {} ms",
            max - min,
            MAX_EVENT_BINS,
            bin_ms
        )));
    }
    let bins = (edges as usize).saturating_sub(1);
    let mut counts = vec![0.0; bins];
    if bins > 0 {
        for t in &times_ms {
            let idx = (((t - min) / bin_ms).floor() as usize).min(bins - 1);
            counts[idx] += 1.0;
        }
    }
    log::debug!(
        "binned {} events over {:.1} ms into {} bins of {} ms",
        times_us.len(),
        max - min,
        bins,
        bin_ms
    );
    Ok(TimeSeries::new(fs, counts))
}

/// Read an event CSV and bin it into an event-count series.
pub fn load_event_series(path: &Path, cfg: &BinningConfig) -> anyhow::Result<TimeSeries> {
    cfg.validate()?;
    let times = read_event_times(path, &cfg.time_column)?;
    Ok(bin_event_counts(&times, cfg.bin_ms)?)
}
