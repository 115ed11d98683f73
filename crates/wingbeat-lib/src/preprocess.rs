//! Detrending, windowing and length normalisation ahead of the FFT.

use crate::error::{Error, Result};
use std::f64::consts::PI;

/// Analysis length every series is padded or truncated to.
pub const DEFAULT_WINDOW_LENGTH: usize = 4096;

/// Remove the mean and apply a symmetric Hann window of matching length.
pub fn preprocess(series: &[f64]) -> Result<Vec<f64>> {
    if series.is_empty() {
        return Err(Error::InvalidInput("cannot preprocess an empty series".into()));
    }
    let mean = series.iter().sum::<f64>() / series.len() as f64;
    let window = hann(series.len());
    Ok(series
        .iter()
        .zip(window.iter())
        .map(|(x, w)| (x - mean) * w)
        .collect())
}

/// Right-pad with zeros, or keep the first `target_length` samples.
pub fn pad_or_truncate(series: &[f64], target_length: usize) -> Result<Vec<f64>> {
    if series.is_empty() {
        return Err(Error::InvalidInput("cannot pad an empty series".into()));
    }
    if target_length == 0 {
        return Err(Error::InvalidConfiguration(
            "target length must be positive".into(),
        ));
    }
    let mut out = Vec::with_capacity(target_length);
    out.extend_from_slice(&series[..series.len().min(target_length)]);
    out.resize(target_length, 0.0);
    Ok(out)
}

/// Symmetric Hann window, `w[0] == w[size - 1] == 0`.
pub fn hann(size: usize) -> Vec<f64> {
    if size == 1 {
        return vec![1.0];
    }
    let denom = (size - 1) as f64;
    (0..size)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / denom).cos())
        .collect()
}
