//! One-sided amplitude spectra and short-time power spectra.

use crate::error::{Error, Result};
use crate::preprocess::{hann, pad_or_truncate};
use crate::signal::{AmplitudeScale, Spectrum};
use realfft::RealFftPlanner;
use serde::{Deserialize, Serialize};

/// Compute the one-sided spectrum of `series` at `window_length` points.
///
/// The series is zero-padded or truncated to `window_length` first; only the first
/// `window_length / 2` bins are kept, so the Nyquist bin is dropped.
pub fn transform(
    series: &[f64],
    sample_rate_hz: f64,
    window_length: usize,
    scale: AmplitudeScale,
) -> Result<Spectrum> {
    check_sample_rate(sample_rate_hz)?;
    if window_length < 2 {
        return Err(Error::InvalidConfiguration(format!(
            "window length must be at least 2, got {window_length}"
        )));
    }
    if series.is_empty() {
        return Err(Error::InvalidInput("cannot transform an empty series".into()));
    }
    let mut frame = pad_or_truncate(series, window_length)?;

    let mut planner = RealFftPlanner::<f64>::new();
    let r2c = planner.plan_fft_forward(window_length);
    let mut bins = r2c.make_output_vec();
    r2c.process(&mut frame, &mut bins)
        .map_err(|e| Error::InvalidConfiguration(e.to_string()))?;

    let half = window_length / 2;
    let frequencies = (0..half)
        .map(|k| k as f64 * sample_rate_hz / window_length as f64)
        .collect();
    let amplitudes = bins[..half]
        .iter()
        .map(|c| scale.amplitude_of(c.norm()))
        .collect();
    log::debug!(
        "spectrum: {} samples -> {} bins at {:.4} Hz/bin ({:?})",
        series.len(),
        half,
        sample_rate_hz / window_length as f64,
        scale
    );
    Ok(Spectrum {
        frequencies,
        amplitudes,
        scale,
    })
}

/// Segmenting parameters for [`spectrogram`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrogramParams {
    /// Samples per segment.
    pub segment_length: usize,
    /// Samples shared by consecutive segments.
    pub overlap: usize,
}

impl Default for SpectrogramParams {
    fn default() -> Self {
        Self {
            segment_length: 256,
            overlap: 128,
        }
    }
}

/// Short-time power spectral density.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spectrogram {
    /// Segment centre times (seconds).
    pub times: Vec<f64>,
    pub frequencies: Vec<f64>,
    /// `power[frame][bin]`, one-sided density.
    pub power: Vec<Vec<f64>>,
}

pub fn spectrogram(
    series: &[f64],
    sample_rate_hz: f64,
    params: &SpectrogramParams,
) -> Result<Spectrogram> {
    check_sample_rate(sample_rate_hz)?;
    let window = params.segment_length;
    if window < 2 || params.overlap >= window {
        return Err(Error::InvalidConfiguration(format!(
            "segment length {} with overlap {} gives no forward step",
            window, params.overlap
        )));
    }
    if series.len() < window {
        return Err(Error::InvalidInput(format!(
            "series of {} samples is shorter than one {}-sample segment",
            series.len(),
            window
        )));
    }
    let step = window - params.overlap;
    let window_func = hann(window);
    let scale = 1.0 / (sample_rate_hz * window_func.iter().map(|w| w * w).sum::<f64>());

    let mut planner = RealFftPlanner::<f64>::new();
    let r2c = planner.plan_fft_forward(window);
    let mut spectrum = r2c.make_output_vec();
    let frequencies: Vec<f64> = (0..spectrum.len())
        .map(|k| k as f64 * sample_rate_hz / window as f64)
        .collect();

    let mut times = Vec::new();
    let mut power = Vec::new();
    let mut pos = 0;
    while pos + window <= series.len() {
        let slice = &series[pos..pos + window];
        let mean = slice.iter().sum::<f64>() / window as f64;
        let mut frame: Vec<f64> = slice
            .iter()
            .zip(window_func.iter())
            .map(|(x, w)| (x - mean) * w)
            .collect();
        r2c.process(&mut frame, &mut spectrum)
            .map_err(|e| Error::InvalidConfiguration(e.to_string()))?;
        let row = spectrum
            .iter()
            .enumerate()
            .map(|(k, val)| {
                if k == 0 || (window % 2 == 0 && k == window / 2) {
                    val.norm_sqr() * scale
                } else {
                    2.0 * val.norm_sqr() * scale
                }
            })
            .collect();
        power.push(row);
        times.push((pos as f64 + window as f64 / 2.0) / sample_rate_hz);
        pos += step;
    }
    Ok(Spectrogram {
        times,
        frequencies,
        power,
    })
}

fn check_sample_rate(sample_rate_hz: f64) -> Result<()> {
    if !(sample_rate_hz.is_finite() && sample_rate_hz > 0.0) {
        return Err(Error::InvalidConfiguration(format!(
            "sample rate must be positive, got {sample_rate_hz}"
        )));
    }
    Ok(())
}
