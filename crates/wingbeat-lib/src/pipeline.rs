use crate::{
    config::PipelineConfig,
    detectors::{detect_heuristic_peaks_with_params, detect_threshold_peaks_with_params, DetectorKind},
    error::{Error, Result},
    harmonics::{resolve_harmonics, HarmonicResolution},
    preprocess::{pad_or_truncate, preprocess},
    signal::{PeakInfo, PeakSet, Spectrum, TimeSeries, WingbeatEstimate},
    spectrum::{spectrogram, transform, Spectrogram},
};
use serde::{Deserialize, Serialize};

/// Summary of one series' trip through the estimator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WingbeatReport {
    pub fs: f64,
    pub sample_count: usize,
    pub window_length: usize,
    pub detector: DetectorKind,
    pub peaks: Vec<PeakInfo>,
    pub dominant: Option<PeakInfo>,
    pub resolution: Option<HarmonicResolution>,
    pub estimate: WingbeatEstimate,
}

/// Report plus the spectrum it was computed from, for plotting.
#[derive(Debug, Clone)]
pub struct WingbeatAnalysis {
    pub spectrum: Spectrum,
    pub peak_set: PeakSet,
    pub report: WingbeatReport,
}

/// Preprocess, pad, and transform a series into the spectrum the detectors consume.
pub fn analysis_spectrum(ts: &TimeSeries, cfg: &PipelineConfig) -> Result<Spectrum> {
    if ts.is_empty() {
        return Err(Error::InvalidInput("time series is empty".into()));
    }
    let windowed = preprocess(&ts.data)?;
    let padded = pad_or_truncate(&windowed, cfg.window_length)?;
    transform(&padded, ts.fs, cfg.window_length, cfg.amplitude_scale)
}

/// Short-time spectrum of the preprocessed series, framed per `cfg.spectrogram`.
pub fn analysis_spectrogram(ts: &TimeSeries, cfg: &PipelineConfig) -> Result<Spectrogram> {
    if ts.is_empty() {
        return Err(Error::InvalidInput("time series is empty".into()));
    }
    let windowed = preprocess(&ts.data)?;
    spectrogram(&windowed, ts.fs, &cfg.spectrogram)
}

/// Run the configured detector over a spectrum.
pub fn detect_peaks(spectrum: &Spectrum, cfg: &PipelineConfig) -> PeakSet {
    match cfg.detector {
        DetectorKind::Threshold => {
            detect_threshold_peaks_with_params(spectrum, &cfg.band, &cfg.threshold)
        }
        DetectorKind::Heuristic => {
            detect_heuristic_peaks_with_params(spectrum, &cfg.band, &cfg.heuristic)
        }
    }
}

/// Estimate the wingbeat frequency of one event-count series.
///
/// An absent estimate (no peak) is a normal outcome; errors are reserved for empty input
/// and invalid configuration.
pub fn estimate_wingbeat(ts: &TimeSeries, cfg: &PipelineConfig) -> Result<WingbeatAnalysis> {
    cfg.validate()?;
    let spectrum = analysis_spectrum(ts, cfg)?;
    let peak_set = detect_peaks(&spectrum, cfg);

    let resolution = peak_set.dominant_frequency(&spectrum).map(|dominant_hz| {
        resolve_harmonics(&peak_set.frequencies(&spectrum), dominant_hz)
    });
    let estimate = match &resolution {
        Some(res) => WingbeatEstimate::found(res.fundamental_hz),
        None => WingbeatEstimate::none(),
    };
    log::debug!(
        "{:?} detector: {} peaks, estimate {:?}",
        cfg.detector,
        peak_set.len(),
        estimate.frequency_hz
    );

    let report = WingbeatReport {
        fs: ts.fs,
        sample_count: ts.len(),
        window_length: cfg.window_length,
        detector: cfg.detector,
        peaks: peak_set.peak_info(&spectrum),
        dominant: peak_set.dominant.map(|i| PeakInfo::at(&spectrum, i)),
        resolution,
        estimate,
    };
    Ok(WingbeatAnalysis {
        spectrum,
        peak_set,
        report,
    })
}
