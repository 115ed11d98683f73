//! Pipeline configuration, loadable from TOML.
//!
//! ```toml
//! detector = "heuristic"
//! amplitude_scale = "natural-log"
//! window_length = 4096
//!
//! [band]
//! low_hz = 4.0
//! high_hz = 30.0
//!
//! [heuristic]
//! margin = 10.0
//! ```

use crate::detectors::{DetectorKind, HeuristicParams, ThresholdParams};
use crate::error::{Error, Result};
use crate::io::events::BinningConfig;
use crate::preprocess::DEFAULT_WINDOW_LENGTH;
use crate::signal::{AmplitudeScale, FrequencyBand, DEFAULT_SAMPLE_RATE_HZ};
use crate::spectrum::SpectrogramParams;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Sampling rate assumed for plain sample input (Hz).
    pub sample_rate_hz: f64,
    /// FFT length every series is padded or truncated to.
    pub window_length: usize,
    /// Band in which a peak may become the wingbeat frequency.
    pub band: FrequencyBand,
    /// Amplitude convention handed to the detectors.
    pub amplitude_scale: AmplitudeScale,
    pub detector: DetectorKind,
    pub threshold: ThresholdParams,
    pub heuristic: HeuristicParams,
    pub binning: BinningConfig,
    pub spectrogram: SpectrogramParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            window_length: DEFAULT_WINDOW_LENGTH,
            band: FrequencyBand::default(),
            amplitude_scale: AmplitudeScale::NaturalLog,
            detector: DetectorKind::Threshold,
            threshold: ThresholdParams::default(),
            heuristic: HeuristicParams::default(),
            binning: BinningConfig::default(),
            spectrogram: SpectrogramParams::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        let cfg: PipelineConfig = toml::from_str(text).context("parsing pipeline config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in config {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.sample_rate_hz.is_finite() && self.sample_rate_hz > 0.0) {
            return Err(Error::InvalidConfiguration(format!(
                "sample_rate_hz must be positive, got {}",
                self.sample_rate_hz
            )));
        }
        if self.window_length < 2 {
            return Err(Error::InvalidConfiguration(format!(
                "window_length must be at least 2, got {}",
                self.window_length
            )));
        }
        self.band.validate()?;
        let rel = self.threshold.relative_height;
        if !(rel > 0.0 && rel <= 1.0) {
            return Err(Error::InvalidConfiguration(format!(
                "threshold.relative_height must be in (0, 1], got {rel}"
            )));
        }
        if self.threshold.max_peaks == 0 {
            return Err(Error::InvalidConfiguration(
                "threshold.max_peaks must be at least 1".into(),
            ));
        }
        if !self.heuristic.margin.is_finite() {
            return Err(Error::InvalidConfiguration(
                "heuristic.margin must be finite".into(),
            ));
        }
        self.binning.validate()?;
        if self.spectrogram.overlap >= self.spectrogram.segment_length {
            return Err(Error::InvalidConfiguration(format!(
                "spectrogram overlap {} must be below segment_length {}",
                self.spectrogram.overlap, self.spectrogram.segment_length
            )));
        }
        Ok(())
    }
}
