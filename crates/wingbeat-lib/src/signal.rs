use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default sampling rate of the event-count series: one bin per millisecond.
pub const DEFAULT_SAMPLE_RATE_HZ: f64 = 1000.0;
/// Lower edge of the wingbeat analysis band (Hz).
pub const FILTER_LOW: f64 = 4.0;
/// Upper edge of the wingbeat analysis band (Hz).
pub const FILTER_HIGH: f64 = 30.0;

/// Basic typed time series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Uniform sampling frequency in Hz
    pub fs: f64,
    /// Samples (event counts per bin)
    pub data: Vec<f64>,
}

impl TimeSeries {
    pub fn new(fs: f64, data: Vec<f64>) -> Self {
        Self { fs, data }
    }
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    pub fn duration(&self) -> f64 {
        self.data.len() as f64 / self.fs
    }
}

/// How the amplitudes of a [`Spectrum`] are expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AmplitudeScale {
    /// Plain magnitude `|X(f)|`.
    Linear,
    /// `20 * ln(|X(f)|)`. Natural log, not base 10; exact zeros map to `-inf`.
    #[default]
    NaturalLog,
}

impl AmplitudeScale {
    pub fn amplitude_of(self, magnitude: f64) -> f64 {
        match self {
            AmplitudeScale::Linear => magnitude,
            AmplitudeScale::NaturalLog => 20.0 * magnitude.ln(),
        }
    }

    pub fn magnitude_of(self, amplitude: f64) -> f64 {
        match self {
            AmplitudeScale::Linear => amplitude,
            AmplitudeScale::NaturalLog => (amplitude / 20.0).exp(),
        }
    }
}

/// Non-negative-frequency half of a real-input DFT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    pub frequencies: Vec<f64>,
    pub amplitudes: Vec<f64>,
    pub scale: AmplitudeScale,
}

impl Spectrum {
    /// Build a spectrum from parallel frequency/amplitude arrays.
    ///
    /// Frequencies must be strictly increasing and the arrays must have equal length.
    pub fn from_parts(
        frequencies: Vec<f64>,
        amplitudes: Vec<f64>,
        scale: AmplitudeScale,
    ) -> Result<Self> {
        if frequencies.len() != amplitudes.len() {
            return Err(Error::InvalidInput(format!(
                "spectrum has {} frequencies but {} amplitudes",
                frequencies.len(),
                amplitudes.len()
            )));
        }
        if frequencies.is_empty() {
            return Err(Error::InvalidInput("spectrum has no bins".into()));
        }
        if let Some(pos) = frequencies.windows(2).position(|w| !(w[1] > w[0])) {
            return Err(Error::InvalidInput(format!(
                "frequencies must be strictly increasing (bin {} -> {})",
                pos,
                pos + 1
            )));
        }
        Ok(Self {
            frequencies,
            amplitudes,
            scale,
        })
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Frequency resolution (Hz per bin). Zero for a single-bin spectrum.
    pub fn bin_width(&self) -> f64 {
        if self.frequencies.len() < 2 {
            return 0.0;
        }
        self.frequencies[1] - self.frequencies[0]
    }

    /// Re-express the amplitudes in another convention.
    pub fn to_scale(&self, scale: AmplitudeScale) -> Spectrum {
        if scale == self.scale {
            return self.clone();
        }
        let amplitudes = self
            .amplitudes
            .iter()
            .map(|&a| scale.amplitude_of(self.scale.magnitude_of(a)))
            .collect();
        Spectrum {
            frequencies: self.frequencies.clone(),
            amplitudes,
            scale,
        }
    }

    /// `[frequency, amplitude]` pairs, the shape plot code consumes.
    pub fn points(&self) -> Vec<[f64; 2]> {
        self.frequencies
            .iter()
            .zip(self.amplitudes.iter())
            .map(|(f, a)| [*f, *a])
            .collect()
    }
}

/// Inclusive analysis passband.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencyBand {
    pub low_hz: f64,
    pub high_hz: f64,
}

impl Default for FrequencyBand {
    fn default() -> Self {
        Self {
            low_hz: FILTER_LOW,
            high_hz: FILTER_HIGH,
        }
    }
}

impl FrequencyBand {
    pub fn new(low_hz: f64, high_hz: f64) -> Self {
        Self { low_hz, high_hz }
    }

    pub fn contains(&self, freq: f64) -> bool {
        self.low_hz <= freq && freq <= self.high_hz
    }

    pub fn validate(&self) -> Result<()> {
        if !self.low_hz.is_finite() || !self.high_hz.is_finite() || self.low_hz > self.high_hz {
            return Err(Error::InvalidConfiguration(format!(
                "frequency band [{}, {}] is not a valid interval",
                self.low_hz, self.high_hz
            )));
        }
        Ok(())
    }
}

/// Indices of local maxima in a spectrum plus the most significant one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakSet {
    pub indices: Vec<usize>,
    pub dominant: Option<usize>,
}

impl PeakSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn frequencies(&self, spectrum: &Spectrum) -> Vec<f64> {
        self.indices
            .iter()
            .map(|&i| spectrum.frequencies[i])
            .collect()
    }

    pub fn amplitudes(&self, spectrum: &Spectrum) -> Vec<f64> {
        self.indices.iter().map(|&i| spectrum.amplitudes[i]).collect()
    }

    pub fn dominant_frequency(&self, spectrum: &Spectrum) -> Option<f64> {
        self.dominant.map(|i| spectrum.frequencies[i])
    }

    pub fn peak_info(&self, spectrum: &Spectrum) -> Vec<PeakInfo> {
        self.indices
            .iter()
            .map(|&i| PeakInfo::at(spectrum, i))
            .collect()
    }
}

/// A peak resolved against its spectrum, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakInfo {
    pub index: usize,
    pub frequency_hz: f64,
    pub amplitude: f64,
}

impl PeakInfo {
    pub fn at(spectrum: &Spectrum, index: usize) -> Self {
        Self {
            index,
            frequency_hz: spectrum.frequencies[index],
            amplitude: spectrum.amplitudes[index],
        }
    }
}

/// Resolved wingbeat frequency for one series; `None` means no usable peak.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WingbeatEstimate {
    pub frequency_hz: Option<f64>,
}

impl WingbeatEstimate {
    pub fn found(frequency_hz: f64) -> Self {
        Self {
            frequency_hz: Some(frequency_hz),
        }
    }

    pub fn none() -> Self {
        Self { frequency_hz: None }
    }

    pub fn is_found(&self) -> bool {
        self.frequency_hz.is_some()
    }

    /// Frequency rounded to 0.1 Hz, the precision results tables carry.
    pub fn rounded(&self) -> Option<f64> {
        self.frequency_hz.map(|f| (f * 10.0).round() / 10.0)
    }

    /// Value as it appears in a results table: one decimal, or `NaN` when absent.
    pub fn table_value(&self) -> f64 {
        self.rounded().unwrap_or(f64::NAN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spectrum_rejects_mismatched_lengths() {
        let err = Spectrum::from_parts(vec![0.0, 1.0], vec![1.0], AmplitudeScale::Linear)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn spectrum_rejects_non_increasing_frequencies() {
        let err = Spectrum::from_parts(
            vec![0.0, 2.0, 2.0],
            vec![1.0, 2.0, 3.0],
            AmplitudeScale::Linear,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn scale_conversion_round_trips_magnitudes() {
        let lin = Spectrum::from_parts(
            vec![0.0, 1.0, 2.0],
            vec![1.0, std::f64::consts::E, 0.0],
            AmplitudeScale::Linear,
        )
        .unwrap();
        let log = lin.to_scale(AmplitudeScale::NaturalLog);
        assert_eq!(log.amplitudes[0], 0.0);
        assert!((log.amplitudes[1] - 20.0).abs() < 1e-12);
        assert_eq!(log.amplitudes[2], f64::NEG_INFINITY);
        let back = log.to_scale(AmplitudeScale::Linear);
        assert!((back.amplitudes[1] - std::f64::consts::E).abs() < 1e-12);
        assert_eq!(back.amplitudes[2], 0.0);
    }

    #[test]
    fn band_is_inclusive() {
        let band = FrequencyBand::default();
        assert!(band.contains(4.0));
        assert!(band.contains(30.0));
        assert!(!band.contains(30.0001));
        assert!(FrequencyBand::new(10.0, 5.0).validate().is_err());
    }

    #[test]
    fn estimate_rounds_for_tables() {
        assert_eq!(WingbeatEstimate::found(11.962890625).rounded(), Some(12.0));
        assert!(WingbeatEstimate::none().table_value().is_nan());
    }
}
