//! Relative-height peak detection restricted to the analysis band.
//!
//! The relative cutoff is evaluated on the `20 * ln` amplitude view: for a linear
//! spectrum a bin qualifies when `20 ln a >= relative_height * 20 ln max`.

use crate::signal::{AmplitudeScale, FrequencyBand, PeakSet, Spectrum};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdParams {
    /// Minimum peak height as a fraction of the in-band maximum.
    pub relative_height: f64,
    /// Number of candidates kept when several qualify.
    pub max_peaks: usize,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            relative_height: 0.95,
            max_peaks: 2,
        }
    }
}

pub fn detect_threshold_peaks(spectrum: &Spectrum, band: &FrequencyBand) -> PeakSet {
    detect_threshold_peaks_with_params(spectrum, band, &ThresholdParams::default())
}

pub fn detect_threshold_peaks_with_params(
    spectrum: &Spectrum,
    band: &FrequencyBand,
    params: &ThresholdParams,
) -> PeakSet {
    let Some((start, end)) = band_range(&spectrum.frequencies, band) else {
        log::debug!(
            "threshold: no bins inside [{}, {}] Hz",
            band.low_hz,
            band.high_hz
        );
        return PeakSet::empty();
    };

    let view: Vec<f64> = spectrum.amplitudes[start..end]
        .iter()
        .map(|&a| match spectrum.scale {
            AmplitudeScale::NaturalLog => a,
            AmplitudeScale::Linear => AmplitudeScale::NaturalLog.amplitude_of(a),
        })
        .collect();
    let max = view.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let height = max * params.relative_height;

    let mut candidates: Vec<usize> = local_maxima(&view)
        .into_iter()
        .filter(|&i| view[i] >= height)
        .collect();
    log::debug!(
        "threshold: {} candidates at or above {:.3} (band offset {})",
        candidates.len(),
        height,
        start
    );
    if candidates.is_empty() {
        return PeakSet::empty();
    }

    // Stable sort keeps the first occurrence ahead on equal heights.
    candidates.sort_by(|a, b| view[*b].total_cmp(&view[*a]));
    candidates.truncate(params.max_peaks.max(1));
    let indices: Vec<usize> = candidates.iter().map(|i| i + start).collect();
    let dominant = indices.first().copied();
    PeakSet { indices, dominant }
}

/// Half-open index range of the bins whose frequency lies in `band`.
fn band_range(frequencies: &[f64], band: &FrequencyBand) -> Option<(usize, usize)> {
    let start = frequencies.partition_point(|&f| f < band.low_hz);
    let end = frequencies.partition_point(|&f| f <= band.high_hz);
    (start < end).then_some((start, end))
}

/// Local maxima, excluding both ends. A flat top counts once, at its middle index.
fn local_maxima(x: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if x.len() < 3 {
        return peaks;
    }
    let last = x.len() - 1;
    let mut i = 1;
    while i < last {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < last && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spectrum(freqs: &[f64], amps: &[f64]) -> Spectrum {
        Spectrum::from_parts(freqs.to_vec(), amps.to_vec(), AmplitudeScale::Linear).unwrap()
    }

    #[test]
    fn two_strongest_peaks_in_band() {
        let s = spectrum(
            &[0.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0],
            &[1.0, 2.0, 10.0, 2.0, 9.0, 2.0, 1.0],
        );
        let peaks = detect_threshold_peaks(&s, &FrequencyBand::default());
        assert_eq!(peaks.indices, vec![2, 4]);
        assert_eq!(peaks.dominant, Some(2));
    }

    #[test]
    fn monotonic_spectrum_has_no_peaks() {
        let s = spectrum(&[0.0, 2.0, 4.0, 6.0, 8.0], &[1.0, 1.5, 2.0, 2.5, 3.0]);
        let peaks = detect_threshold_peaks(&s, &FrequencyBand::default());
        assert!(peaks.is_empty());
        assert_eq!(peaks.dominant, None);
    }

    #[test]
    fn single_candidate_is_dominant() {
        let s = spectrum(
            &[0.0, 5.0, 10.0, 15.0, 20.0, 25.0],
            &[1.0, 2.0, 50.0, 2.0, 3.0, 1.0],
        );
        let peaks = detect_threshold_peaks(&s, &FrequencyBand::default());
        assert_eq!(peaks.indices, vec![2]);
        assert_eq!(peaks.dominant, Some(2));
    }

    #[test]
    fn keeps_at_most_two_in_descending_order() {
        let s = spectrum(
            &[0.0, 4.0, 6.0, 8.0, 10.0, 12.0, 14.0, 16.0, 18.0],
            &[1.0, 1.0, 9.0, 1.0, 10.0, 1.0, 9.5, 1.0, 1.0],
        );
        let peaks = detect_threshold_peaks(&s, &FrequencyBand::default());
        assert_eq!(peaks.indices, vec![4, 6]);
        assert_eq!(peaks.dominant, Some(4));
    }

    #[test]
    fn out_of_band_maxima_are_ignored() {
        let s = spectrum(
            &[0.0, 1.0, 2.0, 3.0, 5.0, 10.0, 15.0, 31.0, 32.0, 33.0],
            &[1.0, 100.0, 1.0, 1.0, 2.0, 8.0, 2.0, 1.0, 200.0, 1.0],
        );
        let band = FrequencyBand::default();
        let peaks = detect_threshold_peaks(&s, &band);
        assert_eq!(peaks.indices, vec![5]);
        for f in peaks.frequencies(&s) {
            assert!(band.contains(f));
        }
    }

    #[test]
    fn plateau_reports_middle_index() {
        let s = spectrum(
            &[4.0, 5.0, 6.0, 7.0, 8.0, 9.0],
            &[1.0, 5.0, 5.0, 5.0, 1.0, 1.0],
        );
        let peaks = detect_threshold_peaks(&s, &FrequencyBand::default());
        assert_eq!(peaks.indices, vec![2]);
    }

    #[test]
    fn log_spectrum_is_used_as_is() {
        let s = Spectrum::from_parts(
            vec![0.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0],
            vec![10.0, 20.0, 100.0, 20.0, 96.0, 20.0, 10.0],
            AmplitudeScale::NaturalLog,
        )
        .unwrap();
        let peaks = detect_threshold_peaks(&s, &FrequencyBand::default());
        assert_eq!(peaks.indices, vec![2, 4]);
    }

    #[test]
    fn empty_band_yields_no_peaks() {
        let s = spectrum(&[0.0, 1.0, 2.0], &[1.0, 5.0, 1.0]);
        assert!(detect_threshold_peaks(&s, &FrequencyBand::default()).is_empty());
    }
}
