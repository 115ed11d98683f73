//! Rising-edge peak detection validated against the local octave floor.
//!
//! A bin that ends a run of strictly increasing amplitudes is a candidate. It becomes a
//! peak when nothing in its octave neighbourhood `(f/2, 2f]` is louder and it stands more
//! than `margin` above the neighbourhood's mean amplitude. The margin is in the units of
//! the spectrum it is given: with the default `20 * ln` spectrum a margin of 10 means
//! the candidate is about 1.65x the mean magnitude around it.

use super::first_max_by_amplitude;
use crate::signal::{FrequencyBand, PeakSet, Spectrum};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicParams {
    /// Required excess over the neighbourhood mean.
    pub margin: f64,
}

impl Default for HeuristicParams {
    fn default() -> Self {
        Self { margin: 10.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    ScanningRise,
    ValidatingCandidate(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Accepted,
    Rejected { reset_run: bool },
}

pub fn detect_heuristic_peaks(spectrum: &Spectrum, band: &FrequencyBand) -> PeakSet {
    detect_heuristic_peaks_with_params(spectrum, band, &HeuristicParams::default())
}

/// Accepted peaks inside `band`, dominant = loudest of them.
///
/// Returns an empty set both when nothing was accepted and when every accepted peak
/// falls outside the band.
pub fn detect_heuristic_peaks_with_params(
    spectrum: &Spectrum,
    band: &FrequencyBand,
    params: &HeuristicParams,
) -> PeakSet {
    let accepted = heuristic_candidates(spectrum, params);
    if accepted.is_empty() {
        log::debug!("heuristic: no candidate cleared its octave neighbourhood");
        return PeakSet::empty();
    }
    let indices: Vec<usize> = accepted
        .iter()
        .copied()
        .filter(|&i| band.contains(spectrum.frequencies[i]))
        .collect();
    if indices.is_empty() {
        log::debug!(
            "heuristic: {} peaks found, none inside [{}, {}] Hz",
            accepted.len(),
            band.low_hz,
            band.high_hz
        );
        return PeakSet::empty();
    }
    let dominant = first_max_by_amplitude(&indices, &spectrum.amplitudes);
    PeakSet { indices, dominant }
}

/// Every accepted peak over the whole spectrum, in ascending index order.
pub fn heuristic_candidates(spectrum: &Spectrum, params: &HeuristicParams) -> Vec<usize> {
    let amps = &spectrum.amplitudes;
    let mut rise_run = 0usize;
    let mut accepted = Vec::new();

    for i in 1..amps.len() {
        let state = if amps[i] > amps[i - 1] {
            rise_run += 1;
            ScanState::ScanningRise
        } else if rise_run >= 1 {
            ScanState::ValidatingCandidate(i - 1)
        } else {
            ScanState::ScanningRise
        };

        if let ScanState::ValidatingCandidate(candidate) = state {
            match validate_candidate(spectrum, candidate, params.margin) {
                Verdict::Accepted => {
                    accepted.push(candidate);
                    rise_run = 0;
                }
                Verdict::Rejected { reset_run: true } => rise_run = 0,
                Verdict::Rejected { reset_run: false } => {}
            }
        }
    }
    log::debug!("heuristic: accepted {:?}", accepted);
    accepted
}

fn validate_candidate(spectrum: &Spectrum, candidate: usize, margin: f64) -> Verdict {
    let freqs = &spectrum.frequencies;
    let amps = &spectrum.amplitudes;
    let level = amps[candidate];
    let bottom = freqs[candidate] / 2.0;
    let top = freqs[candidate] * 2.0;
    let start = freqs.partition_point(|&f| f <= bottom);
    let end = freqs.partition_point(|&f| f <= top);

    let mut sum = 0.0;
    let mut count = 0usize;
    for j in start..end {
        if j == candidate {
            continue;
        }
        if amps[j] > level {
            // A louder bin on the rising side means this slope belongs to a peak already seen.
            return Verdict::Rejected {
                reset_run: j < candidate,
            };
        }
        sum += amps[j];
        count += 1;
    }

    // Known quirk: reaching the neighbourhood's right edge inside the spectrum resets the
    // rise counter whether or not the candidate is accepted.
    let boundary_reached = end < freqs.len();
    let amp_diff = level - sum / count as f64;
    if amp_diff.is_finite() && amp_diff > margin {
        Verdict::Accepted
    } else {
        log::trace!(
            "heuristic: rejected bin {} ({:.3} Hz), excess {:.3} over {} neighbours",
            candidate,
            freqs[candidate],
            amp_diff,
            count
        );
        Verdict::Rejected {
            reset_run: boundary_reached,
        }
    }
}
