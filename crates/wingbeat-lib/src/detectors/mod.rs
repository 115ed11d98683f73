pub mod heuristic;
pub mod threshold;

pub use heuristic::{detect_heuristic_peaks, detect_heuristic_peaks_with_params, HeuristicParams};
pub use threshold::{detect_threshold_peaks, detect_threshold_peaks_with_params, ThresholdParams};

use serde::{Deserialize, Serialize};

/// Which peak detector feeds the harmonic resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectorKind {
    /// Relative-height local maxima, top two candidates.
    #[default]
    Threshold,
    /// Rising-edge candidates checked against their octave neighbourhood.
    Heuristic,
}

/// Index of the first maximum of `amplitudes[i]` over `indices`.
pub(crate) fn first_max_by_amplitude(indices: &[usize], amplitudes: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for &idx in indices {
        match best {
            Some(b) if amplitudes[idx] <= amplitudes[b] => {}
            _ => best = Some(idx),
        }
    }
    best
}
