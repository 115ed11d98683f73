//! Sub-harmonic / second-harmonic disambiguation of the dominant peak.

use serde::{Deserialize, Serialize};

/// Tolerance (Hz) applied to the dominant frequency before halving or doubling it.
pub const HARMONIC_TOLERANCE_HZ: f64 = 1.0;

/// Evidence gathered while resolving the fundamental.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HarmonicResolution {
    pub fundamental_hz: f64,
    pub dominant_hz: f64,
    /// Candidate near `dominant / 2`, if any.
    pub half_candidate_hz: Option<f64>,
    /// Candidate near `dominant * 2`, if any.
    pub double_candidate_hz: Option<f64>,
}

impl HarmonicResolution {
    /// True when the dominant peak was judged to be the second harmonic.
    pub fn dominant_was_harmonic(&self) -> bool {
        self.half_candidate_hz.is_some()
    }
}

/// Fundamental frequency implied by `peak_freqs` and the dominant peak.
pub fn resolve_fundamental(peak_freqs: &[f64], dominant_hz: f64) -> f64 {
    resolve_harmonics(peak_freqs, dominant_hz).fundamental_hz
}

/// Only sub-harmonic evidence moves the estimate: a peak near half the dominant frequency
/// becomes the fundamental, a peak near twice it leaves the dominant in place.
pub fn resolve_harmonics(peak_freqs: &[f64], dominant_hz: f64) -> HarmonicResolution {
    let tol = HARMONIC_TOLERANCE_HZ;
    let double_candidate_hz = closest_within(
        peak_freqs,
        (dominant_hz - tol) * 2.0,
        (dominant_hz + tol) * 2.0,
        dominant_hz * 2.0,
    );
    let half_candidate_hz = closest_within(
        peak_freqs,
        (dominant_hz - tol) / 2.0,
        (dominant_hz + tol) / 2.0,
        dominant_hz / 2.0,
    );
    let fundamental_hz = half_candidate_hz.unwrap_or(dominant_hz);
    log::debug!(
        "harmonics: dominant {:.3} Hz, half {:?}, double {:?} -> {:.3} Hz",
        dominant_hz,
        half_candidate_hz,
        double_candidate_hz,
        fundamental_hz
    );
    HarmonicResolution {
        fundamental_hz,
        dominant_hz,
        half_candidate_hz,
        double_candidate_hz,
    }
}

/// First frequency in `[low, high]` with the smallest distance to `expected`.
fn closest_within(freqs: &[f64], low: f64, high: f64, expected: f64) -> Option<f64> {
    let mut best: Option<f64> = None;
    for &f in freqs.iter().filter(|&&f| low <= f && f <= high) {
        match best {
            Some(b) if (f - expected).abs() >= (b - expected).abs() => {}
            _ => best = Some(f),
        }
    }
    best
}
