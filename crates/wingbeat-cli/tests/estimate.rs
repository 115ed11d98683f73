use assert_cmd::cargo::cargo_bin_cmd;
use serde::Deserialize;
use std::{error::Error, fs, path::PathBuf};
use wingbeat_lib::{pipeline::WingbeatReport, DetectorKind, PeakInfo};

#[derive(Deserialize)]
struct PeaksOutput {
    peaks: Vec<PeakInfo>,
    dominant: Option<PeakInfo>,
}

#[test]
fn estimate_reports_fundamental() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("wingbeat");
    cmd.args(["estimate", "--input", &sample_path("test_data/wingbeat_12hz.txt")]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let report: WingbeatReport = serde_json::from_slice(&out)?;

    assert_eq!(report.detector, DetectorKind::Threshold);
    assert_eq!(report.sample_count, 1500);
    assert_eq!(report.window_length, 4096);
    assert_eq!(report.peaks.len(), 1);
    assert_close(report.estimate.frequency_hz.expect("estimate"), 11.963, 1e-3);
    assert_eq!(report.estimate.rounded(), Some(12.0));
    Ok(())
}

#[test]
fn estimate_recovers_fundamental_below_louder_harmonic() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("wingbeat");
    cmd.args([
        "estimate",
        "--input",
        &sample_path("test_data/wingbeat_harmonic.txt"),
    ]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let report: WingbeatReport = serde_json::from_slice(&out)?;

    let dominant = report.dominant.expect("dominant peak");
    assert_close(dominant.frequency_hz, 23.926, 1e-3);
    let resolution = report.resolution.expect("resolution");
    assert!(resolution.dominant_was_harmonic());
    assert_eq!(report.estimate.rounded(), Some(12.0));
    Ok(())
}

#[test]
fn config_file_selects_heuristic_detector() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("wingbeat");
    cmd.args([
        "--config",
        &sample_path("test_data/heuristic.toml"),
        "estimate",
        "--input",
        &sample_path("test_data/wingbeat_harmonic.txt"),
    ]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let report: WingbeatReport = serde_json::from_slice(&out)?;

    // The louder harmonic masks the fundamental inside its octave.
    assert_eq!(report.detector, DetectorKind::Heuristic);
    assert_eq!(report.peaks.len(), 1);
    assert_eq!(report.estimate.rounded(), Some(23.9));
    Ok(())
}

#[test]
fn detector_flag_overrides_config() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("wingbeat");
    cmd.args([
        "--config",
        &sample_path("test_data/heuristic.toml"),
        "estimate",
        "--detector",
        "threshold",
        "--input",
        &sample_path("test_data/wingbeat_harmonic.txt"),
    ]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let report: WingbeatReport = serde_json::from_slice(&out)?;
    assert_eq!(report.detector, DetectorKind::Threshold);
    assert_eq!(report.estimate.rounded(), Some(12.0));
    Ok(())
}

#[test]
fn estimate_reads_stdin() -> Result<(), Box<dyn Error>> {
    let samples = fs::read_to_string(sample_path("test_data/wingbeat_12hz.txt"))?;
    let mut cmd = cargo_bin_cmd!("wingbeat");
    cmd.arg("estimate").write_stdin(samples);
    let out = cmd.assert().success().get_output().stdout.clone();
    let report: WingbeatReport = serde_json::from_slice(&out)?;
    assert_eq!(report.estimate.rounded(), Some(12.0));
    Ok(())
}

#[test]
fn estimate_bins_event_csv() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("wingbeat");
    cmd.args([
        "estimate",
        "--events",
        &sample_path("test_data/events/bee/bee_01.csv"),
    ]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let report: WingbeatReport = serde_json::from_slice(&out)?;
    assert_eq!(report.sample_count, 1200);
    assert_close(report.fs, 1000.0, 1e-9);
    assert_eq!(report.estimate.rounded(), Some(18.1));
    Ok(())
}

#[test]
fn flat_counts_have_no_estimate() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("wingbeat");
    cmd.args([
        "estimate",
        "--events",
        &sample_path("test_data/events/moth/moth_flat.csv"),
    ]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let report: WingbeatReport = serde_json::from_slice(&out)?;
    assert!(report.peaks.is_empty());
    assert!(report.estimate.frequency_hz.is_none());
    Ok(())
}

#[test]
fn peaks_lists_top_two_candidates() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("wingbeat");
    cmd.args([
        "peaks",
        "--input",
        &sample_path("test_data/wingbeat_harmonic.txt"),
    ]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let value: PeaksOutput = serde_json::from_slice(&out)?;
    let freqs: Vec<f64> = value.peaks.iter().map(|p| p.frequency_hz).collect();
    assert_eq!(freqs.len(), 2);
    assert_close(freqs[0], 23.926, 1e-3);
    assert_close(freqs[1], 11.963, 1e-3);
    assert_eq!(value.dominant, Some(value.peaks[0]));
    Ok(())
}

#[test]
fn invalid_band_is_rejected() {
    let mut cmd = cargo_bin_cmd!("wingbeat");
    cmd.args([
        "estimate",
        "--band-low",
        "30",
        "--band-high",
        "4",
        "--input",
        &sample_path("test_data/wingbeat_12hz.txt"),
    ]);
    cmd.assert().failure();
}

#[test]
fn sample_rate_flag_conflicts_with_event_input() {
    let mut cmd = cargo_bin_cmd!("wingbeat");
    cmd.args([
        "estimate",
        "--events",
        &sample_path("test_data/events/bee/bee_01.csv"),
        "--fs",
        "500",
    ]);
    cmd.assert().failure();
}

#[test]
fn empty_input_fails() {
    let mut cmd = cargo_bin_cmd!("wingbeat");
    cmd.arg("estimate").write_stdin("# nothing\n");
    cmd.assert().failure();
}

fn assert_close(a: f64, b: f64, tol: f64) {
    let diff = (a - b).abs();
    assert!(diff <= tol, "diff {} exceeded tol {} ({} vs {})", diff, tol, a, b);
}

fn workspace_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .expect("crates dir")
        .parent()
        .expect("workspace root")
        .to_path_buf()
}

fn sample_path(relative: &str) -> String {
    workspace_root()
        .join(relative)
        .to_string_lossy()
        .to_string()
}
