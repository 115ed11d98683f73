use assert_cmd::cargo::cargo_bin_cmd;
use serde::Deserialize;
use std::{error::Error, path::PathBuf};
use wingbeat_lib::{
    batch::SkippedFile,
    io::results::{read_results_csv, GroupSummary},
};

#[derive(Deserialize)]
struct BatchOutput {
    rows: usize,
    skipped: Vec<SkippedFile>,
    groups: Vec<GroupSummary>,
}

#[test]
fn batch_writes_results_table() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let out_path = dir.path().join("results.csv");

    let mut cmd = cargo_bin_cmd!("wingbeat");
    cmd.args([
        "batch",
        &sample_path("test_data/events"),
        "--out",
        out_path.to_str().expect("utf8 path"),
    ]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let summary: BatchOutput = serde_json::from_slice(&out)?;
    assert_eq!(summary.rows, 4);
    assert!(summary.skipped.is_empty());

    let rows = read_results_csv(&out_path)?;
    let files: Vec<(&str, &str)> = rows
        .iter()
        .map(|r| (r.group.as_str(), r.file.as_str()))
        .collect();
    assert_eq!(
        files,
        vec![
            ("bee", "bee_01.csv"),
            ("bee", "bee_02.csv"),
            ("moth", "moth_01.csv"),
            ("moth", "moth_flat.csv"),
        ]
    );
    assert_eq!(rows[0].frequency_hz, 18.1);
    assert_eq!(rows[1].frequency_hz, 21.0);
    assert_eq!(rows[2].frequency_hz, 9.0);
    assert!(rows[3].frequency_hz.is_nan());

    assert_eq!(summary.groups.len(), 2);
    let moth = &summary.groups[1];
    assert_eq!(moth.group, "moth");
    assert_eq!(moth.files, 2);
    assert_eq!(moth.estimated, 1);
    assert_eq!(moth.median_hz, Some(9.0));
    Ok(())
}

#[test]
fn batch_skips_unreadable_files() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let group = dir.path().join("wasp");
    std::fs::create_dir(&group)?;
    std::fs::copy(
        sample_path("test_data/events/bee/bee_02.csv"),
        group.join("good.csv"),
    )?;
    std::fs::write(group.join("bad.csv"), "x,y,time\n1,1,10\n")?;
    let out_path = dir.path().join("results.csv");

    let mut cmd = cargo_bin_cmd!("wingbeat");
    cmd.args([
        "batch",
        group.parent().expect("tempdir").to_str().expect("utf8 path"),
        "--out",
        out_path.to_str().expect("utf8 path"),
    ]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let summary: BatchOutput = serde_json::from_slice(&out)?;
    assert_eq!(summary.rows, 1);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].file, "bad.csv");
    assert!(summary.skipped[0].reason.contains("column 't' not found"));

    let rows = read_results_csv(&out_path)?;
    assert_eq!(rows[0].group, "wasp");
    assert_eq!(rows[0].frequency_hz, 21.0);
    Ok(())
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
