//! Directory-level driver: one estimate per event CSV, grouped by sub-directory.

use crate::{
    config::PipelineConfig,
    error::Error,
    io::{events::load_event_series, results::ResultRow},
    pipeline::estimate_wingbeat,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// An input file that produced no row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedFile {
    pub group: String,
    pub file: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub rows: Vec<ResultRow>,
    pub skipped: Vec<SkippedFile>,
}

/// `(group, path)` for every `*.csv` under `dir`, in sorted order.
///
/// Each sub-directory is a group; CSV files directly inside `dir` form a group named after
/// `dir` itself. Only one level of nesting is considered.
pub fn collect_inputs(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let root_group = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input".into());
    let mut inputs = Vec::new();
    for entry in sorted_entries(dir)? {
        if entry.is_dir() {
            let group = entry
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            for file in sorted_entries(&entry)? {
                if is_csv(&file) {
                    inputs.push((group.clone(), file));
                }
            }
        } else if is_csv(&entry) {
            inputs.push((root_group.clone(), entry));
        }
    }
    Ok(inputs)
}

/// Estimate every recording under `dir`.
///
/// Unreadable files and files whose series cannot be analysed are skipped with a warning;
/// an invalid configuration aborts the whole run.
pub fn run_batch(dir: &Path, cfg: &PipelineConfig) -> Result<BatchOutcome> {
    cfg.validate()?;
    let mut outcome = BatchOutcome::default();
    for (group, path) in collect_inputs(dir)? {
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        log::info!("Processing file: {}/{}", group, file);

        let series = match load_event_series(&path, &cfg.binning) {
            Ok(series) => series,
            Err(err) => {
                log::warn!("skipping {}: {:#}", path.display(), err);
                outcome.skipped.push(SkippedFile {
                    group,
                    file,
                    reason: format!("{err:#}"),
                });
                continue;
            }
        };
        match estimate_wingbeat(&series, cfg) {
            Ok(analysis) => outcome.rows.push(ResultRow {
                group,
                file,
                frequency_hz: analysis.report.estimate.table_value(),
            }),
            Err(Error::InvalidInput(reason)) => {
                log::warn!("skipping {}: {}", path.display(), reason);
                outcome.skipped.push(SkippedFile {
                    group,
                    file,
                    reason,
                });
            }
            Err(err) => return Err(err).with_context(|| format!("processing {}", path.display())),
        }
    }
    log::info!(
        "batch done: {} rows, {} skipped",
        outcome.rows.len(),
        outcome.skipped.len()
    );
    Ok(outcome)
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        entries.push(entry?.path());
    }
    entries.sort();
    Ok(entries)
}

fn is_csv(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("csv"))
            .unwrap_or(false)
}
