//! treevol measure command - volume and area of individual meshes.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::info;
use treevol_io::{measure_mesh_file, MeasurementMethod, VolumeReport};

use crate::{output, Cli};

pub fn run(inputs: &[PathBuf], cli: &Cli) -> Result<()> {
    let files = discover_meshes(inputs)?;
    if files.is_empty() {
        if !cli.quiet {
            println!("No PLY files found");
        }
        return Ok(());
    }

    info!(count = files.len(), "Measuring meshes");
    let reports: Vec<VolumeReport> = files.par_iter().map(|path| measure_one(path)).collect();

    output::emit_reports(&reports, cli)
}

/// Measure a single mesh file into a report named after the file.
pub fn measure_one(path: &Path) -> VolumeReport {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let mut report = VolumeReport::new(name);
    report.record(measure_mesh_file(path), MeasurementMethod::Direct);
    report
}

/// Expand directories to the `.ply` files directly inside them.
///
/// Files named explicitly are kept whatever their extension. Directory
/// contents are sorted by name.
pub fn discover_meshes(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let mut found = Vec::new();
            for entry in fs::read_dir(input).with_context(|| format!("Failed to read directory {:?}", input))? {
                let path = entry?.path();
                if path.is_file() && is_ply(&path) {
                    found.push(path);
                }
            }
            found.sort();
            files.extend(found);
        } else {
            files.push(input.clone());
        }
    }

    Ok(files)
}

fn is_ply(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ply"))
}
