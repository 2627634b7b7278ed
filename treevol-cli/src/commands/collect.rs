//! treevol collect command - volumes and heights from reconstruction output.
//!
//! Each tree `<stem>` in the output directory has a ray cloud
//! `<stem>_raycloud.ply`. Next to it the reconstruction may have written:
//!
//! - `<stem>_raycloud_trees_mesh.ply`: the tree mesh, measured first
//! - `<stem>_raycloud_mesh.ply`: the wrapped cloud mesh, the fallback
//! - `<stem>_raycloud_trees.txt`: the tree summary, used for height

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::{debug, info};
use treevol_io::{measure_mesh_file, tree_height, MeasurementMethod, VolumeReport};

use crate::{output, Cli};

const RAYCLOUD_SUFFIX: &str = "_raycloud.ply";

/// Paths of the reconstruction outputs for one tree
#[derive(Debug, Clone, PartialEq)]
pub struct TreeOutputs {
    pub stem: String,
    pub trees_mesh: PathBuf,
    pub wrap_mesh: PathBuf,
    pub trees_summary: PathBuf,
}

impl TreeOutputs {
    pub fn new(dir: &Path, stem: &str) -> Self {
        Self {
            stem: stem.to_string(),
            trees_mesh: dir.join(format!("{}_raycloud_trees_mesh.ply", stem)),
            wrap_mesh: dir.join(format!("{}_raycloud_mesh.ply", stem)),
            trees_summary: dir.join(format!("{}_raycloud_trees.txt", stem)),
        }
    }
}

pub fn run(dir: &Path, cli: &Cli) -> Result<()> {
    let stems = tree_stems(dir)?;
    if stems.is_empty() {
        if !cli.quiet {
            println!("No ray clouds found in {}", dir.display());
        }
        return Ok(());
    }

    info!(count = stems.len(), dir = %dir.display(), "Collecting tree results");
    let reports: Vec<VolumeReport> = stems
        .par_iter()
        .map(|stem| collect_tree(&TreeOutputs::new(dir, stem)))
        .collect();

    output::emit_reports(&reports, cli)
}

/// Tree stems of all ray clouds in a directory, sorted.
pub fn tree_stems(dir: &Path) -> Result<Vec<String>> {
    let mut stems = Vec::new();

    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read directory {:?}", dir))? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(RAYCLOUD_SUFFIX)) else {
            continue;
        };
        if !stem.is_empty() {
            stems.push(stem.to_string());
        }
    }

    stems.sort();
    Ok(stems)
}

/// Measure one tree: the tree mesh if it gives a volume, else the wrapped
/// mesh. Height comes from the tree summary either way.
pub fn collect_tree(outputs: &TreeOutputs) -> VolumeReport {
    let mut report = VolumeReport::new(outputs.stem.as_str());

    if outputs.trees_mesh.exists() {
        report.record(measure_mesh_file(&outputs.trees_mesh), MeasurementMethod::TreesMesh);
    }

    if !report.success && outputs.wrap_mesh.exists() {
        debug!(tree = %outputs.stem, "Falling back to wrapped mesh");
        report.record(measure_mesh_file(&outputs.wrap_mesh), MeasurementMethod::WrapMesh);
    }

    report.with_height(tree_height(&outputs.trees_summary))
}
