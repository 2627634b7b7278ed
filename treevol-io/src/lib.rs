//! I/O operations for treevol
//!
//! This crate decodes PLY meshes produced by the tree reconstruction step,
//! reads tree summaries for heights, and writes JSON/CSV volume reports.

pub mod ply;
pub mod trees;
pub mod report;
pub mod error;

pub use error::*;
pub use ply::{DecodedPly, PlyEncoding, PlyHeader, PlyMeshReader, PlyMeshWriter, PlyWriteOptions};
pub use report::{MeasurementMethod, ReportOptions, ReportSummary, VolumeReport};
pub use trees::tree_height;

use std::path::Path;
use tracing::debug;
use treevol_core::MeshMeasurement;

/// Measure the volume and surface area of a mesh file.
///
/// Best effort: an unreadable or malformed file and a mesh without usable
/// faces both give `None`. Truncated data is measured as far as it goes.
pub fn measure_mesh_file<P: AsRef<Path>>(path: P) -> Option<MeshMeasurement> {
    let path = path.as_ref();
    let mesh = PlyMeshReader::read_best_effort(path)?;
    let measurement = mesh.measure();

    match &measurement {
        Some(m) => debug!(
            path = %path.display(),
            volume = m.volume,
            area = m.area,
            faces = m.faces_used,
            "Measured mesh"
        ),
        None => debug!(path = %path.display(), "Mesh has no usable faces"),
    }

    measurement
}
