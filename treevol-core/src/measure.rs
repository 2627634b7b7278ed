//! Volume and surface area estimation
//!
//! Volume uses the divergence theorem: every face contributes the signed volume
//! of the tetrahedron spanned by the origin and the face's first three
//! vertices, `v0 · (v1 × v2) / 6`. Summed over a closed, consistently wound
//! mesh this is the enclosed volume; the reported value is its magnitude so
//! the winding direction does not matter.
//!
//! Faces with more than three vertices contribute only their first three.
//! There is no fan triangulation of the remainder, so inputs are expected to
//! be triangle meshes.
//!
//! The mesh is assumed to be watertight. Nothing here checks it.

use crate::mesh::PolygonMesh;
use crate::point::Vertex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Volume and surface area of a mesh
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshMeasurement {
    /// Enclosed volume, always non-negative
    pub volume: f64,
    /// Sum of the triangle areas, always non-negative
    pub area: f64,
    /// Signed volume before taking the magnitude. Negative for inward facing
    /// winding.
    pub signed_volume: f64,
    /// Number of faces that passed the validity filter
    pub faces_used: usize,
}

impl MeshMeasurement {
    /// Whether the face winding points into the enclosed volume
    pub fn is_inside_out(&self) -> bool {
        self.signed_volume < 0.0
    }
}

/// A face is usable when it has at least three indices and every index
/// refers to an existing vertex.
pub fn face_is_valid(face: &[usize], vertex_count: usize) -> bool {
    face.len() >= 3 && face.iter().all(|&i| i < vertex_count)
}

/// Signed volume of the tetrahedron formed by the origin and a triangle
pub fn signed_tetrahedron_volume(v0: &Vertex, v1: &Vertex, v2: &Vertex) -> f64 {
    let cross = v1.coords.cross(&v2.coords);
    v0.coords.dot(&cross) / 6.0
}

/// Area of a triangle via the cross product of two edges
pub fn triangle_area(v0: &Vertex, v1: &Vertex, v2: &Vertex) -> f64 {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    edge1.cross(&edge2).norm() / 2.0
}

/// Estimate the volume and surface area of a mesh
///
/// Returns `None` when there is no usable geometry: no vertices, no faces, or
/// no face that passes [`face_is_valid`]. That is distinct from a measured
/// volume of zero.
pub fn estimate_volume_area(mesh: &PolygonMesh) -> Option<MeshMeasurement> {
    if mesh.is_empty() {
        return None;
    }

    let vertices = mesh.vertices();
    let mut signed_volume = 0.0_f64;
    let mut area = 0.0_f64;
    let mut faces_used = 0usize;

    for (index, face) in mesh.faces().iter().enumerate() {
        if !face_is_valid(face, vertices.len()) {
            trace!(face = index, len = face.len(), "Skipping invalid face");
            continue;
        }

        let v0 = &vertices[face[0]];
        let v1 = &vertices[face[1]];
        let v2 = &vertices[face[2]];

        signed_volume += signed_tetrahedron_volume(v0, v1, v2);
        area += triangle_area(v0, v1, v2);
        faces_used += 1;
    }

    let skipped = mesh.face_count() - faces_used;
    if skipped > 0 {
        debug!(skipped, total = mesh.face_count(), "Faces excluded from measurement");
    }

    if faces_used == 0 {
        return None;
    }

    Some(MeshMeasurement {
        volume: signed_volume.abs(),
        area,
        signed_volume,
        faces_used,
    })
}

impl PolygonMesh {
    /// Estimate the enclosed volume and surface area.
    ///
    /// See [`estimate_volume_area`].
    pub fn measure(&self) -> Option<MeshMeasurement> {
        estimate_volume_area(self)
    }
}
