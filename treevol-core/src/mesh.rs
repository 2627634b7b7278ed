//! Mesh data structures

use crate::point::*;

/// A polygon face: indices into the owning mesh's vertex sequence, in
/// declaration order. Faces are kept exactly as decoded, so out-of-range
/// indices or fewer than three entries are possible here and are filtered
/// by the estimator.
pub type Face = Vec<usize>;

/// A polygon mesh as decoded from file
///
/// The vertex and face sequences are fixed at construction. Vertex `i` is the
/// `i`-th vertex record of the file, which is what face indices refer to.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PolygonMesh {
    vertices: Vec<Vertex>,
    faces: Vec<Face>,
}

impl PolygonMesh {
    /// Create a mesh from vertices and faces
    pub fn new(vertices: Vec<Vertex>, faces: Vec<Face>) -> Self {
        Self { vertices, faces }
    }

    /// Create a mesh from triangles
    pub fn from_triangles(vertices: Vec<Vertex>, triangles: &[[usize; 3]]) -> Self {
        let faces = triangles.iter().map(|t| t.to_vec()).collect();
        Self { vertices, faces }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if the mesh has no usable geometry at all
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }
}
