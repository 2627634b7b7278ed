//! End-to-end tests: PLY files on disk to volume and area
//!
//! These cover the decode paths (ASCII, binary little/big endian), partial
//! files and the best-effort failure contract of `measure_mesh_file`.

use approx::assert_abs_diff_eq;
use byteorder::{LittleEndian, WriteBytesExt};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};
use treevol_core::{Point3d, PolygonMesh};
use treevol_io::{measure_mesh_file, PlyEncoding, PlyMeshReader, PlyMeshWriter, PlyWriteOptions};

/// A 2 x 3 x 4 box away from the origin, outward facing triangles
fn create_test_box() -> PolygonMesh {
    let (x0, y0, z0) = (10.0, -5.0, 100.0);
    let (x1, y1, z1) = (12.0, -2.0, 104.0);
    let vertices = vec![
        Point3d::new(x0, y0, z0),
        Point3d::new(x1, y0, z0),
        Point3d::new(x1, y1, z0),
        Point3d::new(x0, y1, z0),
        Point3d::new(x0, y0, z1),
        Point3d::new(x1, y0, z1),
        Point3d::new(x1, y1, z1),
        Point3d::new(x0, y1, z1),
    ];
    let triangles = [
        [0, 2, 1],
        [0, 3, 2],
        [4, 5, 6],
        [4, 6, 7],
        [0, 1, 5],
        [0, 5, 4],
        [2, 3, 7],
        [2, 7, 6],
        [0, 4, 7],
        [0, 7, 3],
        [1, 2, 6],
        [1, 6, 5],
    ];
    PolygonMesh::from_triangles(vertices, &triangles)
}

fn create_test_tetrahedron() -> PolygonMesh {
    let vertices = vec![
        Point3d::new(0.0, 0.0, 0.0),
        Point3d::new(3.0, 0.0, 0.0),
        Point3d::new(0.0, 3.0, 0.0),
        Point3d::new(0.0, 0.0, 3.0),
    ];
    PolygonMesh::from_triangles(vertices, &[[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]])
}

fn write_mesh(dir: &TempDir, name: &str, mesh: &PolygonMesh, options: &PlyWriteOptions) -> PathBuf {
    let path = dir.path().join(name);
    PlyMeshWriter::write_ply_file(mesh, &path, options).unwrap();
    path
}

fn write_bytes(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = fs::File::create(&path).unwrap();
    file.write_all(bytes).unwrap();
    path
}

fn file_len(path: &Path) -> usize {
    fs::metadata(path).unwrap().len() as usize
}

#[test]
fn test_box_volume_and_area_all_encodings() {
    let dir = tempdir().unwrap();
    let mesh = create_test_box();

    for (name, options) in [
        ("box_ascii.ply", PlyWriteOptions::ascii()),
        ("box_le.ply", PlyWriteOptions::binary_little_endian()),
        ("box_be.ply", PlyWriteOptions::binary_big_endian()),
    ] {
        let path = write_mesh(&dir, name, &mesh, &options);
        let m = measure_mesh_file(&path).unwrap();

        assert_abs_diff_eq!(m.volume, 24.0, epsilon = 1e-6);
        assert_abs_diff_eq!(m.area, 52.0, epsilon = 1e-6);
        assert_eq!(m.faces_used, 12);
    }
}

#[test]
fn test_binary_and_ascii_agree() {
    let dir = tempdir().unwrap();
    let mesh = create_test_tetrahedron();

    let ascii = write_mesh(&dir, "tetra_ascii.ply", &mesh, &PlyWriteOptions::ascii());
    let binary = write_mesh(&dir, "tetra_le.ply", &mesh, &PlyWriteOptions::binary_little_endian());

    let from_ascii = measure_mesh_file(&ascii).unwrap();
    let from_binary = measure_mesh_file(&binary).unwrap();

    assert_abs_diff_eq!(from_ascii.volume, 4.5, epsilon = 1e-9);
    assert_abs_diff_eq!(from_ascii.volume, from_binary.volume, epsilon = 1e-9);
    assert_abs_diff_eq!(from_ascii.area, from_binary.area, epsilon = 1e-9);
}

#[test]
fn test_reversed_winding_file() {
    let dir = tempdir().unwrap();
    let mesh = create_test_tetrahedron();
    let reversed_faces = mesh
        .faces()
        .iter()
        .map(|f| f.iter().rev().copied().collect())
        .collect();
    let reversed = PolygonMesh::new(mesh.vertices().to_vec(), reversed_faces);

    let path = write_mesh(&dir, "inside_out.ply", &reversed, &PlyWriteOptions::default());
    let m = measure_mesh_file(&path).unwrap();

    assert_abs_diff_eq!(m.volume, 4.5, epsilon = 1e-9);
    assert!(m.is_inside_out());
}

#[test]
fn test_out_of_range_face_in_file_is_skipped() {
    let dir = tempdir().unwrap();
    let text = "ply\nformat ascii 1.0\nelement vertex 4\nproperty float x\nproperty float y\nproperty float z\n\
                element face 5\nproperty list uchar int vertex_indices\nend_header\n\
                0 0 0\n3 0 0\n0 3 0\n0 0 3\n\
                3 0 2 1\n3 0 1 3\n3 0 3 2\n3 1 2 3\n3 1 2 4\n";
    let path = write_bytes(&dir, "bogus_face.ply", text.as_bytes());

    let m = measure_mesh_file(&path).unwrap();
    assert_abs_diff_eq!(m.volume, 4.5, epsilon = 1e-9);
    assert_eq!(m.faces_used, 4);
}

#[test]
fn test_unrepresentable_face_indices_are_skipped() {
    let dir = tempdir().unwrap();
    let header = "ply\nformat ascii 1.0\nelement vertex 4\nproperty float x\nproperty float y\nproperty float z\n\
                  element face 5\nproperty list uchar int vertex_indices\nend_header\n\
                  0 0 0\n3 0 0\n0 3 0\n0 0 3\n\
                  3 0 2 1\n3 0 1 3\n3 0 3 2\n3 1 2 3\n";

    for (name, bogus) in [("huge_index.ply", "3 0 1 99999999999999999999999\n"), ("negative_index.ply", "3 -1 2 0\n")] {
        let path = write_bytes(&dir, name, format!("{}{}", header, bogus).as_bytes());

        let m = measure_mesh_file(&path).unwrap();
        assert_abs_diff_eq!(m.volume, 4.5, epsilon = 1e-9);
        assert_eq!(m.faces_used, 4);
    }
}

#[test]
fn test_truncated_binary_file_measures_what_was_read() {
    let dir = tempdir().unwrap();
    let mesh = create_test_box();
    let full = write_mesh(&dir, "full.ply", &mesh, &PlyWriteOptions::default());
    let bytes = fs::read(&full).unwrap();

    // Drop the last two faces (1 count byte + 3 indices each)
    let cut = file_len(&full) - 2 * 13;
    let path = write_bytes(&dir, "truncated.ply", &bytes[..cut]);

    let decoded = PlyMeshReader::read_ply_file(&path).unwrap();
    assert!(decoded.is_truncated());
    assert_eq!(decoded.mesh.vertex_count(), 8);
    assert_eq!(decoded.mesh.face_count(), 10);

    let m = measure_mesh_file(&path).unwrap();
    assert_eq!(m.faces_used, 10);
    assert!(m.area < 52.0);
}

#[test]
fn test_binary_file_cut_inside_vertices() {
    let dir = tempdir().unwrap();
    let mesh = create_test_box();
    let full = write_mesh(&dir, "full.ply", &mesh, &PlyWriteOptions::default());
    let bytes = fs::read(&full).unwrap();

    // Keep the header, five vertices and 8 bytes of the sixth
    let body_len = 8 * 12 + 12 * 13;
    let cut = file_len(&full) - body_len + 5 * 12 + 8;
    let path = write_bytes(&dir, "cut_vertices.ply", &bytes[..cut]);

    let decoded = PlyMeshReader::read_ply_file(&path).unwrap();
    assert!(decoded.is_truncated());
    assert_eq!(decoded.mesh.vertex_count(), 5);
    assert_eq!(decoded.mesh.vertices(), &mesh.vertices()[..5]);
    assert_eq!(decoded.mesh.face_count(), 0);

    // No faces survive, so there is nothing to measure
    assert!(measure_mesh_file(&path).is_none());
}

#[test]
fn test_declared_counts_beyond_data() {
    let dir = tempdir().unwrap();
    let text = "ply\nformat ascii 1.0\nelement vertex 100\nproperty float x\nproperty float y\nproperty float z\n\
                element face 50\nproperty list uchar int vertex_indices\nend_header\n\
                0 0 0\n3 0 0\n0 3 0\n0 0 3\n";
    let path = write_bytes(&dir, "short.ply", text.as_bytes());

    // Vertex decoding stops at the end of input, so no faces are read at all
    assert!(measure_mesh_file(&path).is_none());

    let decoded = PlyMeshReader::read_ply_file(&path).unwrap();
    assert_eq!(decoded.mesh.vertex_count(), 4);
    assert_eq!(decoded.mesh.face_count(), 0);
}

#[test]
fn test_header_only_file_is_absent() {
    let dir = tempdir().unwrap();
    let text = "ply\nformat binary_little_endian 1.0\nelement vertex 8\nproperty float x\n\
                property float y\nproperty float z\nelement face 12\nend_header\n";
    let path = write_bytes(&dir, "empty_body.ply", text.as_bytes());
    assert!(measure_mesh_file(&path).is_none());
}

#[test]
fn test_missing_end_header_is_absent() {
    let dir = tempdir().unwrap();
    let path = write_bytes(&dir, "broken.ply", b"ply\nformat ascii 1.0\nelement vertex 3\n");
    assert!(measure_mesh_file(&path).is_none());
    assert!(PlyMeshReader::read_ply_file(&path).is_err());
}

#[test]
fn test_binary_vertices_with_extra_properties() {
    let dir = tempdir().unwrap();
    let mesh = create_test_tetrahedron();

    let mut data = b"ply\nformat binary_little_endian 1.0\nelement vertex 4\n\
                     property float x\nproperty float y\nproperty float z\n\
                     property double gps_time\nproperty uchar classification\n\
                     element face 4\nproperty list uchar int vertex_indices\nend_header\n"
        .to_vec();
    for (i, v) in mesh.vertices().iter().enumerate() {
        data.write_f32::<LittleEndian>(v.x as f32).unwrap();
        data.write_f32::<LittleEndian>(v.y as f32).unwrap();
        data.write_f32::<LittleEndian>(v.z as f32).unwrap();
        data.write_f64::<LittleEndian>(1000.0 + i as f64).unwrap();
        data.write_u8(5).unwrap();
    }
    for face in mesh.faces() {
        data.write_u8(face.len() as u8).unwrap();
        for &index in face {
            data.write_u32::<LittleEndian>(index as u32).unwrap();
        }
    }
    let path = write_bytes(&dir, "attributed.ply", &data);

    let decoded = PlyMeshReader::read_ply_file(&path).unwrap();
    assert_eq!(decoded.header.encoding, PlyEncoding::BinaryLittleEndian);
    assert_eq!(decoded.header.vertex_stride(), 21);
    assert_eq!(decoded.mesh.vertices(), mesh.vertices());

    let m = measure_mesh_file(&path).unwrap();
    assert_abs_diff_eq!(m.volume, 4.5, epsilon = 1e-9);
}

#[test]
fn test_non_ascii_data_line_is_absent() {
    let dir = tempdir().unwrap();
    let mut bytes = b"ply\nformat ascii 1.0\nelement vertex 1\nelement face 0\nend_header\n".to_vec();
    bytes.extend_from_slice(&[0xff, 0xfe, b'\n']);
    let path = write_bytes(&dir, "garbage.ply", &bytes);

    assert!(measure_mesh_file(&path).is_none());
}
