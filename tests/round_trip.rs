//! Write-then-read behaviour across every format, through the public API.

use std::fs;

use rustmesh_io::{
    read_mesh, read_mesh_with, read_obj, write_mesh, write_mesh_with, IoConfig, MeshBuffers, MeshFormat,
    MeshIoError, PlyEncoding, ReadOptions, StlEncoding, WriteOptions,
};
use tempfile::TempDir;

const TOLERANCE: f64 = 1e-6;

/// A quad and two triangles sharing an edge, with every optional channel.
fn mixed_mesh() -> MeshBuffers {
    MeshBuffers {
        positions: vec![
            0.0, 0.0, 0.0, //
            1.0, 0.0, 0.0, //
            1.0, 1.0, 0.0, //
            0.0, 1.0, 0.0, //
            2.0, 0.5, 0.25, //
            -0.125, 3.5, 1.0,
        ],
        normals: vec![0.0, 0.0, 1.0, 0.6, 0.0, 0.8],
        tex_coords: vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0],
        face_sizes: vec![4, 3, 3],
        face_vertex_indices: vec![0, 1, 2, 3, 1, 4, 2, 3, 2, 5],
        face_vertex_tex_coord_indices: vec![0, 1, 2, 3, 0, 1, 2, 3, 2, 0],
        face_vertex_normal_indices: vec![0, 0, 0, 0, 1, 1, 1, 0, 0, 0],
    }
}

fn positions_and_faces(mesh: &MeshBuffers) -> MeshBuffers {
    MeshBuffers::from_polygons(
        mesh.positions.clone(),
        mesh.face_sizes.clone(),
        mesh.face_vertex_indices.clone(),
    )
}

fn assert_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() <= TOLERANCE, "{} vs {}", a, e);
    }
}

fn temp_path(dir: &TempDir, name: &str) -> std::path::PathBuf {
    dir.path().join(name)
}

#[test]
fn obj_round_trip_keeps_every_channel() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "mixed.obj");
    let mesh = mixed_mesh();

    write_mesh(&path, &mesh).unwrap();
    let loaded = read_mesh(&path).unwrap();

    assert_close(&loaded.positions, &mesh.positions);
    assert_close(&loaded.normals, &mesh.normals);
    assert_close(&loaded.tex_coords, &mesh.tex_coords);
    assert_eq!(loaded.face_sizes, mesh.face_sizes);
    assert_eq!(loaded.face_vertex_indices, mesh.face_vertex_indices);
    assert_eq!(loaded.face_vertex_tex_coord_indices, mesh.face_vertex_tex_coord_indices);
    assert_eq!(loaded.face_vertex_normal_indices, mesh.face_vertex_normal_indices);
}

#[test]
fn obj_round_trip_with_a_subset_of_channels() {
    let dir = tempfile::tempdir().unwrap();

    let mut with_normals = mixed_mesh();
    with_normals.tex_coords.clear();
    with_normals.face_vertex_tex_coord_indices.clear();

    let mut with_tex_coords = mixed_mesh();
    with_tex_coords.normals.clear();
    with_tex_coords.face_vertex_normal_indices.clear();

    for (name, mesh) in [("normals.obj", with_normals), ("uv.obj", with_tex_coords)] {
        let path = temp_path(&dir, name);
        write_mesh(&path, &mesh).unwrap();
        let loaded = read_mesh(&path).unwrap();
        assert_eq!(loaded, mesh, "{}", name);
    }
}

#[test]
fn valence_is_preserved_by_polygon_formats() {
    let dir = tempfile::tempdir().unwrap();
    let mesh = positions_and_faces(&mixed_mesh());

    for format in [MeshFormat::Obj, MeshFormat::Off, MeshFormat::Ply] {
        let path = temp_path(&dir, &format!("valence.{}", format.extension()));
        write_mesh(&path, &mesh).unwrap();

        let loaded = read_mesh(&path).unwrap();
        assert_eq!(loaded.face_sizes, vec![4, 3, 3], "{}", format.name());
        assert_eq!(loaded.face_vertex_indices, mesh.face_vertex_indices, "{}", format.name());
        assert_close(&loaded.positions, &mesh.positions);
    }
}

#[test]
fn binary_encodings_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mesh = positions_and_faces(&mixed_mesh());

    for encoding in [PlyEncoding::BinaryLittleEndian, PlyEncoding::BinaryBigEndian] {
        let options = WriteOptions {
            ply_encoding: encoding,
            ..WriteOptions::default()
        };
        let path = temp_path(&dir, "binary.ply");
        write_mesh_with(&path, &mesh, &options).unwrap();
        assert_eq!(read_mesh(&path).unwrap(), mesh);
    }
}

#[test]
fn stl_round_trips_a_triangle_soup() {
    let dir = tempfile::tempdir().unwrap();
    let soup = MeshBuffers {
        positions: vec![
            0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0, //
            1.0, 0.0, 0.0, 2.0, 0.5, 0.25, 1.0, 1.0, 0.0,
        ],
        ..MeshBuffers::default()
    };

    for encoding in [StlEncoding::Ascii, StlEncoding::Binary] {
        let options = WriteOptions {
            stl_encoding: encoding,
            ..WriteOptions::default()
        };
        let path = temp_path(&dir, "soup.stl");
        write_mesh_with(&path, &soup, &options).unwrap();

        let loaded = read_mesh(&path).unwrap();
        assert_eq!(loaded.triangle_count(), 3);
        assert_eq!(loaded.normal_count(), 3);
        assert!(loaded.face_sizes.is_empty());
        assert_close(&loaded.positions, &soup.positions);
        assert_close(&loaded.normals[..6], &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);

        // Normals read back are stored and written as-is the second time
        let again = temp_path(&dir, "again.stl");
        write_mesh_with(&again, &loaded, &options).unwrap();
        assert_eq!(read_mesh(&again).unwrap(), loaded);
    }

    // An indexed polygon mesh is not a soup
    let err = write_mesh(temp_path(&dir, "quad.stl"), &positions_and_faces(&mixed_mesh())).unwrap_err();
    assert!(matches!(err, MeshIoError::InvalidLayout(_)));
}

#[test]
fn obj_indices_are_one_based_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "tri.obj");
    fs::write(&path, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

    let mesh = read_obj(&path).unwrap();
    assert_eq!(mesh.face_vertex_indices, vec![0, 1, 2]);

    write_mesh(&path, &mesh).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.lines().any(|line| line == "f 1 2 3"));
}

#[test]
fn optional_channels_stay_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "plain.obj");
    fs::write(&path, "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\nf 1 2 3\nf 2 4 3\n").unwrap();

    let mesh = read_mesh(&path).unwrap();
    assert_eq!(mesh.normal_count(), 0);
    assert_eq!(mesh.tex_coord_count(), 0);
    assert!(mesh.normals.is_empty());
    assert!(mesh.tex_coords.is_empty());
    assert!(mesh.face_vertex_normal_indices.is_empty());
    assert!(mesh.face_vertex_tex_coord_indices.is_empty());
}

#[test]
fn empty_obj_file_reads_as_empty_mesh() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "empty.obj");
    fs::write(&path, "").unwrap();

    let mesh = read_mesh(&path).unwrap();
    assert_eq!(mesh.vertex_count(), 0);
    assert_eq!(mesh.face_count(), 0);
    assert!(mesh.is_empty());
}

#[test]
fn config_file_drives_strict_reads_and_binary_writes() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = temp_path(&dir, "mesh_io.toml");
    fs::write(
        &config_path,
        "[read]\nstrict = true\n\n[write]\nstl_encoding = \"binary\"\n",
    )
    .unwrap();
    let config = IoConfig::load(&config_path).unwrap();

    let broken = temp_path(&dir, "broken.off");
    fs::write(&broken, "OFF\n3 1 0\n0 0 0\n1 0 0\n0 1 0\n3 0 1 9\n").unwrap();
    assert!(read_mesh_with(&broken, &ReadOptions::default()).is_ok());
    let err = read_mesh_with(&broken, &config.read).unwrap_err();
    assert!(matches!(err, MeshIoError::Validation { .. }));

    let stl = temp_path(&dir, "tri.stl");
    let triangle = MeshBuffers {
        positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
        ..MeshBuffers::default()
    };
    write_mesh_with(&stl, &triangle, &config.write).unwrap();
    assert_eq!(fs::metadata(&stl).unwrap().len(), 84 + 50);
}

#[test]
fn format_errors_name_the_file_and_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "bad.obj");
    fs::write(&path, "v 0 0 0\nv 1 0\n").unwrap();

    let err = read_mesh(&path).unwrap_err();
    assert_eq!(err.line(), Some(2));
    let message = err.to_string();
    assert!(message.contains("bad.obj:2:"), "{}", message);
    assert!(message.contains("expected 3 components, found 2"), "{}", message);
}

#[test]
fn inconsistent_buffers_are_refused_before_touching_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "never.obj");
    let mut mesh = positions_and_faces(&mixed_mesh());
    mesh.face_sizes[0] = 5;

    let err = write_mesh(&path, &mesh).unwrap_err();
    assert!(matches!(err, MeshIoError::InvalidLayout(_)));
    assert!(!path.exists());
}
