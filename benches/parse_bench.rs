//! Parse/Serialize Benchmark

use std::io::Cursor;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rustmesh_io::{
    parse_obj, parse_off, parse_ply, parse_stl, serialize_obj, serialize_off, serialize_ply, serialize_stl,
    MeshBuffers, PlyEncoding, ReadOptions, StlEncoding, WriteOptions,
};

/// `n x n` grid of quads over the unit square.
fn grid(n: u32) -> MeshBuffers {
    let mut positions = Vec::new();
    for j in 0..=n {
        for i in 0..=n {
            positions.extend_from_slice(&[i as f64 / n as f64, j as f64 / n as f64, 0.0]);
        }
    }

    let mut face_vertex_indices = Vec::new();
    for j in 0..n {
        for i in 0..n {
            let v = j * (n + 1) + i;
            face_vertex_indices.extend_from_slice(&[v, v + 1, v + n + 2, v + n + 1]);
        }
    }

    MeshBuffers::from_polygons(positions, vec![4; (n * n) as usize], face_vertex_indices)
}

/// The grid split into two triangles per quad, as an unindexed soup for STL.
fn soup(mesh: &MeshBuffers) -> MeshBuffers {
    let mut positions = Vec::with_capacity(mesh.face_count() * 18);
    for quad in mesh.face_vertex_indices.chunks_exact(4) {
        for corner in [quad[0], quad[1], quad[2], quad[0], quad[2], quad[3]] {
            let at = corner as usize * 3;
            positions.extend_from_slice(&mesh.positions[at..at + 3]);
        }
    }
    MeshBuffers {
        positions,
        ..MeshBuffers::default()
    }
}

fn serialized(mesh: &MeshBuffers, write: impl Fn(&mut Vec<u8>, &MeshBuffers)) -> Vec<u8> {
    let mut out = Vec::new();
    write(&mut out, mesh);
    out
}

fn bench_parse(c: &mut Criterion) {
    let mesh = grid(100);
    let triangles = soup(&mesh);
    let read = ReadOptions::default();
    let write = WriteOptions::default();
    let binary = WriteOptions {
        stl_encoding: StlEncoding::Binary,
        ply_encoding: PlyEncoding::BinaryLittleEndian,
        ..WriteOptions::default()
    };

    let obj = serialized(&mesh, |out, m| serialize_obj(out, m, &write).unwrap());
    let off = serialized(&mesh, |out, m| serialize_off(out, m, &write).unwrap());
    let stl_ascii = serialized(&triangles, |out, m| serialize_stl(out, m, &write).unwrap());
    let stl_binary = serialized(&triangles, |out, m| serialize_stl(out, m, &binary).unwrap());
    let ply_binary = serialized(&mesh, |out, m| serialize_ply(out, m, &binary).unwrap());

    c.bench_function("parse_obj_grid_100", |b| {
        b.iter(|| parse_obj(Cursor::new(black_box(&obj)), "grid.obj", &read).unwrap())
    });
    c.bench_function("parse_off_grid_100", |b| {
        b.iter(|| parse_off(Cursor::new(black_box(&off)), "grid.off", &read).unwrap())
    });
    c.bench_function("parse_stl_ascii_grid_100", |b| {
        b.iter(|| parse_stl(Cursor::new(black_box(&stl_ascii)), "grid.stl", &read).unwrap())
    });
    c.bench_function("parse_stl_binary_grid_100", |b| {
        b.iter(|| parse_stl(Cursor::new(black_box(&stl_binary)), "grid.stl", &read).unwrap())
    });
    c.bench_function("parse_ply_binary_grid_100", |b| {
        b.iter(|| parse_ply(Cursor::new(black_box(&ply_binary)), "grid.ply", &read).unwrap())
    });
}

fn bench_serialize(c: &mut Criterion) {
    let mesh = grid(100);
    let triangles = soup(&mesh);
    let write = WriteOptions::default();

    c.bench_function("serialize_obj_grid_100", |b| {
        b.iter(|| {
            let mut out = Vec::new();
            serialize_obj(&mut out, black_box(&mesh), &write).unwrap();
            out
        })
    });
    c.bench_function("serialize_off_grid_100", |b| {
        b.iter(|| {
            let mut out = Vec::new();
            serialize_off(&mut out, black_box(&mesh), &write).unwrap();
            out
        })
    });
    c.bench_function("serialize_stl_grid_100", |b| {
        b.iter(|| {
            let mut out = Vec::new();
            serialize_stl(&mut out, black_box(&triangles), &write).unwrap();
            out
        })
    });
}

criterion_group!(benches, bench_parse, bench_serialize);
criterion_main!(benches);
