//! OFF File Format Support
//!
//! Object File Format - simple format for polygonal meshes.
//!
//! ```text
//! OFF
//! vertex_count face_count edge_count
//! x y z                      (one line per vertex)
//! n i0 i1 ... i(n-1)         (one line per face, 0-based indices)
//! a b                        (optional edge pairs)
//! ```
//!
//! Face valences are not known until every face line has been read, so the
//! face block is scanned twice: once to size the index array, then again
//! from a saved stream position to fill it.

use std::io::{self, BufRead, Seek, Write};
use std::path::Path;

use crate::buffers::{alloc_exact, MeshBuffers};
use crate::command::parse_reals;
use crate::error::{report_issues, MeshIoError, Result};
use crate::line_source::{Line, LineSource};
use crate::options::{ReadOptions, WriteOptions};

use super::{read_file, short_read, write_file, write_reals, STREAM_ORIGIN};

/// Read mesh from OFF file
pub fn read_off(path: impl AsRef<Path>) -> Result<MeshBuffers> {
    read_off_with(path, &ReadOptions::default())
}

pub fn read_off_with(path: impl AsRef<Path>, options: &ReadOptions) -> Result<MeshBuffers> {
    read_file(path.as_ref(), |reader, origin| parse_off(reader, origin, options))
}

/// Parses OFF text from any seekable stream.
pub fn parse_off<R: BufRead + Seek>(reader: R, origin: &str, options: &ReadOptions) -> Result<MeshBuffers> {
    log::info!("read OFF file: {}", origin);
    let mut source = LineSource::new(reader, origin)?;

    // Parse header
    let header = source
        .next_line()?
        .ok_or_else(|| MeshIoError::format(origin, 0, "OFF header not found"))?;
    if !header.text.contains("OFF") {
        return Err(MeshIoError::format(
            origin,
            header.number,
            format!("unrecognised OFF header '{}'", header.text),
        ));
    }

    // Parse counts
    let header_line = header.number;
    let counts = source
        .next_line()?
        .ok_or_else(|| MeshIoError::format(origin, header_line, "OFF element counts not found"))?;
    let (n_vertices, n_faces, n_edges) = parse_counts(counts.text)
        .ok_or_else(|| MeshIoError::format(origin, counts.number, "invalid counts line"))?;

    log::debug!(
        "{}: {} vertices, {} faces, {} edges",
        origin,
        n_vertices,
        n_faces,
        n_edges
    );

    let n_values = n_vertices.checked_mul(3).ok_or_else(|| {
        MeshIoError::format(
            origin,
            counts.number,
            format!("vertex count {} is too large", n_vertices),
        )
    })?;
    let mut mesh = MeshBuffers {
        positions: alloc_exact(n_values, "position values", origin)?,
        face_sizes: alloc_exact(n_faces, "face sizes", origin)?,
        ..MeshBuffers::default()
    };

    // Parse vertices
    for i in 0..n_vertices {
        let last = source.line_number();
        let line = source.next_line()?.ok_or_else(|| {
            MeshIoError::format(
                origin,
                last,
                format!("expected {} vertices, found {}", n_vertices, i),
            )
        })?;
        let xyz = parse_reals::<3>(line.text)
            .map_err(|found| short_read(origin, line.number, "vertex", i, 3, found))?;
        mesh.positions.extend_from_slice(&xyz);
    }

    // First face scan: valences only
    let faces_start = source.mark()?;
    let mut total_indices = 0usize;
    for f in 0..n_faces {
        let line = next_face_line(&mut source, origin, f, n_faces)?;
        let valence = line
            .text
            .split_whitespace()
            .next()
            .and_then(|t| t.parse::<u32>().ok())
            .ok_or_else(|| {
                MeshIoError::format(origin, line.number, format!("face {}: invalid vertex count", f))
            })?;
        mesh.face_sizes.push(valence);
        total_indices += valence as usize;
    }

    if n_faces > 0 && total_indices == 0 {
        return Err(MeshIoError::format(
            origin,
            source.line_number(),
            "face section present but no indices found",
        ));
    }

    // Second face scan: indices
    mesh.face_vertex_indices = alloc_exact(total_indices, "face vertex indices", origin)?;
    source.restore(faces_start)?;
    for f in 0..n_faces {
        let line = next_face_line(&mut source, origin, f, n_faces)?;
        let expected = mesh.face_sizes[f] as usize;
        let mut tokens = line.text.split_whitespace().skip(1);

        for j in 0..expected {
            let index = tokens
                .next()
                .ok_or_else(|| {
                    MeshIoError::format(
                        origin,
                        line.number,
                        format!("face {}: expected {} vertex indices, found {}", f, expected, j),
                    )
                })?
                .parse::<u32>()
                .map_err(|_| {
                    MeshIoError::format(origin, line.number, format!("face {}: invalid vertex index", f))
                })?;
            mesh.face_vertex_indices.push(index);
        }
    }

    report_issues(origin, mesh.validate(), options.strict)?;
    Ok(mesh)
}

fn parse_counts(text: &str) -> Option<(usize, usize, usize)> {
    let mut values = text.split_whitespace().map(|t| t.parse::<usize>());
    let n_vertices = values.next()?.ok()?;
    let n_faces = values.next()?.ok()?;
    let n_edges = match values.next() {
        Some(edges) => edges.ok()?,
        None => 0,
    };
    Some((n_vertices, n_faces, n_edges))
}

fn next_face_line<'a, R: BufRead + Seek>(
    source: &'a mut LineSource<R>,
    origin: &str,
    face: usize,
    n_faces: usize,
) -> Result<Line<'a>> {
    let last = source.line_number();
    source.next_line()?.ok_or_else(|| {
        MeshIoError::format(
            origin,
            last,
            format!("expected {} faces, found {}", n_faces, face),
        )
    })
}

/// Write mesh to OFF file
pub fn write_off(path: impl AsRef<Path>, mesh: &MeshBuffers) -> Result<()> {
    write_off_with(path, mesh, &WriteOptions::default())
}

pub fn write_off_with(path: impl AsRef<Path>, mesh: &MeshBuffers, options: &WriteOptions) -> Result<()> {
    write_off_with_edges(path, mesh, &[], options)
}

/// Writes an OFF file followed by `edges`, a flat `[a0, b0, a1, b1, ...]` pair list.
pub fn write_off_with_edges(
    path: impl AsRef<Path>,
    mesh: &MeshBuffers,
    edges: &[u32],
    options: &WriteOptions,
) -> Result<()> {
    let path = path.as_ref();
    log::info!("write OFF file: {}", path.display());
    check_edges(mesh, edges)?;
    write_file(path, |writer| emit_off(writer, mesh, edges, options))
}

pub fn serialize_off<W: Write>(writer: W, mesh: &MeshBuffers, options: &WriteOptions) -> Result<()> {
    serialize_off_with_edges(writer, mesh, &[], options)
}

pub fn serialize_off_with_edges<W: Write>(
    mut writer: W,
    mesh: &MeshBuffers,
    edges: &[u32],
    options: &WriteOptions,
) -> Result<()> {
    check_edges(mesh, edges)?;
    emit_off(&mut writer, mesh, edges, options).map_err(|e| MeshIoError::io(STREAM_ORIGIN, e))
}

fn check_edges(mesh: &MeshBuffers, edges: &[u32]) -> Result<()> {
    mesh.check_layout()?;
    if edges.len() % 2 != 0 {
        return Err(MeshIoError::InvalidLayout(format!(
            "edge list length {} is not a multiple of 2",
            edges.len()
        )));
    }
    Ok(())
}

fn emit_off<W: Write>(writer: &mut W, mesh: &MeshBuffers, edges: &[u32], options: &WriteOptions) -> io::Result<()> {
    writeln!(writer, "OFF")?;
    writeln!(
        writer,
        "{} {} {}",
        mesh.vertex_count(),
        mesh.face_count(),
        edges.len() / 2
    )?;

    for xyz in mesh.positions.chunks_exact(3) {
        write_reals(writer, xyz, options.precision)?;
        writeln!(writer)?;
    }

    for face in mesh.faces() {
        write!(writer, "{}", face.len())?;
        for &index in &mesh.face_vertex_indices[face.slots] {
            write!(writer, " {}", index)?;
        }
        writeln!(writer)?;
    }

    for pair in edges.chunks_exact(2) {
        writeln!(writer, "{} {}", pair[0], pair[1])?;
    }

    Ok(())
}
