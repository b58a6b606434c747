//! PLY File Format Support
//!
//! Stanford PLY (Polygon File Format) supports both ASCII and binary formats.
//!
//! Reading walks the element stream once: `vertex` records supply `x y z`,
//! `face` records supply the `vertex_indices` (or `vertex_index`) list, and
//! every other element is read and dropped. Writing emits positions and faces
//! only.

pub mod codec;

pub use codec::PlyEncoding;

use std::io::{self, BufRead, Seek, Write};
use std::path::Path;

use crate::buffers::{alloc_exact, MeshBuffers};
use crate::error::{report_issues, MeshIoError, Result, ValidationIssue};
use crate::options::{ReadOptions, WriteOptions};

use self::codec::{ElementDef, ElementReader, ElementWriter, PlyHeader, PropertyKind, ScalarType};
use super::{read_file, write_file, STREAM_ORIGIN};

const FACE_LIST_NAMES: [&str; 2] = ["vertex_indices", "vertex_index"];
const FACE_COUNT_TYPE: ScalarType = ScalarType::UInt8;
const FACE_INDEX_TYPE: ScalarType = ScalarType::Int32;

/// What the reader does with the records of one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElementRole {
    Vertex { x: usize, y: usize, z: usize },
    Face { list: usize },
    Skip,
}

/// Read mesh from PLY file (ASCII or binary)
pub fn read_ply(path: impl AsRef<Path>) -> Result<MeshBuffers> {
    read_ply_with(path, &ReadOptions::default())
}

pub fn read_ply_with(path: impl AsRef<Path>, options: &ReadOptions) -> Result<MeshBuffers> {
    read_file(path.as_ref(), |reader, origin| parse_ply(reader, origin, options))
}

/// Parses a PLY stream. The body is read in a single forward pass.
pub fn parse_ply<R: BufRead + Seek>(reader: R, origin: &str, options: &ReadOptions) -> Result<MeshBuffers> {
    log::info!("read PLY file: {}", origin);
    let mut elements = ElementReader::new(reader, origin)?;
    let header = elements.header();

    log::debug!(
        "{}: {} body, elements: {}",
        origin,
        header.encoding.keyword(),
        header
            .elements
            .iter()
            .map(|e| format!("{} {}", e.name, e.count))
            .collect::<Vec<_>>()
            .join(", ")
    );
    for comment in &header.comments {
        log::debug!("{}: comment {}", origin, comment);
    }
    for info in &header.obj_info {
        log::debug!("{}: obj_info {}", origin, info);
    }

    let roles = header
        .elements
        .iter()
        .map(|element| element_role(element, origin))
        .collect::<Result<Vec<_>>>()?;

    let too_large = |what: &str| MeshIoError::format(origin, 0, format!("{} element count is too large", what));
    let vertex_count = count_for(header.elements.as_slice(), &roles, |r| matches!(r, ElementRole::Vertex { .. }))
        .ok_or_else(|| too_large("vertex"))?;
    let face_count = count_for(header.elements.as_slice(), &roles, |r| matches!(r, ElementRole::Face { .. }))
        .ok_or_else(|| too_large("face"))?;
    let position_values = vertex_count.checked_mul(3).ok_or_else(|| too_large("vertex"))?;
    let face_index_hint = face_count.checked_mul(3).ok_or_else(|| too_large("face"))?;

    let mut mesh = MeshBuffers {
        positions: alloc_exact(position_values, "position values", origin)?,
        face_sizes: alloc_exact(face_count, "face sizes", origin)?,
        face_vertex_indices: alloc_exact(face_index_hint, "face vertex indices", origin)?,
        ..MeshBuffers::default()
    };

    let mut issues = Vec::new();
    let mut record = Vec::new();
    while let Some(element) = elements.next_record(&mut record)? {
        match roles[element] {
            ElementRole::Vertex { x, y, z } => {
                for slot in [x, y, z] {
                    let value = record[slot].as_scalar().unwrap_or_default();
                    mesh.positions.push(value as f32 as f64);
                }
            }
            ElementRole::Face { list } => {
                let indices = record[list].as_list().unwrap_or_default();
                let size = u32::try_from(indices.len()).map_err(|_| {
                    MeshIoError::format(origin, 0, format!("face {} is too large", mesh.face_count()))
                })?;
                for &raw in indices {
                    let slot = mesh.face_vertex_indices.len();
                    let index = if raw >= 0.0 && (raw as usize) < vertex_count {
                        raw as u32
                    } else {
                        issues.push(ValidationIssue::IndexOutOfRange {
                            channel: "vertex",
                            slot,
                            index: raw as i64,
                            count: vertex_count,
                        });
                        0
                    };
                    mesh.face_vertex_indices.push(index);
                }
                mesh.face_sizes.push(size);
            }
            ElementRole::Skip => {}
        }
    }
    mesh.face_vertex_indices.shrink_to_fit();

    if !issues.is_empty() {
        log::warn!(
            "{}: {} out-of-range vertex indices clamped to 0",
            origin,
            issues.len()
        );
    }
    issues.extend(mesh.validate());
    report_issues(origin, issues, options.strict)?;
    Ok(mesh)
}

fn element_role(element: &ElementDef, origin: &str) -> Result<ElementRole> {
    let missing = |what: &str| {
        MeshIoError::format(
            origin,
            0,
            format!("element '{}' has no usable {} property", element.name, what),
        )
    };
    let scalar = |name: &str| match element.property(name) {
        Some((slot, property)) if matches!(property.kind, PropertyKind::Scalar(_)) => Ok(slot),
        _ => Err(missing(name)),
    };

    match element.name.as_str() {
        "vertex" => Ok(ElementRole::Vertex {
            x: scalar("x")?,
            y: scalar("y")?,
            z: scalar("z")?,
        }),
        "face" => FACE_LIST_NAMES
            .iter()
            .find_map(|name| element.property(name))
            .filter(|(_, property)| matches!(property.kind, PropertyKind::List { .. }))
            .map(|(list, _)| ElementRole::Face { list })
            .ok_or_else(|| missing("vertex_indices")),
        other => {
            log::debug!("{}: skipping element '{}'", origin, other);
            Ok(ElementRole::Skip)
        }
    }
}

/// Total record count of the elements playing a role, `None` on overflow.
fn count_for(elements: &[ElementDef], roles: &[ElementRole], wanted: impl Fn(&ElementRole) -> bool) -> Option<usize> {
    elements
        .iter()
        .zip(roles)
        .filter(|(_, role)| wanted(role))
        .try_fold(0usize, |total, (element, _)| total.checked_add(element.count))
}

/// Write mesh to PLY file
pub fn write_ply(path: impl AsRef<Path>, mesh: &MeshBuffers) -> Result<()> {
    write_ply_with(path, mesh, &WriteOptions::default())
}

pub fn write_ply_with(path: impl AsRef<Path>, mesh: &MeshBuffers, options: &WriteOptions) -> Result<()> {
    let path = path.as_ref();
    log::info!("write PLY file: {}", path.display());
    check_ply(mesh)?;
    write_file(path, |writer| emit_ply(writer, mesh, options))
}

pub fn serialize_ply<W: Write>(mut writer: W, mesh: &MeshBuffers, options: &WriteOptions) -> Result<()> {
    check_ply(mesh)?;
    emit_ply(&mut writer, mesh, options).map_err(|e| MeshIoError::io(STREAM_ORIGIN, e))
}

fn check_ply(mesh: &MeshBuffers) -> Result<()> {
    mesh.check_layout()?;

    if let Some(face) = mesh.faces().find(|f| f.len() as f64 > FACE_COUNT_TYPE.max_value()) {
        return Err(MeshIoError::InvalidLayout(format!(
            "face {} has {} vertices, PLY faces are limited to {}",
            face.face,
            face.len(),
            FACE_COUNT_TYPE.max_value()
        )));
    }
    if let Some(&index) = mesh
        .face_vertex_indices
        .iter()
        .find(|&&i| i as f64 > FACE_INDEX_TYPE.max_value())
    {
        return Err(MeshIoError::InvalidLayout(format!(
            "vertex index {} does not fit a PLY int",
            index
        )));
    }

    if mesh.has_normals() || mesh.has_tex_coords() {
        log::warn!("PLY output carries positions and faces only; normals and texture coordinates are dropped");
    }
    Ok(())
}

fn emit_ply<W: Write>(writer: &mut W, mesh: &MeshBuffers, options: &WriteOptions) -> io::Result<()> {
    let mut header = PlyHeader::new(options.ply_encoding);
    header.comments.extend(options.header_comment.iter().cloned());
    header.elements.push(
        ElementDef::new("vertex", mesh.vertex_count())
            .with_scalar("x", ScalarType::Float32)
            .with_scalar("y", ScalarType::Float32)
            .with_scalar("z", ScalarType::Float32),
    );
    header.elements.push(ElementDef::new("face", mesh.face_count()).with_list(
        FACE_LIST_NAMES[0],
        FACE_COUNT_TYPE,
        FACE_INDEX_TYPE,
    ));

    let mut elements = ElementWriter::new(writer, &header, options.precision)?;

    for xyz in mesh.positions.chunks_exact(3) {
        for &value in xyz {
            elements.put(ScalarType::Float32, value)?;
        }
        elements.end_record()?;
    }

    for face in mesh.faces() {
        let indices = &mesh.face_vertex_indices[face.slots];
        elements.put_list(
            FACE_COUNT_TYPE,
            FACE_INDEX_TYPE,
            indices.iter().map(|&i| i as f64),
        )?;
        elements.end_record()?;
    }

    Ok(())
}
