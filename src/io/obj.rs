//! OBJ File Format Support
//!
//! Wavefront OBJ format is one of the most widely supported mesh formats.
//!
//! Format specification:
//! - v x y z          (vertex position)
//! - vn nx ny nz      (vertex normal)
//! - vt u v           (texture coordinate)
//! - f v1 v2 v3       (face with vertex indices)
//! - f v1/vt1/vn1 v2/vt2/vn2 v3/vt3/vn3 (face with all attributes)
//!
//! Reading takes two passes over the file. The first counts every element
//! kind and records each face's valence; the second fills arrays that were
//! allocated exactly once from those counts.

use std::io::{self, BufRead, Seek, Write};
use std::path::Path;

use crate::buffers::{alloc_exact, MeshBuffers};
use crate::command::{parse_reals, split_keyword, Command};
use crate::error::{report_issues, MeshIoError, Result, ValidationIssue};
use crate::face_token::{resolve_index, FaceToken, FaceTokenShape};
use crate::line_source::LineSource;
use crate::options::{ReadOptions, WriteOptions};

use super::{read_file, short_read, write_file, write_reals, STREAM_ORIGIN};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ObjCommand {
    Vertex,
    Normal,
    TexCoord,
    Face,
}

impl Command for ObjCommand {
    fn classify(line: &str) -> Option<(Self, &str)> {
        let (keyword, args) = split_keyword(line);
        let command = match keyword {
            "v" => ObjCommand::Vertex,
            "vn" => ObjCommand::Normal,
            "vt" => ObjCommand::TexCoord,
            "f" => ObjCommand::Face,
            _ => return None,
        };
        Some((command, args))
    }
}

#[derive(Debug, Default)]
struct ObjCounts {
    vertices: usize,
    normals: usize,
    tex_coords: usize,
    face_indices: usize,
}

/// Read mesh from OBJ file
pub fn read_obj(path: impl AsRef<Path>) -> Result<MeshBuffers> {
    read_obj_with(path, &ReadOptions::default())
}

pub fn read_obj_with(path: impl AsRef<Path>, options: &ReadOptions) -> Result<MeshBuffers> {
    read_file(path.as_ref(), |reader, origin| parse_obj(reader, origin, options))
}

/// Parses OBJ text from any seekable stream.
pub fn parse_obj<R: BufRead + Seek>(reader: R, origin: &str, options: &ReadOptions) -> Result<MeshBuffers> {
    log::info!("read OBJ file: {}", origin);
    let mut source = LineSource::new(reader, origin)?;

    // First pass: count elements and record face valences
    let mut counts = ObjCounts::default();
    let mut face_sizes: Vec<u32> = Vec::new();
    let mut first_face_line = 0;

    while let Some(line) = source.next_command::<ObjCommand>()? {
        match line.command {
            ObjCommand::Vertex => counts.vertices += 1,
            ObjCommand::Normal => counts.normals += 1,
            ObjCommand::TexCoord => counts.tex_coords += 1,
            ObjCommand::Face => {
                if face_sizes.is_empty() {
                    first_face_line = line.number;
                }
                let valence = line.args.split_whitespace().count();
                let valence = u32::try_from(valence).map_err(|_| {
                    MeshIoError::format(origin, line.number, "face has too many vertices")
                })?;
                face_sizes.push(valence);
                counts.face_indices += valence as usize;
            }
        }
    }
    face_sizes.shrink_to_fit();

    log::debug!(
        "{}: {} vertices, {} normals, {} texture coordinates, {} faces, {} face indices",
        origin,
        counts.vertices,
        counts.normals,
        counts.tex_coords,
        face_sizes.len(),
        counts.face_indices
    );

    if !face_sizes.is_empty() && counts.face_indices == 0 {
        return Err(MeshIoError::format(
            origin,
            first_face_line,
            "face section present but no indices found",
        ));
    }

    let mut mesh = MeshBuffers {
        positions: alloc_exact(counts.vertices * 3, "position values", origin)?,
        normals: alloc_exact(counts.normals * 3, "normal values", origin)?,
        tex_coords: alloc_exact(counts.tex_coords * 2, "texture coordinate values", origin)?,
        face_vertex_indices: alloc_exact(counts.face_indices, "face vertex indices", origin)?,
        face_vertex_tex_coord_indices: if counts.tex_coords > 0 {
            alloc_exact(counts.face_indices, "face texture coordinate indices", origin)?
        } else {
            Vec::new()
        },
        face_vertex_normal_indices: if counts.normals > 0 {
            alloc_exact(counts.face_indices, "face normal indices", origin)?
        } else {
            Vec::new()
        },
        face_sizes,
    };

    // Second pass: fill
    source.rewind()?;
    let mut issues = Vec::new();
    let mut face = 0;

    while let Some(line) = source.next_command::<ObjCommand>()? {
        match line.command {
            ObjCommand::Vertex => {
                let index = mesh.vertex_count();
                let xyz = parse_reals::<3>(line.args)
                    .map_err(|found| short_read(origin, line.number, "vertex", index, 3, found))?;
                mesh.positions.extend_from_slice(&xyz);
            }
            ObjCommand::Normal => {
                let index = mesh.normal_count();
                let xyz = parse_reals::<3>(line.args)
                    .map_err(|found| short_read(origin, line.number, "normal", index, 3, found))?;
                mesh.normals.extend_from_slice(&xyz);
            }
            ObjCommand::TexCoord => {
                let index = mesh.tex_coord_count();
                let uv = parse_reals::<2>(line.args).map_err(|found| {
                    short_read(origin, line.number, "texture coordinate", index, 2, found)
                })?;
                mesh.tex_coords.extend_from_slice(&uv);
            }
            ObjCommand::Face => {
                let expected = mesh.face_sizes.get(face).copied().ok_or_else(|| {
                    MeshIoError::format(origin, line.number, "more faces than found while counting")
                })?;
                let found = line.args.split_whitespace().count();
                if found != expected as usize {
                    return Err(MeshIoError::format(
                        origin,
                        line.number,
                        format!("face {}: expected {} vertices, found {}", face, expected, found),
                    ));
                }

                let mut missing_tex_coord = false;
                let mut missing_normal = false;

                for text in line.args.split_whitespace() {
                    let token = FaceToken::parse(text).map_err(|e| {
                        MeshIoError::format(origin, line.number, format!("face {}: '{}': {}", face, text, e))
                    })?;
                    let unresolved = |channel: &str, raw: i64| {
                        MeshIoError::format(
                            origin,
                            line.number,
                            format!("face {}: {} index {} does not resolve", face, channel, raw),
                        )
                    };

                    let v = resolve_index(token.vertex, mesh.vertex_count())
                        .ok_or_else(|| unresolved("vertex", token.vertex))?;
                    mesh.face_vertex_indices.push(v);

                    if counts.tex_coords > 0 {
                        let vt = match token.tex_coord {
                            Some(raw) => resolve_index(raw, mesh.tex_coord_count())
                                .ok_or_else(|| unresolved("texture coordinate", raw))?,
                            None => {
                                missing_tex_coord = true;
                                0
                            }
                        };
                        mesh.face_vertex_tex_coord_indices.push(vt);
                    }

                    if counts.normals > 0 {
                        let vn = match token.normal {
                            Some(raw) => resolve_index(raw, mesh.normal_count())
                                .ok_or_else(|| unresolved("normal", raw))?,
                            None => {
                                missing_normal = true;
                                0
                            }
                        };
                        mesh.face_vertex_normal_indices.push(vn);
                    }
                }

                if missing_tex_coord {
                    issues.push(ValidationIssue::MissingChannelIndex {
                        channel: "texture coordinate",
                        face,
                    });
                }
                if missing_normal {
                    issues.push(ValidationIssue::MissingChannelIndex {
                        channel: "normal",
                        face,
                    });
                }
                face += 1;
            }
        }
    }

    if face != mesh.face_count() || mesh.vertex_count() != counts.vertices {
        return Err(MeshIoError::format(
            origin,
            source.line_number(),
            "file changed between passes",
        ));
    }

    issues.extend(mesh.validate());
    report_issues(origin, issues, options.strict)?;
    Ok(mesh)
}

/// Write mesh to OBJ file
pub fn write_obj(path: impl AsRef<Path>, mesh: &MeshBuffers) -> Result<()> {
    write_obj_with(path, mesh, &WriteOptions::default())
}

pub fn write_obj_with(path: impl AsRef<Path>, mesh: &MeshBuffers, options: &WriteOptions) -> Result<()> {
    let path = path.as_ref();
    log::info!("write OBJ file: {}", path.display());
    mesh.check_layout()?;
    write_file(path, |writer| emit_obj(writer, mesh, options))
}

pub fn serialize_obj<W: Write>(mut writer: W, mesh: &MeshBuffers, options: &WriteOptions) -> Result<()> {
    mesh.check_layout()?;
    emit_obj(&mut writer, mesh, options).map_err(|e| MeshIoError::io(STREAM_ORIGIN, e))
}

fn emit_obj<W: Write>(writer: &mut W, mesh: &MeshBuffers, options: &WriteOptions) -> io::Result<()> {
    let precision = options.precision;

    // Write header
    if let Some(comment) = &options.header_comment {
        writeln!(writer, "# {}", comment)?;
    }
    writeln!(writer, "# Vertices: {}", mesh.vertex_count())?;
    writeln!(writer, "# Faces: {}", mesh.face_count())?;

    for xyz in mesh.positions.chunks_exact(3) {
        writer.write_all(b"v ")?;
        write_reals(writer, xyz, precision)?;
        writeln!(writer)?;
    }

    for xyz in mesh.normals.chunks_exact(3) {
        writer.write_all(b"vn ")?;
        write_reals(writer, xyz, precision)?;
        writeln!(writer)?;
    }

    for uv in mesh.tex_coords.chunks_exact(2) {
        writer.write_all(b"vt ")?;
        write_reals(writer, uv, precision)?;
        writeln!(writer)?;
    }

    let shape = FaceTokenShape::for_mesh(mesh);
    for face in mesh.faces() {
        writer.write_all(b"f")?;
        for slot in face.slots {
            shape.write_slot(writer, mesh, slot)?;
        }
        writeln!(writer)?;
    }

    Ok(())
}
