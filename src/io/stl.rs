//! STL File Format Support
//!
//! STereoLithography format for 3D printing applications.
//!
//! STL stores a triangle soup: every facet carries its own normal and three
//! corner positions, so a read mesh has one normal per facet, no face table,
//! and facet `i` occupies `positions[9 * i..9 * i + 9]`. Writers take the
//! same shape and refuse meshes that carry a face table.
//!
//! Binary layout (little endian):
//! - 80-byte header (ignored)
//! - `u32` triangle count
//! - per triangle: normal `3 x f32`, corners `9 x f32`, `u16` attribute word

use std::io::{self, BufRead, Read, Seek, SeekFrom, Write};
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::buffers::{alloc_exact, MeshBuffers};
use crate::command::{parse_reals, split_keyword, Command};
use crate::error::{report_issues, MeshIoError, Result, ValidationIssue};
use crate::line_source::LineSource;
use crate::options::{ReadOptions, WriteOptions};

use super::{read_file, short_read, write_file, write_reals, STREAM_ORIGIN};

const HEADER_LEN: u64 = 80;
const TRIANGLE_RECORD_LEN: u64 = 50;

/// STL file format variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StlEncoding {
    /// ASCII text format
    #[default]
    Ascii,
    /// Binary format
    Binary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StlCommand {
    Solid,
    FacetNormal,
    OuterLoop,
    Vertex,
    EndLoop,
    EndFacet,
    EndSolid,
}

/// Keyword, optional second keyword, command.
const STL_KEYWORDS: &[(&str, Option<&str>, StlCommand)] = &[
    ("solid", None, StlCommand::Solid),
    ("facet", Some("normal"), StlCommand::FacetNormal),
    ("outer", Some("loop"), StlCommand::OuterLoop),
    ("vertex", None, StlCommand::Vertex),
    ("endloop", None, StlCommand::EndLoop),
    ("endfacet", None, StlCommand::EndFacet),
    ("endsolid", None, StlCommand::EndSolid),
];

impl Command for StlCommand {
    fn classify(line: &str) -> Option<(Self, &str)> {
        let (keyword, args) = split_keyword(line);
        let &(_, second, command) = STL_KEYWORDS
            .iter()
            .find(|(name, _, _)| keyword.eq_ignore_ascii_case(name))?;

        match second {
            None => Some((command, args)),
            Some(expected) => {
                let (word, rest) = split_keyword(args);
                word.eq_ignore_ascii_case(expected).then_some((command, rest))
            }
        }
    }
}

/// Read mesh from STL file (ASCII or binary)
pub fn read_stl(path: impl AsRef<Path>) -> Result<MeshBuffers> {
    read_stl_with(path, &ReadOptions::default())
}

pub fn read_stl_with(path: impl AsRef<Path>, options: &ReadOptions) -> Result<MeshBuffers> {
    read_file(path.as_ref(), |reader, origin| parse_stl(reader, origin, options))
}

/// Parses an STL stream, choosing the ASCII or binary reader from its content.
pub fn parse_stl<R: BufRead + Seek>(mut reader: R, origin: &str, options: &ReadOptions) -> Result<MeshBuffers> {
    log::info!("read STL file: {}", origin);

    let probe = probe_encoding(&mut reader, origin)?;
    match probe {
        None => {
            log::debug!("{}: empty STL stream", origin);
            Ok(MeshBuffers::new())
        }
        Some((StlEncoding::Ascii, _)) => parse_ascii(reader, origin, options),
        Some((StlEncoding::Binary, length)) => parse_binary(reader, origin, length),
    }
}

/// Decides the encoding and measures the stream from its current position.
///
/// A leading `solid` means ASCII, unless the stream length matches the
/// binary layout for the triangle count stored after the 80-byte header.
/// The reader is left where it started. `None` for an empty stream.
fn probe_encoding<R: Read + Seek>(reader: &mut R, origin: &str) -> Result<Option<(StlEncoding, u64)>> {
    let io_err = |e| MeshIoError::io(origin, e);

    let start = reader.stream_position().map_err(io_err)?;
    let end = reader.seek(SeekFrom::End(0)).map_err(io_err)?;
    reader.seek(SeekFrom::Start(start)).map_err(io_err)?;
    let length = end.saturating_sub(start);
    if length == 0 {
        return Ok(None);
    }

    let mut head = Vec::with_capacity(HEADER_LEN as usize + 4);
    reader
        .by_ref()
        .take(HEADER_LEN + 4)
        .read_to_end(&mut head)
        .map_err(io_err)?;
    reader.seek(SeekFrom::Start(start)).map_err(io_err)?;

    let starts_with_solid = head.len() >= 5 && head[..5].eq_ignore_ascii_case(b"solid");
    if !starts_with_solid {
        return Ok(Some((StlEncoding::Binary, length)));
    }

    if head.len() == HEADER_LEN as usize + 4 {
        let count = LittleEndian::read_u32(&head[HEADER_LEN as usize..]) as u64;
        if length == binary_length(count) {
            log::debug!(
                "{}: starts with 'solid' but matches the binary layout for {} triangles",
                origin,
                count
            );
            return Ok(Some((StlEncoding::Binary, length)));
        }
    }
    Ok(Some((StlEncoding::Ascii, length)))
}

fn binary_length(triangles: u64) -> u64 {
    HEADER_LEN + 4 + TRIANGLE_RECORD_LEN * triangles
}

fn parse_ascii<R: BufRead + Seek>(reader: R, origin: &str, options: &ReadOptions) -> Result<MeshBuffers> {
    let mut source = LineSource::new(reader, origin)?;

    // First pass: count facet normals and vertices
    let mut n_normals = 0usize;
    let mut n_vertices = 0usize;
    while let Some(line) = source.next_command::<StlCommand>()? {
        match line.command {
            StlCommand::FacetNormal => n_normals += 1,
            StlCommand::Vertex => n_vertices += 1,
            _ => {}
        }
    }

    log::debug!("{}: {} facet normals, {} vertices", origin, n_normals, n_vertices);

    if n_vertices != 3 * n_normals {
        let issue = ValidationIssue::CountMismatch {
            what: "vertices",
            expected: 3 * n_normals,
            found: n_vertices,
        };
        report_issues(origin, vec![issue], options.strict)?;
    }

    let mut mesh = MeshBuffers {
        positions: alloc_exact(n_vertices * 3, "position values", origin)?,
        normals: alloc_exact(n_normals * 3, "normal values", origin)?,
        ..MeshBuffers::default()
    };

    // Second pass: fill
    source.rewind()?;
    while let Some(line) = source.next_command::<StlCommand>()? {
        match line.command {
            StlCommand::FacetNormal => {
                let index = mesh.normal_count();
                let xyz = parse_reals::<3>(line.args)
                    .map_err(|found| short_read(origin, line.number, "facet normal", index, 3, found))?;
                mesh.normals.extend_from_slice(&xyz);
            }
            StlCommand::Vertex => {
                let index = mesh.vertex_count();
                let xyz = parse_reals::<3>(line.args)
                    .map_err(|found| short_read(origin, line.number, "vertex", index, 3, found))?;
                mesh.positions.extend_from_slice(&xyz);
            }
            StlCommand::Solid
            | StlCommand::OuterLoop
            | StlCommand::EndLoop
            | StlCommand::EndFacet
            | StlCommand::EndSolid => {}
        }
    }

    if mesh.vertex_count() != n_vertices || mesh.normal_count() != n_normals {
        return Err(MeshIoError::format(
            origin,
            source.line_number(),
            "file changed between passes",
        ));
    }

    Ok(mesh)
}

fn parse_binary<R: Read>(mut reader: R, origin: &str, length: u64) -> Result<MeshBuffers> {
    let mut header = [0u8; HEADER_LEN as usize];
    reader
        .read_exact(&mut header)
        .map_err(|e| binary_read_error(origin, e, "header"))?;
    let count = reader
        .read_u32::<LittleEndian>()
        .map_err(|e| binary_read_error(origin, e, "triangle count"))?;

    log::debug!("{}: binary STL with {} triangles", origin, count);

    let expected = binary_length(count as u64);
    if length < expected {
        return Err(MeshIoError::format(
            origin,
            0,
            format!(
                "binary STL declares {} triangles ({} bytes) but only {} bytes are present",
                count, expected, length
            ),
        ));
    }

    let count = count as usize;
    let mut mesh = MeshBuffers {
        positions: alloc_exact(count * 9, "position values", origin)?,
        normals: alloc_exact(count * 3, "normal values", origin)?,
        ..MeshBuffers::default()
    };

    let flagged = read_triangles(&mut reader, count, &mut mesh, origin)?;
    if flagged > 0 {
        log::warn!(
            "{}: {} triangles carry a non-zero attribute word, ignored",
            origin,
            flagged
        );
    }

    Ok(mesh)
}

/// Reads `count` 50-byte facet records into `mesh`.
///
/// Returns how many records had a non-zero attribute word.
fn read_triangles<R: Read>(reader: &mut R, count: usize, mesh: &mut MeshBuffers, origin: &str) -> Result<usize> {
    let mut record = [0u8; TRIANGLE_RECORD_LEN as usize];
    let mut flagged = 0usize;
    for i in 0..count {
        reader
            .read_exact(&mut record)
            .map_err(|e| binary_read_error(origin, e, &format!("triangle {}", i)))?;

        let mut values = [0f32; 12];
        LittleEndian::read_f32_into(&record[..48], &mut values);
        mesh.normals.extend(values[..3].iter().map(|&v| v as f64));
        mesh.positions.extend(values[3..].iter().map(|&v| v as f64));

        if LittleEndian::read_u16(&record[48..]) != 0 {
            flagged += 1;
        }
    }
    Ok(flagged)
}

fn binary_read_error(origin: &str, e: io::Error, what: &str) -> MeshIoError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        MeshIoError::format(origin, 0, format!("binary STL truncated in {}", what))
    } else {
        MeshIoError::io(origin, e)
    }
}

/// Write mesh to STL file
pub fn write_stl(path: impl AsRef<Path>, mesh: &MeshBuffers) -> Result<()> {
    write_stl_with(path, mesh, &WriteOptions::default())
}

pub fn write_stl_with(path: impl AsRef<Path>, mesh: &MeshBuffers, options: &WriteOptions) -> Result<()> {
    let path = path.as_ref();
    log::info!("write STL file: {}", path.display());
    let facets = facet_count(mesh)?;
    write_file(path, |writer| emit_stl(writer, mesh, facets, options))
}

pub fn serialize_stl<W: Write>(mut writer: W, mesh: &MeshBuffers, options: &WriteOptions) -> Result<()> {
    let facets = facet_count(mesh)?;
    emit_stl(&mut writer, mesh, facets, options).map_err(|e| MeshIoError::io(STREAM_ORIGIN, e))
}

/// Number of facets in `mesh`, after checking it is a triangle soup.
fn facet_count(mesh: &MeshBuffers) -> Result<u32> {
    mesh.check_layout()?;

    if mesh.face_count() > 0 {
        return Err(MeshIoError::InvalidLayout(format!(
            "STL stores a triangle soup, but the mesh has a table of {} faces",
            mesh.face_count()
        )));
    }
    if mesh.positions.len() % 9 != 0 {
        return Err(MeshIoError::InvalidLayout(format!(
            "positions length {} is not a multiple of 9 for a triangle soup",
            mesh.positions.len()
        )));
    }

    let facets = mesh.triangle_count();
    u32::try_from(facets)
        .map_err(|_| MeshIoError::InvalidLayout(format!("{} facets do not fit an STL file", facets)))
}

struct Facet {
    normal: DVec3,
    corners: [DVec3; 3],
}

/// Right-hand-rule unit normal, zero for degenerate triangles.
fn facet_normal(corners: &[DVec3; 3]) -> DVec3 {
    (corners[1] - corners[0])
        .cross(corners[2] - corners[0])
        .normalize_or_zero()
}

fn for_each_facet<F>(mesh: &MeshBuffers, mut emit: F) -> io::Result<()>
where
    F: FnMut(&Facet) -> io::Result<()>,
{
    // Stored normals are used only when there is exactly one per facet
    let stored_normals = mesh.normal_count() == mesh.triangle_count();
    for (t, xyz) in mesh.positions.chunks_exact(9).enumerate() {
        let corners = [
            DVec3::from_slice(&xyz[0..3]),
            DVec3::from_slice(&xyz[3..6]),
            DVec3::from_slice(&xyz[6..9]),
        ];
        let normal = mesh
            .normal(t)
            .filter(|_| stored_normals)
            .unwrap_or_else(|| facet_normal(&corners));
        emit(&Facet { normal, corners })?;
    }
    Ok(())
}

fn emit_stl<W: Write>(writer: &mut W, mesh: &MeshBuffers, facets: u32, options: &WriteOptions) -> io::Result<()> {
    match options.stl_encoding {
        StlEncoding::Ascii => emit_ascii(writer, mesh, options),
        StlEncoding::Binary => emit_binary(writer, mesh, facets, options),
    }
}

fn emit_ascii<W: Write>(writer: &mut W, mesh: &MeshBuffers, options: &WriteOptions) -> io::Result<()> {
    let precision = options.precision;
    writeln!(writer, "solid {}", options.solid_name)?;

    for_each_facet(mesh, |facet| {
        writer.write_all(b"  facet normal ")?;
        write_reals(writer, &facet.normal.to_array(), precision)?;
        writeln!(writer)?;
        writeln!(writer, "    outer loop")?;
        for corner in &facet.corners {
            writer.write_all(b"      vertex ")?;
            write_reals(writer, &corner.to_array(), precision)?;
            writeln!(writer)?;
        }
        writeln!(writer, "    endloop")?;
        writeln!(writer, "  endfacet")
    })?;

    writeln!(writer, "endsolid {}", options.solid_name)
}

fn emit_binary<W: Write>(writer: &mut W, mesh: &MeshBuffers, facets: u32, options: &WriteOptions) -> io::Result<()> {
    let mut header = [0u8; HEADER_LEN as usize];
    if let Some(comment) = &options.header_comment {
        let bytes = comment.as_bytes();
        let n = bytes.len().min(header.len());
        header[..n].copy_from_slice(&bytes[..n]);
    }
    writer.write_all(&header)?;
    writer.write_u32::<LittleEndian>(facets)?;

    for_each_facet(mesh, |facet| {
        for v in facet.normal.to_array() {
            writer.write_f32::<LittleEndian>(v as f32)?;
        }
        for corner in &facet.corners {
            for v in corner.to_array() {
                writer.write_f32::<LittleEndian>(v as f32)?;
            }
        }
        writer.write_u16::<LittleEndian>(0)
    })
}
