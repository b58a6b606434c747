//! # IO Module - File Import/Export
//!
//! Reads and writes [`MeshBuffers`] in these formats:
//! - OBJ (Wavefront)
//! - OFF (Object File Format)
//! - STL (STereoLithography, ASCII and binary)
//! - PLY (Polygon File Format, ASCII and binary)
//!
//! Every format exposes the same entry points: `read_*`/`read_*_with` for
//! files, `parse_*` for any seekable stream, `write_*`/`write_*_with` for
//! files and `serialize_*` for any writer.

pub mod obj;
pub mod off;
pub mod ply;
pub mod stl;

pub use obj::{parse_obj, read_obj, read_obj_with, serialize_obj, write_obj, write_obj_with};
pub use off::{
    parse_off, read_off, read_off_with, serialize_off, serialize_off_with_edges, write_off,
    write_off_with, write_off_with_edges,
};
pub use ply::{parse_ply, read_ply, read_ply_with, serialize_ply, write_ply, write_ply_with, PlyEncoding};
pub use stl::{parse_stl, read_stl, read_stl_with, serialize_stl, write_stl, write_stl_with, StlEncoding};

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use crate::buffers::MeshBuffers;
use crate::error::{MeshIoError, Result};
use crate::options::{ReadOptions, WriteOptions};

/// Origin used in diagnostics for in-memory writers.
pub(crate) const STREAM_ORIGIN: &str = "<stream>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshFormat {
    Obj,
    Off,
    Stl,
    Ply,
}

impl MeshFormat {
    /// Detects the format from the file extension (case-insensitive).
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_lowercase();

        match ext.as_str() {
            "obj" => Some(MeshFormat::Obj),
            "off" => Some(MeshFormat::Off),
            "stl" => Some(MeshFormat::Stl),
            "ply" => Some(MeshFormat::Ply),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            MeshFormat::Obj => "obj",
            MeshFormat::Off => "off",
            MeshFormat::Stl => "stl",
            MeshFormat::Ply => "ply",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MeshFormat::Obj => "OBJ",
            MeshFormat::Off => "OFF",
            MeshFormat::Stl => "STL",
            MeshFormat::Ply => "PLY",
        }
    }
}

/// Detect file format from extension
pub fn detect_format(path: impl AsRef<Path>) -> Option<MeshFormat> {
    MeshFormat::from_path(path)
}

fn require_format(path: &Path) -> Result<MeshFormat> {
    detect_format(path).ok_or_else(|| MeshIoError::UnsupportedFormat(path.display().to_string()))
}

/// Read mesh file (format chosen from the extension)
pub fn read_mesh(path: impl AsRef<Path>) -> Result<MeshBuffers> {
    read_mesh_with(path, &ReadOptions::default())
}

pub fn read_mesh_with(path: impl AsRef<Path>, options: &ReadOptions) -> Result<MeshBuffers> {
    let path = path.as_ref();
    match require_format(path)? {
        MeshFormat::Obj => read_obj_with(path, options),
        MeshFormat::Off => read_off_with(path, options),
        MeshFormat::Stl => read_stl_with(path, options),
        MeshFormat::Ply => read_ply_with(path, options),
    }
}

/// Write mesh file (format chosen from the extension)
pub fn write_mesh(path: impl AsRef<Path>, mesh: &MeshBuffers) -> Result<()> {
    write_mesh_with(path, mesh, &WriteOptions::default())
}

pub fn write_mesh_with(path: impl AsRef<Path>, mesh: &MeshBuffers, options: &WriteOptions) -> Result<()> {
    let path = path.as_ref();
    match require_format(path)? {
        MeshFormat::Obj => write_obj_with(path, mesh, options),
        MeshFormat::Off => write_off_with(path, mesh, options),
        MeshFormat::Stl => write_stl_with(path, mesh, options),
        MeshFormat::Ply => write_ply_with(path, mesh, options),
    }
}

/// Opens `path` for buffered reading and hands it to `parse` with its display name.
pub(crate) fn read_file<T>(
    path: &Path,
    parse: impl FnOnce(BufReader<File>, &str) -> Result<T>,
) -> Result<T> {
    let origin = path.display().to_string();
    let file = File::open(path).map_err(|e| MeshIoError::io(&origin, e))?;
    parse(BufReader::new(file), &origin)
}

/// Creates (or truncates) `path`, runs `emit` over a buffered writer and flushes.
pub(crate) fn write_file(
    path: &Path,
    emit: impl FnOnce(&mut BufWriter<File>) -> io::Result<()>,
) -> Result<()> {
    let origin = path.display().to_string();
    let file = File::create(path).map_err(|e| MeshIoError::io(&origin, e))?;
    let mut writer = BufWriter::new(file);
    emit(&mut writer)
        .and_then(|_| writer.flush())
        .map_err(|e| MeshIoError::io(&origin, e))
}

/// Error for an element line carrying fewer numbers than its kind requires.
pub(crate) fn short_read(
    origin: &str,
    line: usize,
    what: &str,
    index: usize,
    expected: usize,
    found: usize,
) -> MeshIoError {
    MeshIoError::format(
        origin,
        line,
        format!(
            "{} {}: expected {} components, found {}",
            what, index, expected, found
        ),
    )
}

/// Writes a real number, either in shortest round-trip form or with fixed decimals.
pub(crate) fn write_real<W: Write>(writer: &mut W, value: f64, precision: Option<usize>) -> io::Result<()> {
    match precision {
        Some(decimals) => write!(writer, "{:.*}", decimals, value),
        None => write!(writer, "{}", value),
    }
}

/// Writes `values` separated by single spaces.
pub(crate) fn write_reals<W: Write>(writer: &mut W, values: &[f64], precision: Option<usize>) -> io::Result<()> {
    for (i, &value) in values.iter().enumerate() {
        if i > 0 {
            writer.write_all(b" ")?;
        }
        write_real(writer, value, precision)?;
    }
    Ok(())
}
