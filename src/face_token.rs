//! Compound OBJ face-vertex tokens: `v`, `v/vt`, `v//vn` and `v/vt/vn`.

use std::io::{self, Write};

use thiserror::Error;

use crate::buffers::MeshBuffers;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("missing vertex index")]
    MissingVertex,
    #[error("more than three '/'-separated fields")]
    TooManyFields,
    #[error("'{0}' is not an integer index")]
    NotANumber(String),
    #[error("index 0 is invalid, indices start at 1")]
    ZeroIndex,
}

/// Raw indices of one face vertex exactly as written in the file.
///
/// Positive values are 1-based, negative values count back from the most
/// recently defined element. An empty field (the `//` case) is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceToken {
    pub vertex: i64,
    pub tex_coord: Option<i64>,
    pub normal: Option<i64>,
}

impl FaceToken {
    pub fn parse(token: &str) -> Result<Self, TokenError> {
        let mut fields = token.split('/');
        let vertex = parse_field(fields.next())?.ok_or(TokenError::MissingVertex)?;
        let tex_coord = parse_field(fields.next())?;
        let normal = parse_field(fields.next())?;
        if fields.next().is_some() {
            return Err(TokenError::TooManyFields);
        }
        Ok(Self {
            vertex,
            tex_coord,
            normal,
        })
    }
}

fn parse_field(field: Option<&str>) -> Result<Option<i64>, TokenError> {
    match field {
        None | Some("") => Ok(None),
        Some(text) => {
            let value: i64 = text
                .parse()
                .map_err(|_| TokenError::NotANumber(text.to_string()))?;
            if value == 0 {
                return Err(TokenError::ZeroIndex);
            }
            Ok(Some(value))
        }
    }
}

/// Converts a file index into a 0-based array index.
///
/// `defined` is the number of elements of that kind seen so far, which
/// anchors negative (relative) indices. Returns `None` when a relative index
/// reaches before the first element. Absolute indices past `u32::MAX` saturate
/// so that validation reports them as out of range like any other.
pub fn resolve_index(raw: i64, defined: usize) -> Option<u32> {
    if raw > 0 {
        return Some(u32::try_from(raw - 1).unwrap_or(u32::MAX));
    }
    let zero_based = defined as i64 + raw;
    if zero_based < 0 {
        return None;
    }
    u32::try_from(zero_based).ok()
}

/// Face-vertex token layout used when writing a whole mesh.
///
/// The choice is made once per mesh from the channels it carries, never per face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceTokenShape {
    Vertex,
    VertexTexCoord,
    VertexNormal,
    VertexTexCoordNormal,
}

impl FaceTokenShape {
    pub fn for_mesh(mesh: &MeshBuffers) -> Self {
        match (mesh.has_tex_coords(), mesh.has_normals()) {
            (true, true) => FaceTokenShape::VertexTexCoordNormal,
            (true, false) => FaceTokenShape::VertexTexCoord,
            (false, true) => FaceTokenShape::VertexNormal,
            (false, false) => FaceTokenShape::Vertex,
        }
    }

    /// Writes slot `slot` of `mesh` as a 1-based token preceded by a space.
    pub fn write_slot<W: Write>(self, writer: &mut W, mesh: &MeshBuffers, slot: usize) -> io::Result<()> {
        let v = mesh.face_vertex_indices[slot] as u64 + 1;
        match self {
            FaceTokenShape::Vertex => write!(writer, " {}", v),
            FaceTokenShape::VertexTexCoord => {
                let vt = mesh.face_vertex_tex_coord_indices[slot] as u64 + 1;
                write!(writer, " {}/{}", v, vt)
            }
            FaceTokenShape::VertexNormal => {
                let vn = mesh.face_vertex_normal_indices[slot] as u64 + 1;
                write!(writer, " {}//{}", v, vn)
            }
            FaceTokenShape::VertexTexCoordNormal => {
                let vt = mesh.face_vertex_tex_coord_indices[slot] as u64 + 1;
                let vn = mesh.face_vertex_normal_indices[slot] as u64 + 1;
                write!(writer, " {}/{}/{}", v, vt, vn)
            }
        }
    }
}
