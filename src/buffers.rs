//! # Mesh Buffers
//!
//! Flat, caller-owned arrays describing a polygonal mesh:
//!
//! - `positions`: `[x, y, z, x, y, z, ...]`
//! - `normals`: `[x, y, z, ...]`, empty when the mesh has no normals
//! - `tex_coords`: `[u, v, u, v, ...]`, empty when the mesh has no texture coordinates
//! - `face_sizes`: number of vertices in each face
//! - `face_vertex_indices`: 0-based position indices, faces laid out back to back
//! - `face_vertex_tex_coord_indices` / `face_vertex_normal_indices`: parallel to
//!   `face_vertex_indices`, populated only when the matching channel is non-empty
//!
//! The start of each face inside the index arrays is the running sum of the
//! preceding face sizes; it is rebuilt on the fly by [`MeshBuffers::faces`].

use std::ops::Range;

use glam::{DVec2, DVec3};

use crate::error::{MeshIoError, Result, ValidationIssue};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffers {
    pub positions: Vec<f64>,
    pub normals: Vec<f64>,
    pub tex_coords: Vec<f64>,
    pub face_sizes: Vec<u32>,
    pub face_vertex_indices: Vec<u32>,
    pub face_vertex_tex_coord_indices: Vec<u32>,
    pub face_vertex_normal_indices: Vec<u32>,
}

/// One face's slot range inside the flattened index arrays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceRange {
    pub face: usize,
    pub slots: Range<usize>,
}

impl FaceRange {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl MeshBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor for a mesh with positions and faces only.
    pub fn from_polygons(positions: Vec<f64>, face_sizes: Vec<u32>, face_vertex_indices: Vec<u32>) -> Self {
        Self {
            positions,
            face_sizes,
            face_vertex_indices,
            ..Self::default()
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn normal_count(&self) -> usize {
        self.normals.len() / 3
    }

    pub fn tex_coord_count(&self) -> usize {
        self.tex_coords.len() / 2
    }

    pub fn face_count(&self) -> usize {
        self.face_sizes.len()
    }

    /// Total number of face-vertex slots, `sum(face_sizes)`.
    pub fn face_index_count(&self) -> usize {
        self.face_vertex_indices.len()
    }

    /// Number of triangles in an STL-style triangle soup.
    pub fn triangle_count(&self) -> usize {
        self.vertex_count() / 3
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    pub fn has_tex_coords(&self) -> bool {
        !self.tex_coords.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() && self.face_sizes.is_empty()
    }

    /// Releases every array at once.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn position(&self, i: usize) -> Option<DVec3> {
        vec3_at(&self.positions, i)
    }

    pub fn normal(&self, i: usize) -> Option<DVec3> {
        vec3_at(&self.normals, i)
    }

    pub fn tex_coord(&self, i: usize) -> Option<DVec2> {
        let s = self.tex_coords.get(i * 2..i * 2 + 2)?;
        Some(DVec2::new(s[0], s[1]))
    }

    /// Iterates faces, reconstructing each face's offset from `face_sizes`.
    pub fn faces(&self) -> impl Iterator<Item = FaceRange> + '_ {
        self.face_sizes
            .iter()
            .enumerate()
            .scan(0usize, |offset, (face, &size)| {
                let start = *offset;
                *offset += size as usize;
                Some(FaceRange {
                    face,
                    slots: start..*offset,
                })
            })
    }

    /// Position indices of face `f`.
    pub fn face_vertices(&self, f: usize) -> Option<&[u32]> {
        let range = self.faces().nth(f)?;
        self.face_vertex_indices.get(range.slots)
    }

    /// Checks that the arrays describe a structurally consistent mesh.
    ///
    /// Writers call this before emitting anything.
    pub fn check_layout(&self) -> Result<()> {
        if self.positions.len() % 3 != 0 {
            return Err(MeshIoError::InvalidLayout(format!(
                "positions length {} is not a multiple of 3",
                self.positions.len()
            )));
        }
        if self.normals.len() % 3 != 0 {
            return Err(MeshIoError::InvalidLayout(format!(
                "normals length {} is not a multiple of 3",
                self.normals.len()
            )));
        }
        if self.tex_coords.len() % 2 != 0 {
            return Err(MeshIoError::InvalidLayout(format!(
                "tex_coords length {} is not a multiple of 2",
                self.tex_coords.len()
            )));
        }

        let total: usize = self.face_sizes.iter().map(|&s| s as usize).sum();
        if total != self.face_vertex_indices.len() {
            return Err(MeshIoError::InvalidLayout(format!(
                "face sizes sum to {} but {} face vertex indices are present",
                total,
                self.face_vertex_indices.len()
            )));
        }

        check_parallel(
            "texture coordinate",
            self.has_tex_coords(),
            &self.face_vertex_tex_coord_indices,
            total,
        )?;
        check_parallel(
            "normal",
            self.has_normals(),
            &self.face_vertex_normal_indices,
            total,
        )?;
        Ok(())
    }

    /// Semantic checks: every index in range, every face at least a triangle.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        for range in self.faces() {
            let size = range.len() as u32;
            if size < 3 {
                issues.push(ValidationIssue::DegenerateFace {
                    face: range.face,
                    size,
                });
            }
        }

        collect_out_of_range("vertex", &self.face_vertex_indices, self.vertex_count(), &mut issues);
        collect_out_of_range(
            "texture coordinate",
            &self.face_vertex_tex_coord_indices,
            self.tex_coord_count(),
            &mut issues,
        );
        collect_out_of_range(
            "normal",
            &self.face_vertex_normal_indices,
            self.normal_count(),
            &mut issues,
        );
        issues
    }
}

fn vec3_at(values: &[f64], i: usize) -> Option<DVec3> {
    let s = values.get(i * 3..i * 3 + 3)?;
    Some(DVec3::new(s[0], s[1], s[2]))
}

fn check_parallel(channel: &str, present: bool, indices: &[u32], total: usize) -> Result<()> {
    if present && total > 0 && indices.len() != total {
        return Err(MeshIoError::InvalidLayout(format!(
            "{} indices have length {}, expected {}",
            channel,
            indices.len(),
            total
        )));
    }
    if !present && !indices.is_empty() {
        return Err(MeshIoError::InvalidLayout(format!(
            "{} indices present without any {} values",
            channel, channel
        )));
    }
    Ok(())
}

fn collect_out_of_range(
    channel: &'static str,
    indices: &[u32],
    count: usize,
    issues: &mut Vec<ValidationIssue>,
) {
    for (slot, &index) in indices.iter().enumerate() {
        if index as usize >= count {
            issues.push(ValidationIssue::IndexOutOfRange {
                channel,
                slot,
                index: index as i64,
                count,
            });
        }
    }
}

/// Allocates an empty vector with room for exactly `len` elements.
///
/// Allocation failure becomes [`MeshIoError::Allocation`] instead of aborting.
pub(crate) fn alloc_exact<T>(len: usize, what: &'static str, origin: &str) -> Result<Vec<T>> {
    let mut values = Vec::new();
    values
        .try_reserve_exact(len)
        .map_err(|source| MeshIoError::Allocation {
            origin: origin.to_string(),
            what,
            count: len,
            source,
        })?;
    Ok(values)
}
