//! # RustMesh IO - Flat-Buffer Mesh Readers and Writers
//!
//! Reads and writes polygon meshes in OBJ, OFF, STL (ASCII and binary) and
//! PLY (ASCII and binary) into caller-owned flat arrays ([`MeshBuffers`]).
//! Readers size every array exactly from a counting pass before filling it.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::io::Cursor;
//! use rustmesh_io::{parse_off, serialize_obj, ReadOptions, WriteOptions};
//!
//! let off = "OFF\n3 1 0\n0 0 0\n1 0 0\n0 1 0\n3 0 1 2\n";
//! let mesh = parse_off(Cursor::new(off), "triangle.off", &ReadOptions::default()).unwrap();
//! assert_eq!(mesh.face_sizes, vec![3]);
//!
//! let mut obj = Vec::new();
//! serialize_obj(&mut obj, &mesh, &WriteOptions::default()).unwrap();
//! assert!(String::from_utf8(obj).unwrap().ends_with("f 1 2 3\n"));
//! ```

// Re-export types
pub use buffers::{FaceRange, MeshBuffers};
pub use command::{Classified, Command};
pub use error::{MeshIoError, Result, ValidationIssue};
pub use face_token::{FaceToken, FaceTokenShape, TokenError};
pub use io::*;
pub use line_source::{Line, LineMark, LineSource};
pub use options::{IoConfig, ReadOptions, WriteOptions};

pub mod buffers;
pub mod command;
pub mod error;
pub mod face_token;
pub mod io;
pub mod line_source;
pub mod options;
