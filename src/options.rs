//! Reader and writer configuration.
//!
//! Options can be built in code or loaded from a TOML document:
//!
//! ```toml
//! [read]
//! strict = true
//!
//! [write]
//! precision = 6
//! stl_encoding = "binary"
//! ply_encoding = "binary_little_endian"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MeshIoError, Result};
use crate::io::ply::PlyEncoding;
use crate::io::stl::StlEncoding;

/// Options applied while parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReadOptions {
    /// Treat validation issues (out-of-range indices, degenerate faces,
    /// count mismatches) as errors instead of warnings.
    pub strict: bool,
}

impl ReadOptions {
    pub fn strict() -> Self {
        Self { strict: true }
    }
}

/// Options applied while serializing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WriteOptions {
    /// Fixed number of decimals for real values. `None` writes the shortest
    /// representation that parses back to the same value.
    pub precision: Option<usize>,
    pub stl_encoding: StlEncoding,
    pub ply_encoding: PlyEncoding,
    /// Name written after `solid`/`endsolid` in ASCII STL.
    pub solid_name: String,
    /// Comment placed in OBJ and PLY headers.
    pub header_comment: Option<String>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            precision: None,
            stl_encoding: StlEncoding::Ascii,
            ply_encoding: PlyEncoding::Ascii,
            solid_name: "mesh".to_string(),
            header_comment: Some("RustMesh export".to_string()),
        }
    }
}

/// Combined configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IoConfig {
    pub read: ReadOptions,
    pub write: WriteOptions,
}

impl IoConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).map_err(|e| MeshIoError::io(&path.display().to_string(), e))?;
        Self::from_toml_str(&content)
    }
}
