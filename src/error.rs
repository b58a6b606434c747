//! Error types shared by every reader and writer.

use std::collections::TryReserveError;
use std::fmt;
use std::io;

use thiserror::Error;

/// A semantic problem found in otherwise well-formed mesh data.
///
/// Tolerant reads log these and keep going; strict reads turn them into
/// [`MeshIoError::Validation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// An index points past the end of the channel it refers to.
    IndexOutOfRange {
        channel: &'static str,
        slot: usize,
        index: i64,
        count: usize,
    },
    /// A face with fewer than three vertices.
    DegenerateFace { face: usize, size: u32 },
    /// A face vertex omits a channel the rest of the mesh carries.
    MissingChannelIndex { channel: &'static str, face: usize },
    /// Element counts that disagree with the format's own bookkeeping.
    CountMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::IndexOutOfRange {
                channel,
                slot,
                index,
                count,
            } => write!(
                f,
                "{} index {} at slot {} is outside [0, {})",
                channel, index, slot, count
            ),
            ValidationIssue::DegenerateFace { face, size } => {
                write!(f, "face {} has {} vertices, expected at least 3", face, size)
            }
            ValidationIssue::MissingChannelIndex { channel, face } => write!(
                f,
                "face {} omits its {} index while the mesh carries {}s",
                face, channel, channel
            ),
            ValidationIssue::CountMismatch {
                what,
                expected,
                found,
            } => write!(f, "expected {} {}, found {}", expected, what, found),
        }
    }
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum MeshIoError {
    #[error("I/O error on {origin}: {source}")]
    Io {
        origin: String,
        #[source]
        source: io::Error,
    },
    #[error("{origin}:{line}: {message}")]
    Format {
        origin: String,
        line: usize,
        message: String,
    },
    #[error("{origin}: invalid mesh data: {}", join_issues(.issues))]
    Validation {
        origin: String,
        issues: Vec<ValidationIssue>,
    },
    #[error("{origin}: cannot allocate {count} {what}: {source}")]
    Allocation {
        origin: String,
        what: &'static str,
        count: usize,
        #[source]
        source: TryReserveError,
    },
    #[error("inconsistent mesh buffers: {0}")]
    InvalidLayout(String),
    #[error("unsupported mesh format: {0}")]
    UnsupportedFormat(String),
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, MeshIoError>;

impl MeshIoError {
    pub(crate) fn io(origin: &str, source: io::Error) -> Self {
        MeshIoError::Io {
            origin: origin.to_string(),
            source,
        }
    }

    pub(crate) fn format(origin: &str, line: usize, message: impl Into<String>) -> Self {
        MeshIoError::Format {
            origin: origin.to_string(),
            line,
            message: message.into(),
        }
    }

    /// Line number for format errors, if the error carries one.
    pub fn line(&self) -> Option<usize> {
        match self {
            MeshIoError::Format { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// Either logs `issues` as warnings or fails, depending on `strict`.
pub(crate) fn report_issues(
    origin: &str,
    issues: Vec<ValidationIssue>,
    strict: bool,
) -> Result<()> {
    if issues.is_empty() {
        return Ok(());
    }
    if strict {
        return Err(MeshIoError::Validation {
            origin: origin.to_string(),
            issues,
        });
    }
    for issue in &issues {
        log::warn!("{}: {}", origin, issue);
    }
    Ok(())
}
