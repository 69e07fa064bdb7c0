//! Pipeline errors

use crate::float_types::Real;
use crate::io::IoError;
use nalgebra::Vector3;
use std::path::PathBuf;

/// Everything that can stop (or locally interrupt) a slat run.
///
/// [`SlatError::BooleanOperation`] is the only recoverable kind: the pipeline
/// catches it per slice, piece or joint and carries on. Every other variant
/// aborts the run and is surfaced to the caller.
#[derive(Debug, thiserror::Error)]
pub enum SlatError {
    /// No usable operating mode, an invalid parameter, or a file format
    /// without import/export support.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The input bounding box has a zero extent on at least one axis.
    #[error(
        "degenerate geometry: bounding box extents are ({}, {}, {})",
        extents.x,
        extents.y,
        extents.z
    )]
    DegenerateGeometry { extents: Vector3<Real> },

    /// A single intersection, difference, extrusion or remesh call failed.
    #[error("{operation} failed: {reason}")]
    BooleanOperation {
        operation: &'static str,
        reason: String,
    },

    /// Nothing is left to assemble.
    #[error("empty result: {0}")]
    EmptyResult(String),

    /// Reading the input or writing the output failed.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: IoError,
    },
}

impl SlatError {
    pub(crate) fn boolean(operation: &'static str, reason: impl Into<String>) -> Self {
        SlatError::BooleanOperation {
            operation,
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: impl Into<IoError>) -> Self {
        SlatError::Io {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Whether the pipeline may log this error and continue.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, SlatError::BooleanOperation { .. })
    }
}

/// Result type for slat operations.
pub type Result<T> = std::result::Result<T, SlatError>;
