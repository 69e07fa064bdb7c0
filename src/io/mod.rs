//! Mesh file import and export.
//!
//! Formats are picked by file extension. OBJ is always available; STL sits
//! behind the `stl-io` cargo feature.

pub mod obj;

#[cfg(feature = "stl-io")]
pub mod stl;

use crate::errors::{Result, SlatError};
use crate::mesh::Mesh;
use std::fmt::Debug;
use std::path::Path;
use tracing::debug;

/// Generic I/O and format-conversion errors.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("std::io::Error: {0}")]
    StdIo(#[from] std::io::Error),

    #[error("could not parse float: {0}")]
    ParseFloat(#[from] std::num::ParseFloatError),

    #[error("input is malformed: {0}")]
    MalformedInput(String),

    #[error("unsupported: {0}")]
    Unsupported(String),
}

/// Mesh interchange formats with read and write support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    Obj,
    Stl,
}

impl MeshFormat {
    /// Format for a bare extension such as `"obj"` or `"STL"`.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "obj" => Some(MeshFormat::Obj),
            "stl" => Some(MeshFormat::Stl),
            _ => None,
        }
    }

    /// Format implied by a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub const fn extension(self) -> &'static str {
        match self {
            MeshFormat::Obj => "obj",
            MeshFormat::Stl => "stl",
        }
    }

    /// Whether this build can read and write the format.
    pub const fn is_available(self) -> bool {
        match self {
            MeshFormat::Obj => true,
            MeshFormat::Stl => cfg!(feature = "stl-io"),
        }
    }

    /// The format of `path`, or a configuration error when this build has
    /// no reader/writer for it.
    pub fn for_path(path: &Path) -> Result<Self> {
        match Self::from_path(path) {
            Some(format) if format.is_available() => Ok(format),
            _ => Err(SlatError::Configuration(format!(
                "no mesh import/export support for {}",
                path.display()
            ))),
        }
    }
}

/// Read a mesh file, choosing the parser by extension.
pub fn import_mesh<S: Clone + Debug + Send + Sync>(path: &Path) -> Result<Mesh<S>> {
    let format = MeshFormat::for_path(path)?;
    let bytes = std::fs::read(path).map_err(|e| SlatError::io(path, e))?;
    let mesh = decode(format, &bytes).map_err(|e| SlatError::io(path, e))?;
    debug!(path = %path.display(), polygons = mesh.polygons.len(), "imported mesh");
    Ok(mesh)
}

/// Write `mesh` as one named object, choosing the writer by extension.
pub fn export_mesh<S: Clone + Debug + Send + Sync>(
    mesh: &Mesh<S>,
    name: &str,
    path: &Path,
) -> Result<()> {
    let format = MeshFormat::for_path(path)?;
    let bytes = encode(format, mesh, name).map_err(|e| SlatError::io(path, e))?;
    std::fs::write(path, bytes).map_err(|e| SlatError::io(path, e))?;
    debug!(path = %path.display(), format = format.extension(), "exported mesh");
    Ok(())
}

fn decode<S: Clone + Debug + Send + Sync>(
    format: MeshFormat,
    bytes: &[u8],
) -> std::result::Result<Mesh<S>, IoError> {
    match format {
        MeshFormat::Obj => {
            let text = std::str::from_utf8(bytes)
                .map_err(|e| IoError::MalformedInput(format!("OBJ is not UTF-8: {e}")))?;
            Ok(obj::parse_obj(text)?.to_mesh(None))
        },
        #[cfg(feature = "stl-io")]
        MeshFormat::Stl => stl::read_stl(bytes),
        #[cfg(not(feature = "stl-io"))]
        MeshFormat::Stl => Err(IoError::Unsupported("STL support is not compiled in".into())),
    }
}

fn encode<S: Clone + Debug + Send + Sync>(
    format: MeshFormat,
    mesh: &Mesh<S>,
    name: &str,
) -> std::result::Result<Vec<u8>, IoError> {
    match format {
        MeshFormat::Obj => Ok(mesh.to_obj(name).into_bytes()),
        #[cfg(feature = "stl-io")]
        MeshFormat::Stl => Ok(stl::to_stl_binary(mesh)?),
        #[cfg(not(feature = "stl-io"))]
        MeshFormat::Stl => Err(IoError::Unsupported("STL support is not compiled in".into())),
    }
}
