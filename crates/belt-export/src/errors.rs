use std::path::PathBuf;

use belt_builder::GeometryConstructionError;

/// Errors while producing or writing belt artifacts.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Tessellation or STEP serialization failed in the kernel.
    #[error(transparent)]
    Geometry(#[from] GeometryConstructionError),

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExportError::Io {
            path: path.into(),
            source,
        }
    }
}
