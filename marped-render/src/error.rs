//! Error types for marped-render.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while preparing command lines and output paths.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Filesystem error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A regular file sits where the export directory should be.
    #[error("export path blocked by file {path}")]
    ExportBlocked { path: PathBuf },

    /// The input path has no file name (e.g. `..` or `/`).
    #[error("not a document path: {path}")]
    InvalidDocument { path: PathBuf },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RenderError {
    RenderError::Io {
        path: path.into(),
        source,
    }
}
