use std::path::PathBuf;

use thiserror::Error;

use crate::supervisor::SessionState;

/// Error surface for watch sessions.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot watch directory {path}: {source}")]
    Subscribe {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("root document does not exist: {path}")]
    RootMissing { path: PathBuf },

    #[error("none of the directories needed by {root} could be watched")]
    NoWatchableDirectories { root: PathBuf },

    #[error("failed to start renderer {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot touch {path}: {source}")]
    Touch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("watch session already used (state {0:?})")]
    SessionReused(SessionState),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> WatchError {
    WatchError::Io {
        path: path.into(),
        source,
    }
}
