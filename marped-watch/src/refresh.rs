//! Marking the root document dirty.

use std::fs::OpenOptions;
use std::path::Path;

use filetime::FileTime;

use crate::error::WatchError;

/// Action taken when an included document changes.
pub trait Refresh: Send + Sync {
    fn refresh(&self, root: &Path) -> Result<(), WatchError>;
}

/// `touch`: bump mtime/atime to now, creating the file if it vanished.
#[derive(Debug, Clone, Copy, Default)]
pub struct Touch;

impl Refresh for Touch {
    fn refresh(&self, root: &Path) -> Result<(), WatchError> {
        touch(root)
    }
}

pub fn touch(path: &Path) -> Result<(), WatchError> {
    let touch_err = |source| WatchError::Touch {
        path: path.to_path_buf(),
        source,
    };
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(touch_err)?;
    let now = FileTime::now();
    filetime::set_file_times(path, now, now).map_err(touch_err)
}
