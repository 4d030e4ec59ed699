//! Locating external programs on `PATH`.

use std::env;
use std::path::{Path, PathBuf};

/// Search `PATH` for an executable named `name`.
///
/// A `name` containing a path separator is checked as-is.
pub fn find_in_path(name: &str) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }
    let path = env::var_os("PATH")?;
    find_in_dirs(name, env::split_paths(&path))
}

pub(crate) fn find_in_dirs(name: &str, dirs: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    dirs.into_iter()
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

/// `find_in_path`, or `fallback` with a warning when nothing is found.
///
/// The fallback is not checked; a bad path surfaces when the process is
/// spawned, reported with the attempted path.
pub fn locate_or(name: &str, fallback: &Path) -> PathBuf {
    match find_in_path(name) {
        Some(path) => path,
        None => {
            tracing::warn!(
                program = name,
                fallback = %fallback.display(),
                "executable not found on PATH, assuming fallback location",
            );
            fallback.to_path_buf()
        }
    }
}

/// `find_in_path`, or the bare name so the OS reports the failure on spawn.
pub fn locate(name: &str) -> PathBuf {
    find_in_path(name).unwrap_or_else(|| {
        tracing::warn!(program = name, "executable not found on PATH");
        PathBuf::from(name)
    })
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
