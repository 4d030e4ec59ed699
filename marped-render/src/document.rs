//! Input document paths and where their outputs go.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use marped_core::types::absolute;

use crate::error::RenderError;
use crate::output::{self, OutputFormat};

/// A markdown document given on the command line.
///
/// marp runs with the document's directory as working directory, so outputs
/// and export folders are placed next to the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    path: PathBuf,
    dir: PathBuf,
    stem: String,
}

impl Document {
    pub fn new(input: impl AsRef<Path>) -> Result<Self, RenderError> {
        let path = absolute(input.as_ref());
        let invalid = || RenderError::InvalidDocument {
            path: input.as_ref().to_path_buf(),
        };
        let dir = path.parent().ok_or_else(invalid)?.to_path_buf();
        let stem = path
            .file_stem()
            .ok_or_else(invalid)?
            .to_string_lossy()
            .into_owned();
        Ok(Self { path, dir, stem })
    }

    /// Absolute path of the document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_name(&self) -> &OsStr {
        // `new` rejects paths without a file name.
        self.path.file_name().unwrap_or_default()
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// `<dir>/<stem><suffix>-<timestamp>.<ext>`
    pub fn output_path(&self, format: OutputFormat, suffix: &str, now: NaiveDateTime) -> PathBuf {
        self.dir
            .join(output::file_name(&self.stem, suffix, format, now))
    }

    /// `<dir>/_Export_<EXT>/<stem><suffix>-<timestamp>.<ext>`
    pub fn export_path(&self, format: OutputFormat, suffix: &str, now: NaiveDateTime) -> PathBuf {
        self.export_dir(format)
            .join(output::file_name(&self.stem, suffix, format, now))
    }

    pub fn export_dir(&self, format: OutputFormat) -> PathBuf {
        self.dir.join(format.export_dir_name())
    }
}
