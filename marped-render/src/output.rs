//! Output formats, file naming and export directories.

use std::fmt;
use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;

use crate::error::{io_err, RenderError};

/// Minute resolution: re-rendering within the same minute overwrites.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Html,
    Pdf,
    Pptx,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Pptx => "pptx",
        }
    }

    /// marp flag selecting this format.
    pub fn marp_flag(self) -> &'static str {
        match self {
            OutputFormat::Html => "--html",
            OutputFormat::Pdf => "--pdf",
            OutputFormat::Pptx => "--pptx",
        }
    }

    pub fn export_dir_name(self) -> String {
        format!("_Export_{}", self.extension().to_ascii_uppercase())
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// `<stem><suffix>-<YYYYmmdd_HHMM>.<ext>`
pub fn file_name(stem: &str, suffix: &str, format: OutputFormat, now: NaiveDateTime) -> String {
    format!(
        "{stem}{suffix}-{}.{}",
        now.format(TIMESTAMP_FORMAT),
        format.extension()
    )
}

/// Create `dir` (and parents) unless it already exists as a directory.
pub fn ensure_export_dir(dir: &Path) -> Result<(), RenderError> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(RenderError::ExportBlocked {
            path: dir.to_path_buf(),
        }),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
            tracing::debug!(path = %dir.display(), "created export directory");
            Ok(())
        }
        Err(err) => Err(io_err(dir, err)),
    }
}
