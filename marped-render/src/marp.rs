//! marp command lines.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use marped_core::{CommandSpec, Config};

use crate::document::Document;
use crate::handout::Handout;
use crate::output::OutputFormat;
use crate::program;

/// The marp binary plus the custom engine and theme set it is run with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarpEngine {
    program: PathBuf,
    engine_script: PathBuf,
    themes_dir: PathBuf,
}

/// Options for an HTML render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlOptions {
    /// Open marp's preview window and keep re-rendering on change.
    pub preview: bool,
    /// Pass `--debug=true` to marp.
    pub debug: bool,
    pub handout: Option<Handout>,
}

impl MarpEngine {
    pub fn new(
        program: impl Into<PathBuf>,
        engine_script: impl Into<PathBuf>,
        themes_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            program: program.into(),
            engine_script: engine_script.into(),
            themes_dir: themes_dir.into(),
        }
    }

    /// Explicit `marp_program`, else `PATH`, else `marp_fallback`.
    pub fn from_config(config: &Config) -> Self {
        let program = config
            .marp_program
            .clone()
            .unwrap_or_else(|| program::locate_or("marp", &config.marp_fallback));
        Self::new(program, config.engine_script(), config.themes_dir())
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn base(&self, doc: &Document, format: OutputFormat, output: &Path) -> CommandSpec {
        CommandSpec::new(&self.program)
            .arg(doc.file_name())
            .arg("--allow-local-files")
            .arg(format.marp_flag())
            .arg("--theme-set")
            .arg(self.themes_dir.as_os_str())
            .arg("--engine")
            .arg(self.engine_script.as_os_str())
            .arg("-o")
            .arg(output.as_os_str())
            .current_dir(doc.dir())
    }

    /// HTML render of `doc` into `output`; with `preview` marp stays running
    /// in watch mode until it is stopped.
    pub fn html(&self, doc: &Document, output: &Path, options: &HtmlOptions) -> CommandSpec {
        let mut spec = self.base(doc, OutputFormat::Html, output);
        if options.preview {
            spec = spec.args(["--preview", "--watch"]);
        }
        if options.debug {
            spec = spec.arg("--debug=true");
        }
        if let Some(handout) = &options.handout {
            spec = spec.envs(handout.engine_env());
        }
        spec
    }

    /// One-shot conversion of `doc` into `output`.
    pub fn convert(&self, doc: &Document, preset: ConvertPreset, output: &Path) -> CommandSpec {
        self.base(doc, preset.format(), output)
            .args(preset.extra_args().iter().copied())
    }
}

/// Conversion targets of `marped convert`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConvertPreset {
    #[default]
    Pdf,
    /// Portrait PDF with speaker comments, using the roboto light theme.
    PdfComments,
    Pptx,
}

impl ConvertPreset {
    pub fn format(self) -> OutputFormat {
        match self {
            ConvertPreset::Pdf | ConvertPreset::PdfComments => OutputFormat::Pdf,
            ConvertPreset::Pptx => OutputFormat::Pptx,
        }
    }

    /// Appended to the output file stem.
    pub fn suffix(self) -> &'static str {
        match self {
            ConvertPreset::PdfComments => "-Comments",
            ConvertPreset::Pdf | ConvertPreset::Pptx => "",
        }
    }

    pub fn extra_args(self) -> &'static [&'static str] {
        match self {
            ConvertPreset::PdfComments => &[
                "--theme",
                "style-roboto-light-portrait",
                "--format",
                "portrait",
            ],
            ConvertPreset::Pdf | ConvertPreset::Pptx => &[],
        }
    }
}

impl fmt::Display for ConvertPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertPreset::Pdf => write!(f, "pdf"),
            ConvertPreset::PdfComments => write!(f, "pdf-comments"),
            ConvertPreset::Pptx => write!(f, "pptx"),
        }
    }
}

impl FromStr for ConvertPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Ok(ConvertPreset::Pdf),
            "pdf-comments" => Ok(ConvertPreset::PdfComments),
            "pptx" => Ok(ConvertPreset::Pptx),
            other => Err(format!(
                "unknown format '{other}'; expected: pdf, pdf-comments, pptx"
            )),
        }
    }
}
