//! `marped convert` — one-shot PDF/PPTX export.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Args;
use colored::Colorize;

use marped_core::Config;
use marped_render::{ensure_export_dir, ConvertPreset, Document, MarpEngine};

use super::{failure_code, run_command};

/// Arguments for `marped convert`.
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Target: pdf, pptx or pdf-comments (portrait, with speaker notes).
    #[arg(short, long, default_value_t = ConvertPreset::Pdf)]
    pub format: ConvertPreset,

    /// Markdown documents to convert.
    #[arg(required = true, value_name = "FILES")]
    pub files: Vec<PathBuf>,
}

impl ConvertArgs {
    pub fn run(self, config: &Config) -> Result<ExitCode> {
        let engine = MarpEngine::from_config(config);
        let format = self.format.format();

        for file in &self.files {
            let doc = Document::new(file)
                .with_context(|| format!("invalid document path {}", file.display()))?;
            if !doc.path().is_file() {
                bail!("input file not found: {}", doc.path().display());
            }

            let export_dir = doc.export_dir(format);
            ensure_export_dir(&export_dir)
                .with_context(|| format!("cannot prepare {}", export_dir.display()))?;
            let output = doc.export_path(format, self.format.suffix(), Local::now().naive_local());

            println!(
                "{} {} ({})",
                "Converting".green().bold(),
                doc.path().display(),
                self.format
            );
            let status = run_command(&engine.convert(&doc, self.format, &output))?;
            if !status.success() {
                println!(
                    "{} marp exited with {status} for {}",
                    "error:".red().bold(),
                    doc.path().display()
                );
                return Ok(failure_code(status.code()));
            }
            println!("{} {}", "Wrote".green().bold(), output.display());
        }
        Ok(ExitCode::SUCCESS)
    }
}
