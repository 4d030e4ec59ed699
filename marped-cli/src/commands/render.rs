//! `marped <FILES>...` — HTML render under a watch session.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Args;
use colored::Colorize;

use marped_core::Config;
use marped_render::{
    ensure_export_dir, post, Document, Handout, HandoutLayout, HtmlOptions, MarpEngine,
    OutputFormat, SlidesPerPage,
};
use marped_watch::{SessionConfig, SessionExit};

use super::{failure_code, run_command};

/// Arguments for the default render command.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Inline all assets with monolith into _Export_HTML/.
    #[arg(short = 'c', long)]
    pub pack: bool,

    /// Live preview; with --pack, open the packed file in the browser.
    #[arg(short, long)]
    pub preview: bool,

    /// Render a handout (slides plus notes).
    #[arg(short = 'H', long)]
    pub handout: bool,

    #[arg(long, value_name = "LAYOUT", default_value_t = HandoutLayout::Portrait)]
    pub handout_layout: HandoutLayout,

    #[arg(long, value_name = "N", default_value_t = SlidesPerPage::default())]
    pub handout_slides_per_page: SlidesPerPage,

    /// Markdown documents to render.
    #[arg(required = true, value_name = "FILES")]
    pub files: Vec<PathBuf>,
}

/// How one document's render ended.
enum Rendered {
    Done,
    Interrupted,
    Failed(ExitCode),
}

impl RenderArgs {
    pub fn run(self, config: &Config, verbose: bool) -> Result<ExitCode> {
        let engine = MarpEngine::from_config(config);
        for file in &self.files {
            match self.render_one(file, config, &engine, verbose)? {
                Rendered::Done => {}
                Rendered::Interrupted => {
                    println!("{}", "Interrupted.".yellow());
                    return Ok(ExitCode::SUCCESS);
                }
                Rendered::Failed(code) => return Ok(code),
            }
        }
        Ok(ExitCode::SUCCESS)
    }

    fn handout_options(&self) -> Option<Handout> {
        self.handout.then_some(Handout {
            layout: self.handout_layout,
            slides_per_page: self.handout_slides_per_page,
        })
    }

    /// marp stays in watch mode only for a plain preview.
    fn watch_mode(&self) -> bool {
        self.preview && !self.pack
    }

    fn render_one(
        &self,
        file: &Path,
        config: &Config,
        engine: &MarpEngine,
        verbose: bool,
    ) -> Result<Rendered> {
        let doc = Document::new(file)
            .with_context(|| format!("invalid document path {}", file.display()))?;
        if !doc.path().is_file() {
            bail!("input file not found: {}", doc.path().display());
        }

        let export_dir = doc.export_dir(OutputFormat::Html);
        if let Err(err) = ensure_export_dir(&export_dir) {
            println!("{} {err}", "warning:".yellow().bold());
        }

        let output = doc.output_path(OutputFormat::Html, "", Local::now().naive_local());
        let options = HtmlOptions {
            preview: self.watch_mode(),
            debug: verbose,
            handout: self.handout_options(),
        };
        let renderer = engine.html(&doc, &output, &options);
        println!("{} {}", "Rendering".green().bold(), doc.path().display());

        let session = SessionConfig::new(doc.path(), renderer)
            .with_debounce(config.debounce())
            .with_terminate_grace(config.terminate_grace());
        let outcome = marped_watch::run_blocking(session)
            .with_context(|| format!("render session failed for {}", doc.path().display()))?;

        if self.watch_mode() {
            remove_if_exists(&output)?;
        }

        if outcome.exit.is_interrupt() {
            return Ok(Rendered::Interrupted);
        }
        match outcome.exit {
            SessionExit::Interrupted | SessionExit::Exited { code: 0 } => {}
            SessionExit::Exited { code } => {
                println!(
                    "{} marp exited with {code} for {}",
                    "error:".red().bold(),
                    doc.path().display()
                );
                return Ok(Rendered::Failed(failure_code(Some(code))));
            }
            SessionExit::Signaled { signal } => {
                println!(
                    "{} marp killed by signal {signal} for {}",
                    "error:".red().bold(),
                    doc.path().display()
                );
                return Ok(Rendered::Failed(failure_code(Some(128 + signal))));
            }
        }

        if let Some(handout) = self.handout_options() {
            if !self.preview && output.is_file() {
                postprocess_handout(config, &output, &handout);
            }
        }

        if self.pack {
            let packed = pack(config, &output, &export_dir)?;
            if self.preview {
                open_preview(config, &packed);
            }
        } else if !self.watch_mode() {
            println!("{} {}", "Wrote".green().bold(), output.display());
        }

        Ok(Rendered::Done)
    }
}

/// Non-fatal: a failed post-processing leaves the plain handout in place.
fn postprocess_handout(config: &Config, output: &Path, handout: &Handout) {
    let script = config.handout_script();
    if !script.is_file() {
        println!(
            "{} handout post-processor not found at {}",
            "warning:".yellow().bold(),
            script.display()
        );
        return;
    }
    let node = marped_render::program::locate(&config.node_program);
    let spec = post::handout_postprocess(&node, &script, output, handout);
    match run_command(&spec) {
        Ok(status) if status.success() => {
            println!("{} handout layout applied", "Post-processed".green().bold());
        }
        Ok(status) => println!(
            "{} handout post-processing exited with {status}",
            "warning:".yellow().bold()
        ),
        Err(err) => println!("{} {err:#}", "warning:".yellow().bold()),
    }
}

/// Pack `html` into `export_dir` and delete the intermediate file.
fn pack(config: &Config, html: &Path, export_dir: &Path) -> Result<PathBuf> {
    let name = html
        .file_name()
        .with_context(|| format!("output path has no file name: {}", html.display()))?;
    let packed = export_dir.join(name);
    let monolith = marped_render::program::locate(&config.monolith_program);
    let spec = post::monolith_pack(&monolith, html, &packed, &config.pack_blacklist);

    let status = run_command(&spec)?;
    if !status.success() {
        bail!("monolith failed ({status}) packing {}", html.display());
    }
    remove_if_exists(html)?;
    println!("{} {}", "Packed".green().bold(), packed.display());
    Ok(packed)
}

fn open_preview(config: &Config, file: &Path) {
    let spec = post::open_in_browser(file, &config.browser);
    match run_command(&spec) {
        Ok(status) if status.success() => {}
        Ok(status) => println!(
            "{} browser launcher exited with {status}",
            "warning:".yellow().bold()
        ),
        Err(err) => println!("{} {err:#}", "warning:".yellow().bold()),
    }
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("failed to remove {}", path.display())),
    }
}
