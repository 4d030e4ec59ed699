//! marped — include-aware Marp renderer.
//!
//! # Usage
//!
//! ```text
//! marped [-c|--pack] [-p|--preview] [-v] [-H [--handout-layout L] [--handout-slides-per-page N]] <FILES>...
//! marped convert [--format pdf|pptx|pdf-comments] <FILES>...
//! marped includes <FILE> [--json]
//! ```

mod commands;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use commands::{convert::ConvertArgs, includes::IncludesArgs, render::RenderArgs};
use marped_core::Config;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "marped",
    version,
    about = "Render Marp decks that include other markdown files",
    long_about = None,
    subcommand_negates_reqs = true,
)]
struct Cli {
    #[command(flatten)]
    render: RenderArgs,

    /// Debug logging; also passes --debug=true to marp.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (default: ~/.marped/config.yaml).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert documents to PDF or PPTX into _Export_<FORMAT>/.
    Convert(ConvertArgs),

    /// Show every document a root includes and the directories watched.
    Includes(IncludesArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    marped_watch::logging::init_tracing(cli.verbose, config.log_json);

    match cli.command {
        Some(Commands::Convert(args)) => args.run(&config),
        Some(Commands::Includes(args)) => args.run(),
        None => cli.render.run(&config, cli.verbose),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Config::load().context("failed to load ~/.marped/config.yaml"),
    }
}
