//! `marped includes` — show what a watch session would watch.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use marped_core::{DocumentRef, WatchSet};

/// Arguments for `marped includes`.
#[derive(Args, Debug)]
pub struct IncludesArgs {
    /// Root document.
    pub file: PathBuf,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct DocumentRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "document")]
    document: String,
    #[tabled(rename = "canonical")]
    canonical: String,
}

impl IncludesArgs {
    pub fn run(self) -> Result<ExitCode> {
        if !self.file.is_file() {
            bail!("input file not found: {}", self.file.display());
        }
        let watch_set = marped_core::resolve(&self.file);

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&watch_set)
                    .context("failed to serialize include JSON")?
            );
        } else {
            print_table(&watch_set);
        }
        Ok(ExitCode::SUCCESS)
    }
}

fn print_table(watch_set: &WatchSet) {
    println!(
        "{} | {} documents | {} directories",
        watch_set.root().original().display().to_string().bold(),
        watch_set.len(),
        watch_set.directories().len(),
    );

    let rows: Vec<DocumentRow> = watch_set
        .documents()
        .iter()
        .enumerate()
        .map(|(index, doc)| DocumentRow {
            index,
            document: doc.original().display().to_string(),
            canonical: canonical_label(doc),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    println!("{}", "Watched directories".bold());
    for dir in watch_set.directories() {
        println!("  {}", dir.display());
    }

    if !watch_set.failures().is_empty() {
        println!("{}", "Unreadable documents".yellow().bold());
        for failure in watch_set.failures() {
            println!("  {} ({})", failure.path.display(), failure.reason);
        }
    }
}

fn canonical_label(doc: &DocumentRef) -> String {
    if !doc.is_resolved() {
        format!("{} (unresolved)", doc.canonical().display())
            .yellow()
            .to_string()
    } else if doc.canonical() == doc.original() {
        "=".bright_black().to_string()
    } else {
        doc.canonical().display().to_string()
    }
}
