use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn marped_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("marped"));
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env("MARPED_ENGINE_DIR", home.join("engine"))
        .env_remove("MARPED_MARP")
        .env_remove("RUST_LOG");
    cmd
}

/// `deck.md -> parts/a.md -> parts/b.md`
fn write_deck(dir: &Path) -> PathBuf {
    fs::create_dir_all(dir.join("parts")).expect("mkdir parts");
    fs::write(dir.join("deck.md"), "# Deck\n!!!include(parts/a.md)!!!\n").expect("deck");
    fs::write(dir.join("parts/a.md"), "## A\n!!!include(b.md)!!!\n").expect("a");
    fs::write(dir.join("parts/b.md"), "### B\n").expect("b");
    dir.join("deck.md")
}

fn files_matching(dir: &Path, prefix: &str, ext: &str) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with(prefix) && n.ends_with(ext))
        .collect();
    names.sort();
    names
}

#[test]
fn includes_json_lists_closure() {
    let home = TempDir::new().expect("home");
    let work = TempDir::new().expect("work");
    let deck = write_deck(work.path());

    let assert = marped_cmd(home.path())
        .args(["includes", "--json"])
        .arg(&deck)
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("json");

    assert_eq!(json["documents"].as_array().map(Vec::len), Some(3));
    assert_eq!(json["directories"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["failures"].as_array().map(Vec::len), Some(0));
}

#[test]
fn includes_table_reports_unreadable_include() {
    let home = TempDir::new().expect("home");
    let work = TempDir::new().expect("work");
    let deck = work.path().join("deck.md");
    fs::write(&deck, "!!!include(gone.md)!!!\n").expect("deck");

    marped_cmd(home.path())
        .arg("includes")
        .arg(&deck)
        .assert()
        .success()
        .stdout(contains("2 documents"))
        .stdout(contains("Unreadable documents"))
        .stdout(contains("gone.md"));
}

#[test]
fn includes_missing_root_fails() {
    let home = TempDir::new().expect("home");
    marped_cmd(home.path())
        .args(["includes", "/definitely/not/here.md"])
        .assert()
        .failure()
        .stderr(contains("input file not found"));
}

#[test]
fn render_requires_files() {
    let home = TempDir::new().expect("home");
    marped_cmd(home.path()).assert().failure();
}

#[test]
fn unsupported_slides_per_page_is_rejected() {
    let home = TempDir::new().expect("home");
    marped_cmd(home.path())
        .args(["-H", "--handout-slides-per-page", "5", "deck.md"])
        .assert()
        .failure()
        .stderr(contains("not supported"));
}

#[test]
fn corrupt_config_is_reported() {
    let home = TempDir::new().expect("home");
    let config = home.path().join("broken.yaml");
    fs::write(&config, "debounce_ms: [not, a, number]\n").expect("config");

    marped_cmd(home.path())
        .arg("--config")
        .arg(&config)
        .args(["includes", "deck.md"])
        .assert()
        .failure()
        .stderr(contains("failed to load config"));
}

#[cfg(unix)]
mod with_fake_marp {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// Writes the handout layout it was given to the `-o` path, then kills
    /// itself with `$FAKE_MARP_KILL` if set, else exits with `$FAKE_MARP_EXIT`.
    const FAKE_MARP: &str = r#"#!/bin/sh
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then
    shift
    out="$1"
  fi
  shift
done
printf 'layout=%s\n' "$MARP_HANDOUT_LAYOUT" > "$out"
if [ -n "$FAKE_MARP_KILL" ]; then
  kill -"$FAKE_MARP_KILL" $$
fi
exit "${FAKE_MARP_EXIT:-0}"
"#;

    fn install_fake_marp(home: &Path) -> PathBuf {
        let path = home.join("fake-marp");
        fs::write(&path, FAKE_MARP).expect("write fake marp");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
        path
    }

    #[test]
    fn render_writes_timestamped_html() {
        let home = TempDir::new().expect("home");
        let work = TempDir::new().expect("work");
        let deck = write_deck(work.path());
        let marp = install_fake_marp(home.path());

        marped_cmd(home.path())
            .env("MARPED_MARP", &marp)
            .arg(&deck)
            .assert()
            .success()
            .stdout(contains("Wrote"));

        assert_eq!(files_matching(work.path(), "deck-", ".html").len(), 1);
        assert!(work.path().join("_Export_HTML").is_dir());
    }

    #[test]
    fn renderer_exit_code_is_propagated() {
        let home = TempDir::new().expect("home");
        let work = TempDir::new().expect("work");
        let deck = write_deck(work.path());
        let marp = install_fake_marp(home.path());

        marped_cmd(home.path())
            .env("MARPED_MARP", &marp)
            .env("FAKE_MARP_EXIT", "3")
            .arg(&deck)
            .assert()
            .code(3);
    }

    #[test]
    fn renderer_killed_by_signal_fails() {
        let home = TempDir::new().expect("home");
        let work = TempDir::new().expect("work");
        let deck = write_deck(work.path());
        let marp = install_fake_marp(home.path());

        marped_cmd(home.path())
            .env("MARPED_MARP", &marp)
            .env("FAKE_MARP_KILL", "KILL")
            .arg(&deck)
            .assert()
            .code(137)
            .stdout(contains("killed by signal 9"));
    }

    #[test]
    fn renderer_terminated_counts_as_interrupt() {
        let home = TempDir::new().expect("home");
        let work = TempDir::new().expect("work");
        let deck = write_deck(work.path());
        let marp = install_fake_marp(home.path());

        marped_cmd(home.path())
            .env("MARPED_MARP", &marp)
            .env("FAKE_MARP_KILL", "TERM")
            .arg(&deck)
            .assert()
            .success()
            .stdout(contains("Interrupted."));
    }

    #[test]
    fn handout_env_reaches_engine_and_missing_postprocessor_only_warns() {
        let home = TempDir::new().expect("home");
        let work = TempDir::new().expect("work");
        let deck = write_deck(work.path());
        let marp = install_fake_marp(home.path());

        marped_cmd(home.path())
            .env("MARPED_MARP", &marp)
            .args(["--handout", "--handout-layout", "landscape"])
            .arg(&deck)
            .assert()
            .success()
            .stdout(contains("handout post-processor not found"));

        let outputs = files_matching(work.path(), "deck-", ".html");
        assert_eq!(outputs.len(), 1);
        let content = fs::read_to_string(work.path().join(&outputs[0])).expect("output");
        assert_eq!(content.trim(), "layout=landscape");
    }

    #[test]
    fn convert_pdf_comments_lands_in_export_folder() {
        let home = TempDir::new().expect("home");
        let work = TempDir::new().expect("work");
        let deck = write_deck(work.path());
        let marp = install_fake_marp(home.path());

        marped_cmd(home.path())
            .env("MARPED_MARP", &marp)
            .args(["convert", "--format", "pdf-comments"])
            .arg(&deck)
            .assert()
            .success();

        let export = work.path().join("_Export_PDF");
        assert_eq!(files_matching(&export, "deck-Comments-", ".pdf").len(), 1);
    }

    #[test]
    fn missing_renderer_is_reported() {
        let home = TempDir::new().expect("home");
        let work = TempDir::new().expect("work");
        let deck = write_deck(work.path());

        marped_cmd(home.path())
            .env("MARPED_MARP", home.path().join("no-such-marp"))
            .arg(&deck)
            .assert()
            .failure()
            .stderr(contains("failed to start renderer"));
    }
}
