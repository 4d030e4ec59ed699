//! Commands run after marp: handout post-processing, packing, preview.

use std::path::Path;

use marped_core::CommandSpec;

use crate::handout::Handout;

/// `node <script> <output>` with the handout layout in the environment.
pub fn handout_postprocess(
    node: &Path,
    script: &Path,
    output: &Path,
    handout: &Handout,
) -> CommandSpec {
    CommandSpec::new(node)
        .arg(script.as_os_str())
        .arg(output.as_os_str())
        .envs(handout.postprocess_env())
}

/// `monolith <input> -o <output> -B -d <domain>...`
///
/// `-B` turns the `-d` list into a blacklist: assets from those domains are
/// not inlined.
pub fn monolith_pack(
    monolith: &Path,
    input: &Path,
    output: &Path,
    blacklist: &[String],
) -> CommandSpec {
    let mut spec = CommandSpec::new(monolith)
        .arg(input.as_os_str())
        .arg("-o")
        .arg(output.as_os_str());
    if !blacklist.is_empty() {
        spec = spec.arg("-B");
        for domain in blacklist {
            spec = spec.args(["-d", domain.as_str()]);
        }
    }
    if let Some(dir) = input.parent() {
        spec = spec.current_dir(dir);
    }
    spec
}

/// Open `file` in a browser with translation prompts disabled.
#[cfg(target_os = "macos")]
pub fn open_in_browser(file: &Path, browser: &str) -> CommandSpec {
    CommandSpec::new("open")
        .args(["-a", browser, "--args"])
        .arg(file.as_os_str())
        .args(["--disable-features=Translate", "--disable-translate"])
}

/// Open `file` with the desktop's default handler.
#[cfg(not(target_os = "macos"))]
pub fn open_in_browser(file: &Path, _browser: &str) -> CommandSpec {
    CommandSpec::new("xdg-open").arg(file.as_os_str())
}
