//! User configuration.
//!
//! # Storage layout
//!
//! ```text
//! ~/.marped/
//!   config.yaml   (optional — defaults apply when absent)
//!   engine/       (default engine_dir: engine.js, themes/, handout-postprocess.js)
//! ```
//!
//! # API pattern
//!
//! - `load_at(home)` — explicit home; used in tests with `TempDir`
//! - `load()` — derives home from `dirs::home_dir()`, delegates to `load_at`
//!
//! Environment overrides are applied after the file: `MARPED_ENGINE_DIR`,
//! `MARPED_MARP`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const CONFIG_DIR: &str = ".marped";
pub const CONFIG_FILE: &str = "config.yaml";

pub const ENV_ENGINE_DIR: &str = "MARPED_ENGINE_DIR";
pub const ENV_MARP: &str = "MARPED_MARP";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding `engine.js`, `themes/` and `handout-postprocess.js`.
    /// Empty means `<home>/.marped/engine`.
    pub engine_dir: PathBuf,
    /// Explicit marp binary; skips the `PATH` lookup.
    pub marp_program: Option<PathBuf>,
    /// Used when marp is not on `PATH`.
    pub marp_fallback: PathBuf,
    pub monolith_program: String,
    pub node_program: String,
    pub browser: String,
    /// Domains passed to monolith's blacklist (`-B -d <domain>`).
    pub pack_blacklist: Vec<String>,
    pub debounce_ms: u64,
    pub terminate_grace_ms: u64,
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine_dir: PathBuf::new(),
            marp_program: None,
            marp_fallback: PathBuf::from("/opt/homebrew/bin/marp"),
            monolith_program: "monolith".to_string(),
            node_program: "node".to_string(),
            browser: "Google Chrome".to_string(),
            pack_blacklist: vec![".particify.de".to_string()],
            debounce_ms: 300,
            terminate_grace_ms: 5_000,
            log_json: false,
        }
    }
}

/// `<home>/.marped/config.yaml` — pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(CONFIG_DIR).join(CONFIG_FILE)
}

impl Config {
    /// Load `<home>/.marped/config.yaml`, or defaults when it does not exist.
    pub fn load_at(home: &Path) -> Result<Self, ConfigError> {
        let path = config_path_at(home);
        let config = if path.exists() {
            Self::parse_file(&path)?
        } else {
            Self::default()
        };
        Ok(config.finish(home, |key| std::env::var(key).ok()))
    }

    /// `load_at` convenience wrapper.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_at(&home()?)
    }

    /// Load an explicit config file; a missing file is an error here.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::parse_file(path)?;
        Ok(config.finish(&home()?, |key| std::env::var(key).ok()))
    }

    fn parse_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Fill home-relative defaults, then apply environment overrides.
    pub fn finish(mut self, home: &Path, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if self.engine_dir.as_os_str().is_empty() {
            self.engine_dir = home.join(CONFIG_DIR).join("engine");
        }
        if let Some(dir) = lookup(ENV_ENGINE_DIR).filter(|v| !v.is_empty()) {
            self.engine_dir = PathBuf::from(dir);
        }
        if let Some(marp) = lookup(ENV_MARP).filter(|v| !v.is_empty()) {
            self.marp_program = Some(PathBuf::from(marp));
        }
        self
    }

    pub fn engine_script(&self) -> PathBuf {
        self.engine_dir.join("engine.js")
    }

    pub fn themes_dir(&self) -> PathBuf {
        self.engine_dir.join("themes")
    }

    pub fn handout_script(&self) -> PathBuf {
        self.engine_dir.join("handout-postprocess.js")
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn terminate_grace(&self) -> Duration {
        Duration::from_millis(self.terminate_grace_ms)
    }
}

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}
