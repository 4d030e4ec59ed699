//! marped core library — document references, include resolution, config.
//!
//! - [`types`] — [`Canonical`], [`DocumentRef`], [`WatchSet`]
//! - [`include`] — walks `!!!include(...)!!!` directives into a [`WatchSet`]
//! - [`command`] — [`CommandSpec`] for external processes
//! - [`config`] — `~/.marped/config.yaml`
//! - [`error`] — [`ConfigError`]

pub mod command;
pub mod config;
pub mod error;
pub mod include;
pub mod types;

pub use command::CommandSpec;
pub use config::Config;
pub use error::ConfigError;
pub use include::resolve;
pub use types::{Canonical, DocumentRef, ReadFailure, WatchSet};
