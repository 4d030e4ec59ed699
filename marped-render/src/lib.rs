//! # marped-render
//!
//! Builds the external command lines marped runs: marp itself (HTML with
//! optional watch/preview, PDF and PPTX conversion), the handout
//! post-processor, monolith packing and the browser preview.
//!
//! Nothing here spawns a process; every builder returns a
//! [`marped_core::CommandSpec`].
//!
//! ```rust,no_run
//! use chrono::Local;
//! use marped_core::Config;
//! use marped_render::{Document, HtmlOptions, MarpEngine, OutputFormat};
//!
//! fn plan(config: &Config) -> Result<(), marped_render::RenderError> {
//!     let engine = MarpEngine::from_config(config);
//!     let doc = Document::new("deck.md")?;
//!     let output = doc.output_path(OutputFormat::Html, "", Local::now().naive_local());
//!     let spec = engine.html(&doc, &output, &HtmlOptions::default());
//!     println!("{spec}");
//!     Ok(())
//! }
//! ```

pub mod document;
pub mod error;
pub mod handout;
pub mod marp;
pub mod output;
pub mod post;
pub mod program;

pub use document::Document;
pub use error::RenderError;
pub use handout::{Handout, HandoutLayout, SlidesPerPage};
pub use marp::{ConvertPreset, HtmlOptions, MarpEngine};
pub use output::{ensure_export_dir, OutputFormat};
