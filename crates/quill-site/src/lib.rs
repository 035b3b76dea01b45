//! Document pipeline and build driver for Quill.
//!
//! This crate provides:
//! - [`Document`]: the per-file state threaded through every phase
//! - [`Hooks`]: four optional callbacks invoked at fixed phases
//! - [`DocumentPipeline`]: front-matter, markdown, layout, and render for one document
//! - [`BuildDriver`]: walks an input tree and writes the rendered output tree
//!
//! # Quick Start
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use quill_site::{BuildDriver, BuildOptions, DocumentPipeline, PipelineConfig};
//!
//! let config = PipelineConfig::new("templates").with_layout("default", "default.hbs");
//! let pipeline = DocumentPipeline::new(config)?;
//! let report = BuildDriver::new(pipeline, BuildOptions::new("content", "dist")).build()?;
//!
//! for line in report.size_lines() {
//!     eprintln!("{line}");
//! }
//! # Ok(())
//! # }
//! ```

mod build;
mod document;
mod error;
mod hooks;
mod pipeline;
mod scanner;

pub use build::{
    BuildDriver, BuildError, BuildOptions, BuildReport, DEFAULT_EXTENSIONS, WrittenFile,
};
pub use document::{Body, DEFAULT_LAYOUT, Document};
pub use error::{DocumentError, Phase, SetupError};
pub use hooks::{FnHooks, HookChain, HookFailure, Hooks, NoHooks};
pub use pipeline::{
    DEFAULT_TARGET_EXTENSION, DocumentPipeline, PipelineConfig, RenderedDocument,
};

// Re-exported for hook and template authors
pub use quill_meta::Attributes;
pub use quill_renderer::{MarkdownOptions, TocEntry};
pub use quill_templates::{HandlebarsOptions, TemplateError};
