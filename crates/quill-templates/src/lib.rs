//! Handlebars layouts and partials for Quill.
//!
//! The crate is split into three pieces:
//!
//! - [`TemplateResolver`]: maps layout names and partial names to files
//! - [`TemplateCache`]: compiles each resolved file once and reuses it
//! - [`TemplateEngine`]: renders a compiled layout with a JSON context and
//!   provides the `{{partial "name"}}` helper
//!
//! Partials are resolved relative to the directory of the layout being
//! rendered, so `templates/blog/post.hbs` calling `{{partial "nav"}}` uses
//! `templates/blog/nav.hbs` (or `nav.handlebars`).
//!
//! # Example
//!
//! ```no_run
//! use quill_templates::{
//!     HandlebarsOptions, RenderScope, TemplateEngine, TemplateResolver, TemplateResolverConfig,
//! };
//! use serde_json::json;
//!
//! let config = TemplateResolverConfig::new("templates").with_layout("default", "default.hbs");
//! let engine = TemplateEngine::new(TemplateResolver::new(config), HandlebarsOptions::default());
//!
//! let layout = engine.resolve_layout("default")?;
//! let template = engine.template(&layout)?;
//! let html = engine.render(
//!     &template,
//!     RenderScope::new(json!({"title": "Hi"}), layout).with_safe("body", "<p>x</p>"),
//! )?;
//! # Ok::<(), quill_templates::TemplateError>(())
//! ```

mod cache;
mod engine;
mod error;
mod helpers;
mod resolver;

pub use cache::{CompiledTemplate, HandlebarsCompiler, TemplateCache, TemplateCompiler};
pub use engine::{HandlebarsOptions, RenderScope, TemplateEngine};
pub use error::TemplateError;
pub use helpers::MAX_PARTIAL_DEPTH;
pub use resolver::{
    DEFAULT_LAYOUT_EXTENSION, DEFAULT_PARTIAL_EXTENSIONS, TemplateResolver, TemplateResolverConfig,
};
