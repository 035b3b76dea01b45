//! Markdown to HTML renderer for Quill documents.
//!
//! [`MarkdownRenderer`] is configured once with [`MarkdownOptions`] and then
//! renders any number of documents. Rendering is pure: the same input and
//! options always produce the same HTML.
//!
//! On top of `CommonMark` the renderer provides:
//! - Heading anchors with unique IDs and an optional permalink
//! - Syntax highlighting of fenced code into `hljs-*` class spans
//! - Typographic replacements and smart punctuation
//! - Linkification of bare URLs and e-mail addresses
//! - A `[[toc]]` / `${toc}` placeholder expanded into a table of contents
//!
//! # Example
//!
//! ```
//! use quill_renderer::{MarkdownOptions, MarkdownRenderer};
//!
//! let renderer = MarkdownRenderer::new(MarkdownOptions::default());
//! let result = renderer.render("# Hello\n\n**Bold** text");
//! assert!(result.html.starts_with(r#"<h1 id="hello" tabindex="-1">Hello"#));
//! assert_eq!(result.toc[0].id, "hello");
//! ```

mod highlight;
mod linkify;
mod options;
mod renderer;
mod state;
mod toc;
mod typographer;
mod util;

pub use options::{AnchorOptions, MarkdownOptions};
pub use renderer::{MarkdownRenderer, RenderResult};
pub use state::{TocEntry, escape_html, slugify};
