//! Renderer configuration.

use pulldown_cmark::Options;

/// Default text of the heading permalink.
pub const DEFAULT_PERMALINK_SYMBOL: &str = "⚭";

/// Heading anchor options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnchorOptions {
    /// Append a permalink to every heading.
    pub permalink: bool,
    /// Text of the permalink.
    pub permalink_symbol: String,
}

impl Default for AnchorOptions {
    fn default() -> Self {
        Self {
            permalink: true,
            permalink_symbol: DEFAULT_PERMALINK_SYMBOL.to_owned(),
        }
    }
}

/// Markdown rendering options.
///
/// Every feature is enabled by default.
#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct MarkdownOptions {
    /// Pass raw HTML through. When disabled, raw HTML is escaped as text.
    pub html: bool,
    /// Turn bare URLs and e-mail addresses into links.
    pub linkify: bool,
    /// Smart quotes, dashes, and symbol replacements like `(c)` → `©`.
    pub typographer: bool,
    /// Heading anchors.
    pub anchors: AnchorOptions,
    /// Highlight fenced code blocks with a known language.
    pub highlight: bool,
    /// Expand `[[toc]]` and `${toc}` placeholders.
    pub toc: bool,
    /// Tables, strikethrough, and task lists.
    pub gfm: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            html: true,
            linkify: true,
            typographer: true,
            anchors: AnchorOptions::default(),
            highlight: true,
            toc: true,
            gfm: true,
        }
    }
}

impl MarkdownOptions {
    /// Convert to pulldown-cmark parser options.
    pub(crate) fn parser_options(&self) -> Options {
        let mut opts = Options::empty();
        if self.gfm {
            opts.insert(Options::ENABLE_TABLES);
            opts.insert(Options::ENABLE_STRIKETHROUGH);
            opts.insert(Options::ENABLE_TASKLISTS);
        }
        // Smart punctuation is applied by the writer so bare links stay intact.
        opts
    }
}
