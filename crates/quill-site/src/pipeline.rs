//! Per-document rendering pipeline.
//!
//! Phases run strictly in order and none is skipped:
//!
//! ```text
//! Read → ParseFrontMatter → [before_markdown] → RenderMarkdown → [after_markdown]
//!   → MarkSafe → [before_compile] → ResolveLayout → Compile → Render → [after_compile]
//! ```
//!
//! The first failing phase stops the document and is recorded in the
//! returned [`DocumentError`].

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use quill_meta::parse_front_matter;
use quill_renderer::{MarkdownOptions, MarkdownRenderer};
use quill_templates::{
    HandlebarsCompiler, HandlebarsOptions, RenderScope, TemplateCompiler, TemplateEngine,
    TemplateError, TemplateResolver, TemplateResolverConfig,
};
use serde_json::Value;

use crate::document::{Body, DEFAULT_LAYOUT, Document};
use crate::error::{DocumentError, Phase, SetupError};
use crate::hooks::{HookFailure, Hooks, NoHooks};

/// Default extension of rendered documents.
pub const DEFAULT_TARGET_EXTENSION: &str = "html";

/// Configuration for [`DocumentPipeline`].
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Template locations and layout mappings. Must map `default`.
    pub templates: TemplateResolverConfig,
    pub handlebars: HandlebarsOptions,
    pub markdown: MarkdownOptions,
    /// Extension of output files, without the leading dot.
    pub target_extension: String,
    /// Site-wide data exposed to templates as `site`.
    pub site: Value,
}

impl PipelineConfig {
    /// Create a configuration with defaults and no layout mappings.
    #[must_use]
    pub fn new(templates_dir: impl Into<PathBuf>) -> Self {
        Self {
            templates: TemplateResolverConfig::new(templates_dir),
            handlebars: HandlebarsOptions::default(),
            markdown: MarkdownOptions::default(),
            target_extension: DEFAULT_TARGET_EXTENSION.to_owned(),
            site: Value::Object(serde_json::Map::new()),
        }
    }

    /// Map a layout name to a file relative to the templates directory.
    #[must_use]
    pub fn with_layout(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.templates = self.templates.with_layout(name, path);
        self
    }

    #[must_use]
    pub fn with_site(mut self, site: Value) -> Self {
        self.site = site;
        self
    }
}

/// A rendered document and its final output.
#[derive(Clone, Debug)]
pub struct RenderedDocument {
    pub document: Document,
    pub html: String,
}

/// Renders documents through front-matter, markdown, and layout.
///
/// Owns the template engine and its compile cache, so layouts and partials
/// are compiled once per pipeline.
pub struct DocumentPipeline {
    engine: TemplateEngine,
    markdown: MarkdownRenderer,
    hooks: Box<dyn Hooks>,
    target_extension: String,
    site: Value,
}

impl DocumentPipeline {
    /// Create a pipeline compiling templates with handlebars.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError`] if the templates directory or the default
    /// layout is missing.
    pub fn new(config: PipelineConfig) -> Result<Self, SetupError> {
        Self::with_compiler(config, HandlebarsCompiler)
    }

    /// Create a pipeline with a custom template compiler.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError`] if the templates directory or the default
    /// layout is missing.
    pub fn with_compiler(
        config: PipelineConfig,
        compiler: impl TemplateCompiler + 'static,
    ) -> Result<Self, SetupError> {
        let PipelineConfig {
            templates,
            handlebars,
            markdown,
            target_extension,
            site,
        } = config;

        if !templates.layouts.contains_key(DEFAULT_LAYOUT) {
            return Err(SetupError::MissingDefaultLayout);
        }
        if !templates.templates_dir.is_dir() {
            return Err(SetupError::TemplatesDirNotFound(templates.templates_dir));
        }
        let resolver = TemplateResolver::new(templates);
        let default_layout = resolver.layout_path(DEFAULT_LAYOUT);
        if !default_layout.is_file() {
            return Err(SetupError::DefaultLayoutNotFound(default_layout));
        }

        Ok(Self {
            engine: TemplateEngine::with_compiler(resolver, handlebars, compiler),
            markdown: MarkdownRenderer::new(markdown),
            hooks: Box::new(NoHooks),
            target_extension,
            site,
        })
    }

    /// Replace the hooks invoked for every document.
    #[must_use]
    pub fn with_hooks(mut self, hooks: impl Hooks + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    #[must_use]
    pub fn engine(&self) -> &TemplateEngine {
        &self.engine
    }

    /// Output path for a source path relative to the content root.
    ///
    /// `guide/intro.md` becomes `guide/intro.html`.
    #[must_use]
    pub fn output_path(&self, relative_path: &Path) -> PathBuf {
        relative_path.with_extension(&self.target_extension)
    }

    /// Read a source file and parse its front-matter.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Read`] or [`DocumentError::MalformedFrontMatter`].
    pub fn load(&self, source_path: &Path, relative_path: &Path) -> Result<Document, DocumentError> {
        let raw_text = fs::read_to_string(source_path).map_err(|source| DocumentError::Read {
            path: relative_path.to_path_buf(),
            source,
        })?;

        let mut doc = self.parse(source_path, relative_path, raw_text)?;
        if let Ok(metadata) = fs::metadata(source_path) {
            doc.modified_time = metadata.modified().ok().map(DateTime::<Utc>::from);
            doc.created_time = metadata.created().ok().map(DateTime::<Utc>::from);
        }
        Ok(doc)
    }

    /// Load and render one source file.
    ///
    /// # Errors
    ///
    /// Returns the [`DocumentError`] of the first failing phase.
    pub fn process_file(
        &self,
        source_path: &Path,
        relative_path: &Path,
    ) -> Result<RenderedDocument, DocumentError> {
        let doc = self.load(source_path, relative_path)?;
        self.render(doc)
    }

    /// Render in-memory text as if read from `relative_path`.
    ///
    /// # Errors
    ///
    /// Returns the [`DocumentError`] of the first failing phase.
    pub fn process_text(
        &self,
        relative_path: &Path,
        text: &str,
    ) -> Result<RenderedDocument, DocumentError> {
        let doc = self.parse(relative_path, relative_path, text.to_owned())?;
        self.render(doc)
    }

    /// Run a loaded document through hooks, markdown, and its layout.
    ///
    /// # Errors
    ///
    /// Returns the [`DocumentError`] of the first failing phase.
    pub fn render(&self, mut doc: Document) -> Result<RenderedDocument, DocumentError> {
        let path = doc.relative_path.clone();
        let hook_error = |phase: Phase| {
            let path = path.clone();
            move |source: HookFailure| DocumentError::Hook {
                path,
                phase,
                source,
            }
        };
        let template_error = |phase: Phase| {
            let path = path.clone();
            move |source: TemplateError| DocumentError::Template {
                path,
                phase,
                source,
            }
        };

        self.hooks
            .before_markdown(&mut doc)
            .map_err(hook_error(Phase::BeforeMarkdown))?;

        let markdown = doc.body.as_str().to_owned();
        let rendered = self.markdown.render(&markdown);
        doc.raw_body = Some(markdown);
        doc.body = Body::Html(rendered.html);
        doc.toc = rendered.toc;

        self.hooks
            .after_markdown(&mut doc)
            .map_err(hook_error(Phase::AfterMarkdown))?;

        doc.body.mark_safe();

        self.hooks
            .before_compile(&mut doc)
            .map_err(hook_error(Phase::BeforeCompile))?;

        let layout = doc.layout_name().to_owned();
        let layout_file = self
            .engine
            .resolve_layout(&layout)
            .map_err(template_error(Phase::ResolveLayout))?;
        doc.layout_file = Some(layout_file.clone());

        let template = self
            .engine
            .template(&layout_file)
            .map_err(template_error(Phase::Compile))?;

        let mut scope = RenderScope::new(doc.context(), &layout_file);
        if let Body::Safe(html) = &doc.body {
            scope = scope.with_safe("body", html.clone());
        }
        let html = self
            .engine
            .render(&template, scope)
            .map_err(template_error(Phase::Render))?;

        let html = self
            .hooks
            .after_compile(&mut doc, &html)
            .map_err(hook_error(Phase::AfterCompile))?
            .unwrap_or(html);

        tracing::debug!(
            path = %path.display(),
            layout = %layout,
            bytes = html.len(),
            "Rendered document"
        );
        Ok(RenderedDocument {
            document: doc,
            html,
        })
    }

    fn parse(
        &self,
        source_path: &Path,
        relative_path: &Path,
        raw_text: String,
    ) -> Result<Document, DocumentError> {
        let front_matter =
            parse_front_matter(&raw_text).map_err(|source| DocumentError::MalformedFrontMatter {
                path: relative_path.to_path_buf(),
                source,
            })?;

        Ok(Document {
            source_path: source_path.to_path_buf(),
            relative_path: relative_path.to_path_buf(),
            output_path: self.output_path(relative_path),
            raw_text,
            attributes: front_matter.attributes,
            raw_body: None,
            body: Body::Markdown(front_matter.body),
            toc: Vec::new(),
            layout_file: None,
            modified_time: None,
            created_time: None,
            site: self.site.clone(),
        })
    }
}

impl std::fmt::Debug for DocumentPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentPipeline")
            .field("engine", &self.engine)
            .field("markdown", &self.markdown)
            .field("target_extension", &self.target_extension)
            .finish_non_exhaustive()
    }
}
