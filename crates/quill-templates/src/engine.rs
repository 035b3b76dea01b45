//! Template rendering.

use std::collections::hash_map::RandomState;
use std::hash::BuildHasher;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use handlebars::{Handlebars, no_escape};
use serde_json::Value;

use crate::cache::{CompiledTemplate, TemplateCache, TemplateCompiler};
use crate::error::TemplateError;
use crate::helpers::PartialHelper;
use crate::resolver::TemplateResolver;

/// Options forwarded to the handlebars registry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HandlebarsOptions {
    /// Fail on missing fields instead of rendering them empty.
    pub strict: bool,
    /// Disable HTML escaping of `{{value}}` expressions.
    pub no_escape: bool,
    /// Do not re-indent multi-line partial output.
    pub prevent_indent: bool,
}

/// Data and layout for one render.
#[derive(Clone, Debug)]
pub struct RenderScope {
    data: Value,
    layout_file: PathBuf,
    /// Placeholder tokens and the HTML they stand for.
    safe: Vec<(String, String)>,
}

impl RenderScope {
    /// Create a scope rendering `data` with `layout_file` as the partial base.
    #[must_use]
    pub fn new(data: Value, layout_file: impl Into<PathBuf>) -> Self {
        Self {
            data,
            layout_file: layout_file.into(),
            safe: Vec::new(),
        }
    }

    /// Set top-level `field` to `html`, emitted unescaped by both `{{field}}`
    /// and `{{{field}}}`.
    ///
    /// The field holds an opaque token while rendering, and the token is
    /// swapped for `html` in the final output. Other fields are escaped as
    /// usual, even when their value equals `html`.
    #[must_use]
    pub fn with_safe(mut self, field: &str, html: impl Into<String>) -> Self {
        let html = html.into();
        let Value::Object(map) = &mut self.data else {
            return self;
        };
        if html.is_empty() {
            // An empty value keeps `{{#if field}}` false.
            map.insert(field.to_owned(), Value::String(html));
            return self;
        }
        let nonce = RandomState::new().hash_one(&html);
        let token = format!("\u{fdd0}quill-safe-{}-{nonce:016x}\u{fdd0}", self.safe.len());
        map.insert(field.to_owned(), Value::String(token.clone()));
        self.safe.push((token, html));
        self
    }

    #[must_use]
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Layout whose directory partials are resolved against.
    #[must_use]
    pub fn layout_file(&self) -> &Path {
        &self.layout_file
    }

    fn restore_safe(&self, mut output: String) -> String {
        for (token, html) in &self.safe {
            if output.contains(token.as_str()) {
                output = output.replace(token.as_str(), html);
            }
        }
        output
    }
}

struct EngineInner {
    resolver: TemplateResolver,
    cache: Arc<TemplateCache>,
    options: HandlebarsOptions,
}

/// Resolves, compiles, and renders templates.
///
/// Cloning is cheap; clones share the resolver and compile cache.
#[derive(Clone)]
pub struct TemplateEngine {
    inner: Arc<EngineInner>,
}

impl TemplateEngine {
    /// Create an engine compiling with handlebars.
    #[must_use]
    pub fn new(resolver: TemplateResolver, options: HandlebarsOptions) -> Self {
        Self::with_cache(resolver, options, Arc::new(TemplateCache::default()))
    }

    /// Create an engine with a custom compiler.
    #[must_use]
    pub fn with_compiler(
        resolver: TemplateResolver,
        options: HandlebarsOptions,
        compiler: impl TemplateCompiler + 'static,
    ) -> Self {
        Self::with_cache(resolver, options, Arc::new(TemplateCache::new(compiler)))
    }

    /// Create an engine sharing an existing cache.
    #[must_use]
    pub fn with_cache(
        resolver: TemplateResolver,
        options: HandlebarsOptions,
        cache: Arc<TemplateCache>,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                resolver,
                cache,
                options,
            }),
        }
    }

    #[must_use]
    pub fn resolver(&self) -> &TemplateResolver {
        &self.inner.resolver
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<TemplateCache> {
        &self.inner.cache
    }

    #[must_use]
    pub fn options(&self) -> HandlebarsOptions {
        self.inner.options
    }

    /// Resolve a layout name to a file.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::LayoutNotFound`] if the file does not exist.
    pub fn resolve_layout(&self, name: &str) -> Result<PathBuf, TemplateError> {
        self.inner.resolver.resolve_layout(name)
    }

    /// Resolve a partial name relative to a layout.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::PartialNotFound`] if no candidate exists.
    pub fn resolve_partial(
        &self,
        name: &str,
        referencing_layout: &Path,
    ) -> Result<PathBuf, TemplateError> {
        self.inner.resolver.resolve_partial(name, referencing_layout)
    }

    /// Compiled template for a resolved path, compiled on first use.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Read`] or [`TemplateError::Compile`].
    pub fn template(&self, path: &Path) -> Result<Arc<CompiledTemplate>, TemplateError> {
        self.inner.cache.get_or_compile(path)
    }

    /// Render a compiled template.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Render`] for handlebars failures, or the
    /// resolution and compile errors of any partial the template includes.
    pub fn render(
        &self,
        template: &CompiledTemplate,
        scope: RenderScope,
    ) -> Result<String, TemplateError> {
        let scope = Arc::new(scope);
        let output = self.render_at_depth(template, &scope, 0)?;
        Ok(scope.restore_safe(output))
    }

    pub(crate) fn render_at_depth(
        &self,
        template: &CompiledTemplate,
        scope: &Arc<RenderScope>,
        depth: usize,
    ) -> Result<String, TemplateError> {
        let options = self.inner.options;
        let failure = Arc::new(Mutex::new(None));

        let mut registry = Handlebars::new();
        registry.set_strict_mode(options.strict);
        registry.set_prevent_indent(options.prevent_indent);
        if options.no_escape {
            registry.register_escape_fn(no_escape);
        }
        registry.register_helper(
            "partial",
            Box::new(PartialHelper::new(
                self.clone(),
                Arc::clone(scope),
                Arc::clone(&failure),
                depth,
            )),
        );

        let name = template.path().to_string_lossy().into_owned();
        registry.register_template(&name, template.template().clone());

        registry.render(&name, scope.data()).map_err(|err| {
            let partial_failure = failure
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            partial_failure.unwrap_or_else(|| TemplateError::Render {
                path: template.path().to_path_buf(),
                message: err.to_string(),
            })
        })
    }
}

impl std::fmt::Debug for TemplateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateEngine")
            .field("resolver", &self.inner.resolver)
            .field("cache", &self.inner.cache)
            .field("options", &self.inner.options)
            .finish()
    }
}
