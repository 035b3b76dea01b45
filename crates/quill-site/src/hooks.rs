//! Pipeline hooks.
//!
//! Hooks are invoked at four fixed points of the document pipeline:
//!
//! 1. [`Hooks::before_markdown`]: the body is still markdown
//! 2. [`Hooks::after_markdown`]: the body is HTML, not yet render-safe
//! 3. [`Hooks::before_compile`]: before the layout is resolved, so the
//!    `layout` attribute may still be changed
//! 4. [`Hooks::after_compile`]: receives the rendered output and may
//!    replace it
//!
//! A hook error fails only the document being processed.

use std::error::Error;

use crate::document::Document;

/// Error returned by a hook.
pub type HookFailure = Box<dyn Error + Send + Sync>;

/// Callbacks invoked by the document pipeline. Every method defaults to a no-op.
pub trait Hooks: Send + Sync {
    /// Called after front-matter parsing, before markdown rendering.
    ///
    /// # Errors
    ///
    /// An error fails the document.
    fn before_markdown(&self, _doc: &mut Document) -> Result<(), HookFailure> {
        Ok(())
    }

    /// Called after markdown rendering, before the body is marked render-safe.
    ///
    /// # Errors
    ///
    /// An error fails the document.
    fn after_markdown(&self, _doc: &mut Document) -> Result<(), HookFailure> {
        Ok(())
    }

    /// Called before layout resolution.
    ///
    /// # Errors
    ///
    /// An error fails the document.
    fn before_compile(&self, _doc: &mut Document) -> Result<(), HookFailure> {
        Ok(())
    }

    /// Called with the rendered output. Return `Some` to replace it.
    ///
    /// # Errors
    ///
    /// An error fails the document.
    fn after_compile(
        &self,
        _doc: &mut Document,
        _rendered: &str,
    ) -> Result<Option<String>, HookFailure> {
        Ok(None)
    }
}

/// Hooks that do nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHooks;

impl Hooks for NoHooks {}

type DocumentHook = Box<dyn Fn(&mut Document) -> Result<(), HookFailure> + Send + Sync>;
type CompileHook =
    Box<dyn Fn(&mut Document, &str) -> Result<Option<String>, HookFailure> + Send + Sync>;

/// Hooks built from closures.
///
/// Each `on_*` method sets the closure run by the matching [`Hooks`] method.
///
/// ```
/// use quill_site::FnHooks;
///
/// let hooks = FnHooks::new()
///     .on_before_compile(|doc| {
///         if doc.attributes.contains_key("date") {
///             doc.attributes.insert("layout".into(), "blog".into());
///         }
///         Ok(())
///     })
///     .on_after_compile(|_doc, html| Ok(Some(format!("<!doctype html>\n{html}"))));
/// ```
#[derive(Default)]
pub struct FnHooks {
    before_markdown: Option<DocumentHook>,
    after_markdown: Option<DocumentHook>,
    before_compile: Option<DocumentHook>,
    after_compile: Option<CompileHook>,
}

impl FnHooks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_before_markdown(
        mut self,
        hook: impl Fn(&mut Document) -> Result<(), HookFailure> + Send + Sync + 'static,
    ) -> Self {
        self.before_markdown = Some(Box::new(hook));
        self
    }

    #[must_use]
    pub fn on_after_markdown(
        mut self,
        hook: impl Fn(&mut Document) -> Result<(), HookFailure> + Send + Sync + 'static,
    ) -> Self {
        self.after_markdown = Some(Box::new(hook));
        self
    }

    #[must_use]
    pub fn on_before_compile(
        mut self,
        hook: impl Fn(&mut Document) -> Result<(), HookFailure> + Send + Sync + 'static,
    ) -> Self {
        self.before_compile = Some(Box::new(hook));
        self
    }

    #[must_use]
    pub fn on_after_compile(
        mut self,
        hook: impl Fn(&mut Document, &str) -> Result<Option<String>, HookFailure>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.after_compile = Some(Box::new(hook));
        self
    }
}

impl Hooks for FnHooks {
    fn before_markdown(&self, doc: &mut Document) -> Result<(), HookFailure> {
        self.before_markdown.as_ref().map_or(Ok(()), |hook| hook(doc))
    }

    fn after_markdown(&self, doc: &mut Document) -> Result<(), HookFailure> {
        self.after_markdown.as_ref().map_or(Ok(()), |hook| hook(doc))
    }

    fn before_compile(&self, doc: &mut Document) -> Result<(), HookFailure> {
        self.before_compile.as_ref().map_or(Ok(()), |hook| hook(doc))
    }

    fn after_compile(
        &self,
        doc: &mut Document,
        rendered: &str,
    ) -> Result<Option<String>, HookFailure> {
        self.after_compile
            .as_ref()
            .map_or(Ok(None), |hook| hook(doc, rendered))
    }
}

/// Several hook sets run in registration order.
///
/// The first error stops the chain. For `after_compile`, each hook sees the
/// output left by the previous ones.
#[derive(Default)]
pub struct HookChain {
    hooks: Vec<Box<dyn Hooks>>,
}

impl HookChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook set.
    #[must_use]
    pub fn with(mut self, hooks: impl Hooks + 'static) -> Self {
        self.push(hooks);
        self
    }

    pub fn push(&mut self, hooks: impl Hooks + 'static) {
        self.hooks.push(Box::new(hooks));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl Hooks for HookChain {
    fn before_markdown(&self, doc: &mut Document) -> Result<(), HookFailure> {
        self.hooks.iter().try_for_each(|h| h.before_markdown(doc))
    }

    fn after_markdown(&self, doc: &mut Document) -> Result<(), HookFailure> {
        self.hooks.iter().try_for_each(|h| h.after_markdown(doc))
    }

    fn before_compile(&self, doc: &mut Document) -> Result<(), HookFailure> {
        self.hooks.iter().try_for_each(|h| h.before_compile(doc))
    }

    fn after_compile(
        &self,
        doc: &mut Document,
        rendered: &str,
    ) -> Result<Option<String>, HookFailure> {
        let mut replaced: Option<String> = None;
        for hooks in &self.hooks {
            let current = replaced.as_deref().unwrap_or(rendered);
            if let Some(output) = hooks.after_compile(doc, current)? {
                replaced = Some(output);
            }
        }
        Ok(replaced)
    }
}
