//! Compiled template cache.
//!
//! The cache maps resolved template paths to compiled templates. A miss
//! reads and compiles the file; a hit returns the shared compiled template.
//! Failed compiles are never stored, so a fixed template is picked up on the
//! next lookup. Entries are never invalidated: create a new cache (or call
//! [`TemplateCache::clear`]) when templates change between passes.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use handlebars::Template;

use crate::error::TemplateError;

/// A template compiled from a file.
#[derive(Clone, Debug)]
pub struct CompiledTemplate {
    path: PathBuf,
    template: Template,
}

impl CompiledTemplate {
    /// Compile handlebars `source` loaded from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Compile`] on a syntax error.
    pub fn compile(path: &Path, source: &str) -> Result<Self, TemplateError> {
        let template = Template::compile(source).map_err(|e| TemplateError::Compile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            template,
        })
    }

    /// File the template was compiled from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn template(&self) -> &Template {
        &self.template
    }
}

/// Compiles template sources.
///
/// The cache calls this only on a miss, which makes the trait a natural seam
/// for counting or instrumenting compiles.
pub trait TemplateCompiler: Send + Sync {
    /// Compile `source` read from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Compile`] if the source is invalid.
    fn compile(&self, path: &Path, source: &str) -> Result<CompiledTemplate, TemplateError>;
}

/// Handlebars compiler used by default.
#[derive(Clone, Copy, Debug, Default)]
pub struct HandlebarsCompiler;

impl TemplateCompiler for HandlebarsCompiler {
    fn compile(&self, path: &Path, source: &str) -> Result<CompiledTemplate, TemplateError> {
        CompiledTemplate::compile(path, source)
    }
}

/// Read-through cache from template path to compiled template.
///
/// Safe for concurrent use. When two callers miss on the same path at once,
/// the first inserted entry wins and the later caller receives it.
pub struct TemplateCache {
    compiler: Box<dyn TemplateCompiler>,
    entries: RwLock<HashMap<PathBuf, Arc<CompiledTemplate>>>,
}

impl TemplateCache {
    #[must_use]
    pub fn new(compiler: impl TemplateCompiler + 'static) -> Self {
        Self {
            compiler: Box::new(compiler),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Cached template for `path`, without compiling on a miss.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<Arc<CompiledTemplate>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
    }

    /// Cached template for `path`, reading and compiling it on a miss.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Read`] if the file cannot be read and
    /// [`TemplateError::Compile`] if it does not compile. Neither is cached.
    pub fn get_or_compile(&self, path: &Path) -> Result<Arc<CompiledTemplate>, TemplateError> {
        if let Some(hit) = self.get(path) {
            tracing::trace!(path = %path.display(), "Template cache hit");
            return Ok(hit);
        }

        let source = fs::read_to_string(path).map_err(|source| TemplateError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let compiled = Arc::new(self.compiler.compile(path, &source)?);
        tracing::debug!(path = %path.display(), "Compiled template");

        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(
            entries.entry(path.to_path_buf()).or_insert(compiled),
        ))
    }

    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(path)
    }

    /// Number of cached templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached template.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Default for TemplateCache {
    fn default() -> Self {
        Self::new(HandlebarsCompiler)
    }
}

impl std::fmt::Debug for TemplateCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateCache")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(TemplateCache: Send, Sync);
    assert_impl_all!(CompiledTemplate: Send, Sync);

    struct CountingCompiler(Arc<AtomicUsize>);

    impl TemplateCompiler for CountingCompiler {
        fn compile(&self, path: &Path, source: &str) -> Result<CompiledTemplate, TemplateError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            HandlebarsCompiler.compile(path, source)
        }
    }

    fn counting_cache() -> (TemplateCache, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        (TemplateCache::new(CountingCompiler(Arc::clone(&count))), count)
    }

    #[test]
    fn test_compiles_once_per_path() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("default.hbs");
        fs::write(&path, "<h1>{{title}}</h1>").unwrap();
        let (cache, count) = counting_cache();

        for _ in 0..100 {
            let template = cache.get_or_compile(&path).unwrap();
            assert_eq!(template.path(), path);
        }

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&path));
    }

    #[test]
    fn test_hits_share_the_same_template() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("a.hbs");
        fs::write(&path, "a").unwrap();
        let cache = TemplateCache::default();

        let first = cache.get_or_compile(&path).unwrap();
        let second = cache.get_or_compile(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_compile_failure_is_not_cached() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("broken.hbs");
        fs::write(&path, "{{#if x}}a{{/each}}").unwrap();
        let (cache, count) = counting_cache();

        let err = cache.get_or_compile(&path).unwrap_err();
        assert!(matches!(err, TemplateError::Compile { .. }));
        assert!(cache.is_empty());

        fs::write(&path, "{{#if x}}closed{{/if}}").unwrap();
        cache.get_or_compile(&path).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let temp = tempfile::tempdir().unwrap();
        let cache = TemplateCache::default();
        let err = cache
            .get_or_compile(&temp.path().join("missing.hbs"))
            .unwrap_err();
        assert!(matches!(err, TemplateError::Read { .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear_forces_recompile() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("a.hbs");
        fs::write(&path, "a").unwrap();
        let (cache, count) = counting_cache();

        cache.get_or_compile(&path).unwrap();
        cache.clear();
        assert!(!cache.contains(&path));
        cache.get_or_compile(&path).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_concurrent_misses_share_one_entry() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("a.hbs");
        fs::write(&path, "{{title}}").unwrap();
        let cache = Arc::new(TemplateCache::default());

        let results: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let path = path.clone();
                thread::spawn(move || cache.get_or_compile(&path).unwrap())
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();

        assert_eq!(cache.len(), 1);
        let stored = cache.get(&path).unwrap();
        assert!(results.iter().all(|t| Arc::ptr_eq(t, &stored)));
    }
}
