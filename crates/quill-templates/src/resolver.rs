//! Layout and partial file resolution.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::TemplateError;

/// Default extension tried for layouts without an explicit mapping.
pub const DEFAULT_LAYOUT_EXTENSION: &str = "hbs";

/// Default partial extensions, tried in order.
pub const DEFAULT_PARTIAL_EXTENSIONS: [&str; 2] = ["hbs", "handlebars"];

/// Where templates live and how names map to files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateResolverConfig {
    /// Root directory of layouts.
    pub templates_dir: PathBuf,
    /// Explicit layout name to file mappings, relative to `templates_dir`.
    pub layouts: BTreeMap<String, PathBuf>,
    /// Extension appended to unmapped layout names.
    pub layout_extension: String,
    /// Extensions tried, in order, for partial names.
    pub partial_extensions: Vec<String>,
}

impl TemplateResolverConfig {
    /// Create a configuration with default extensions and no layout mappings.
    #[must_use]
    pub fn new(templates_dir: impl Into<PathBuf>) -> Self {
        Self {
            templates_dir: templates_dir.into(),
            layouts: BTreeMap::new(),
            layout_extension: DEFAULT_LAYOUT_EXTENSION.to_owned(),
            partial_extensions: DEFAULT_PARTIAL_EXTENSIONS
                .iter()
                .map(|&ext| ext.to_owned())
                .collect(),
        }
    }

    /// Map a layout name to a file relative to the templates directory.
    #[must_use]
    pub fn with_layout(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.layouts.insert(name.into(), path.into());
        self
    }

    /// Replace the partial extension list.
    #[must_use]
    pub fn with_partial_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.partial_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }
}

/// Resolves layout and partial names to template files.
#[derive(Clone, Debug)]
pub struct TemplateResolver {
    config: TemplateResolverConfig,
}

impl TemplateResolver {
    #[must_use]
    pub fn new(config: TemplateResolverConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &TemplateResolverConfig {
        &self.config
    }

    /// Path a layout name maps to, whether or not the file exists.
    ///
    /// Mapped names use their configured path; other names become
    /// `<templates_dir>/<name>.<layout_extension>`.
    #[must_use]
    pub fn layout_path(&self, name: &str) -> PathBuf {
        match self.config.layouts.get(name) {
            Some(path) => self.config.templates_dir.join(path),
            None => with_extension_appended(
                &self.config.templates_dir.join(name),
                &self.config.layout_extension,
            ),
        }
    }

    /// Resolve a layout name to an existing file.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::LayoutNotFound`] if the mapped file does not exist.
    pub fn resolve_layout(&self, name: &str) -> Result<PathBuf, TemplateError> {
        let path = self.layout_path(name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(TemplateError::LayoutNotFound {
                name: name.to_owned(),
                path,
            })
        }
    }

    /// Resolve a partial name relative to the layout that references it.
    ///
    /// The name is joined with the layout's directory and each configured
    /// extension is tried in order. The first existing file wins.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::PartialNotFound`] listing every candidate if
    /// none exists.
    pub fn resolve_partial(
        &self,
        name: &str,
        referencing_layout: &Path,
    ) -> Result<PathBuf, TemplateError> {
        let dir = referencing_layout.parent().unwrap_or_else(|| Path::new(""));
        let base = dir.join(name);

        let mut tried = Vec::with_capacity(self.config.partial_extensions.len());
        for extension in &self.config.partial_extensions {
            let candidate = with_extension_appended(&base, extension);
            if candidate.is_file() {
                return Ok(candidate);
            }
            tried.push(candidate);
        }

        Err(TemplateError::PartialNotFound {
            name: name.to_owned(),
            tried,
        })
    }
}

/// Append `.ext` without replacing an existing extension (`a.b` → `a.b.hbs`).
fn with_extension_appended(path: &Path, extension: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn setup() -> (TempDir, TemplateResolver) {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::create_dir_all(root.join("b")).unwrap();
        fs::write(root.join("default.hbs"), "{{{body}}}").unwrap();
        fs::write(root.join("a/page.hbs"), r#"{{partial "nav"}}"#).unwrap();
        fs::write(root.join("a/nav.hbs"), "a-nav").unwrap();
        fs::write(root.join("b/nav.hbs"), "b-nav").unwrap();
        fs::write(root.join("a/footer.handlebars"), "footer").unwrap();

        let config = TemplateResolverConfig::new(root).with_layout("page", "a/page.hbs");
        (temp, TemplateResolver::new(config))
    }

    #[test]
    fn test_layout_by_convention() {
        let (temp, resolver) = setup();
        assert_eq!(
            resolver.resolve_layout("default").unwrap(),
            temp.path().join("default.hbs")
        );
    }

    #[test]
    fn test_layout_by_mapping() {
        let (temp, resolver) = setup();
        assert_eq!(
            resolver.resolve_layout("page").unwrap(),
            temp.path().join("a/page.hbs")
        );
    }

    #[test]
    fn test_missing_layout_names_path() {
        let (temp, resolver) = setup();
        let err = resolver.resolve_layout("blog").unwrap_err();
        match err {
            TemplateError::LayoutNotFound { name, path } => {
                assert_eq!(name, "blog");
                assert_eq!(path, temp.path().join("blog.hbs"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_partial_relative_to_layout_directory() {
        let (temp, resolver) = setup();
        let layout = temp.path().join("a/page.hbs");
        assert_eq!(
            resolver.resolve_partial("nav", &layout).unwrap(),
            temp.path().join("a/nav.hbs")
        );
    }

    #[test]
    fn test_partial_second_extension() {
        let (temp, resolver) = setup();
        let layout = temp.path().join("a/page.hbs");
        assert_eq!(
            resolver.resolve_partial("footer", &layout).unwrap(),
            temp.path().join("a/footer.handlebars")
        );
    }

    #[test]
    fn test_partial_not_found_lists_every_candidate() {
        let (temp, resolver) = setup();
        let layout = temp.path().join("default.hbs");
        let err = resolver.resolve_partial("nav", &layout).unwrap_err();
        match err {
            TemplateError::PartialNotFound { name, tried } => {
                assert_eq!(name, "nav");
                assert_eq!(
                    tried,
                    vec![
                        temp.path().join("nav.hbs"),
                        temp.path().join("nav.handlebars")
                    ]
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_custom_partial_extensions() {
        let (temp, resolver) = setup();
        let config = resolver.config().clone().with_partial_extensions(["handlebars"]);
        let resolver = TemplateResolver::new(config);
        let layout = temp.path().join("a/page.hbs");
        assert!(resolver.resolve_partial("nav", &layout).is_err());
        assert!(resolver.resolve_partial("footer", &layout).is_ok());
    }

    #[test]
    fn test_extension_is_appended() {
        assert_eq!(
            with_extension_appended(Path::new("t/post.v2"), "hbs"),
            PathBuf::from("t/post.v2.hbs")
        );
    }
}
