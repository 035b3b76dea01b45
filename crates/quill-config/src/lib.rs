//! Configuration management for Quill.
//!
//! Parses `quill.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! Directory and layout strings support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `content.source_dir`
//! - `content.templates_dir`
//! - `content.output_dir`
//! - `layouts.<name>`

mod expand;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    pub source_dir: Option<PathBuf>,
    pub templates_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub fail_fast: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "quill.toml";

/// Name of the layout every document falls back to.
pub const DEFAULT_LAYOUT: &str = "default";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Content locations (paths are relative strings from TOML).
    content: ContentConfigRaw,
    /// Layout names mapped to files relative to the templates directory.
    layouts: BTreeMap<String, String>,
    pub markdown: MarkdownConfig,
    pub handlebars: HandlebarsConfig,
    pub build: BuildConfig,
    /// Site-wide data exposed to templates as `site`.
    pub data: toml::Table,

    /// Resolved content configuration (set after loading).
    #[serde(skip)]
    pub content_resolved: ContentConfig,
    /// Resolved layout mappings (set after loading).
    #[serde(skip)]
    pub layouts_resolved: BTreeMap<String, PathBuf>,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw content configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ContentConfigRaw {
    source_dir: Option<String>,
    templates_dir: Option<String>,
    output_dir: Option<String>,
    extensions: Option<Vec<String>>,
    target_extension: Option<String>,
}

/// Resolved content configuration with absolute paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentConfig {
    /// Root of the markdown tree.
    pub source_dir: PathBuf,
    /// Root of layouts and partials.
    pub templates_dir: PathBuf,
    /// Root of the rendered tree.
    pub output_dir: PathBuf,
    /// Source file extensions to render.
    pub extensions: Vec<String>,
    /// Extension of rendered files, without the leading dot.
    pub target_extension: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self::with_base(Path::new("."))
    }
}

impl ContentConfig {
    fn with_base(base: &Path) -> Self {
        Self {
            source_dir: base.join("content"),
            templates_dir: base.join("templates"),
            output_dir: base.join("dist"),
            extensions: vec!["md".to_owned(), "markdown".to_owned()],
            target_extension: "html".to_owned(),
        }
    }
}

/// Markdown rendering options.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct MarkdownConfig {
    /// Pass raw HTML through.
    pub html: bool,
    /// Turn bare URLs and e-mail addresses into links.
    pub linkify: bool,
    /// Smart quotes, dashes, and symbol replacements.
    pub typographer: bool,
    /// Highlight fenced code blocks.
    pub highlight: bool,
    /// Expand `[[toc]]` placeholders.
    pub toc: bool,
    /// Tables, strikethrough, and task lists.
    pub gfm: bool,
    pub anchors: AnchorsConfig,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            html: true,
            linkify: true,
            typographer: true,
            highlight: true,
            toc: true,
            gfm: true,
            anchors: AnchorsConfig::default(),
        }
    }
}

/// Heading anchor options.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AnchorsConfig {
    pub permalink: bool,
    pub permalink_symbol: String,
}

impl Default for AnchorsConfig {
    fn default() -> Self {
        Self {
            permalink: true,
            permalink_symbol: "⚭".to_owned(),
        }
    }
}

/// Options forwarded to the handlebars engine.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HandlebarsConfig {
    /// Fail on missing fields instead of rendering them empty.
    pub strict: bool,
    /// Disable HTML escaping of `{{value}}` expressions.
    pub no_escape: bool,
    /// Do not indent multi-line partial output.
    pub prevent_indent: bool,
    /// Extensions tried, in order, when resolving partials.
    pub partial_extensions: Vec<String>,
    /// Extension appended to layout names without a mapping.
    pub layout_extension: String,
}

impl Default for HandlebarsConfig {
    fn default() -> Self {
        Self {
            strict: false,
            no_escape: false,
            prevent_indent: false,
            partial_extensions: vec!["hbs".to_owned(), "handlebars".to_owned()],
            layout_extension: "hbs".to_owned(),
        }
    }
}

/// Build pass options.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BuildConfig {
    /// Abort at the first failed document.
    pub fail_fast: bool,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`content.source_dir`").
        field: String,
        /// Error message (e.g., "${`SITE_ROOT`} not set").
        message: String,
    },
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a non-empty file extension without a leading dot.
fn require_extension(value: &str, field: &str) -> Result<(), ConfigError> {
    require_non_empty(value, field)?;
    if value.starts_with('.') {
        return Err(ConfigError::Validation(format!(
            "{field} must not start with a dot: {value}"
        )));
    }
    Ok(())
}

fn require_extensions(values: &[String], field: &str) -> Result<(), ConfigError> {
    if values.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    values
        .iter()
        .try_for_each(|value| require_extension(value, field))
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `quill.toml` in the current directory and parents,
    /// falling back to defaults relative to the current directory.
    ///
    /// CLI settings are applied after loading and path resolution.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, or if parsing,
    /// expansion, or validation fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Parse configuration text, resolving paths against `config_dir`.
    ///
    /// # Errors
    ///
    /// Returns error if parsing, expansion, or validation fails.
    pub fn from_toml(text: &str, config_dir: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(text)?;
        config.expand_env_vars()?;
        config.resolve_paths(config_dir);
        config.validate()?;
        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(source_dir) = &settings.source_dir {
            self.content_resolved.source_dir.clone_from(source_dir);
        }
        if let Some(templates_dir) = &settings.templates_dir {
            self.content_resolved.templates_dir.clone_from(templates_dir);
        }
        if let Some(output_dir) = &settings.output_dir {
            self.content_resolved.output_dir.clone_from(output_dir);
        }
        if let Some(fail_fast) = settings.fail_fast {
            self.build.fail_fast = fail_fast;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    fn default_with_base(base: &Path) -> Self {
        Self {
            content: ContentConfigRaw::default(),
            layouts: BTreeMap::new(),
            markdown: MarkdownConfig::default(),
            handlebars: HandlebarsConfig::default(),
            build: BuildConfig::default(),
            data: toml::Table::new(),
            content_resolved: ContentConfig::with_base(base),
            layouts_resolved: BTreeMap::new(),
            config_path: None,
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config_dir = path.parent().unwrap_or(Path::new("."));
        let mut config = Self::from_toml(&content, config_dir)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically when loading from a file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let default = self.layouts_resolved.get(DEFAULT_LAYOUT).ok_or_else(|| {
            ConfigError::Validation(format!("layouts.{DEFAULT_LAYOUT} is required"))
        })?;
        require_non_empty(&default.to_string_lossy(), "layouts.default")?;

        let content = &self.content_resolved;
        require_extension(&content.target_extension, "content.target_extension")?;
        require_extensions(&content.extensions, "content.extensions")?;
        require_extensions(
            &self.handlebars.partial_extensions,
            "handlebars.partial_extensions",
        )?;
        require_extension(&self.handlebars.layout_extension, "handlebars.layout_extension")?;
        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        let content = &mut self.content;
        for (value, field) in [
            (&mut content.source_dir, "content.source_dir"),
            (&mut content.templates_dir, "content.templates_dir"),
            (&mut content.output_dir, "content.output_dir"),
        ] {
            if let Some(dir) = value {
                *dir = expand::expand_env(dir, field)?;
            }
        }

        for (name, path) in &mut self.layouts {
            *path = expand::expand_env(path, &format!("layouts.{name}"))?;
        }
        Ok(())
    }

    /// Resolve relative paths against the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let defaults = ContentConfig::with_base(config_dir);
        let resolve = |path: Option<&str>, default: PathBuf| {
            path.map_or(default, |p| config_dir.join(p))
        };
        let raw = &self.content;

        self.content_resolved = ContentConfig {
            source_dir: resolve(raw.source_dir.as_deref(), defaults.source_dir),
            templates_dir: resolve(raw.templates_dir.as_deref(), defaults.templates_dir),
            output_dir: resolve(raw.output_dir.as_deref(), defaults.output_dir),
            extensions: raw.extensions.clone().unwrap_or(defaults.extensions),
            target_extension: raw
                .target_extension
                .clone()
                .unwrap_or(defaults.target_extension),
        };
        self.layouts_resolved = self
            .layouts
            .iter()
            .map(|(name, path)| (name.clone(), PathBuf::from(path)))
            .collect();
    }
}
