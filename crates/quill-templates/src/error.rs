//! Template error types.

use std::path::{Path, PathBuf};

/// Template resolution, compilation, or rendering error.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// Layout name resolved to a file that does not exist.
    #[error("Invalid layout: {name} does not exist at {}", .path.display())]
    LayoutNotFound { name: String, path: PathBuf },

    /// No candidate file exists for a partial.
    #[error("Partial `{name}` not found (tried {})", display_paths(.tried))]
    PartialNotFound { name: String, tried: Vec<PathBuf> },

    /// Template source could not be read.
    #[error("Failed to read template {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Template source has a syntax error.
    #[error("Failed to compile template {}: {message}", .path.display())]
    Compile { path: PathBuf, message: String },

    /// Rendering a compiled template failed.
    #[error("Failed to render template {}: {message}", .path.display())]
    Render { path: PathBuf, message: String },

    /// Partials include each other deeper than the allowed limit.
    #[error("Partial `{name}` exceeds the nesting limit of {limit}")]
    PartialDepth { name: String, limit: usize },
}

impl TemplateError {
    /// Template file the error refers to, when there is one.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::LayoutNotFound { path, .. }
            | Self::Read { path, .. }
            | Self::Compile { path, .. }
            | Self::Render { path, .. } => Some(path),
            Self::PartialNotFound { .. } | Self::PartialDepth { .. } => None,
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
