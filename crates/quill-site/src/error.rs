//! Pipeline error types.

use std::fmt;
use std::path::{Path, PathBuf};

use quill_meta::FrontMatterError;
use quill_templates::TemplateError;

use crate::hooks::HookFailure;

/// Pipeline phase, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Read,
    ParseFrontMatter,
    BeforeMarkdown,
    RenderMarkdown,
    AfterMarkdown,
    MarkSafe,
    BeforeCompile,
    ResolveLayout,
    Compile,
    Render,
    AfterCompile,
    Write,
}

impl Phase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::ParseFrontMatter => "parse-front-matter",
            Self::BeforeMarkdown => "before-markdown",
            Self::RenderMarkdown => "render-markdown",
            Self::AfterMarkdown => "after-markdown",
            Self::MarkSafe => "mark-safe",
            Self::BeforeCompile => "before-compile",
            Self::ResolveLayout => "resolve-layout",
            Self::Compile => "compile",
            Self::Render => "render",
            Self::AfterCompile => "after-compile",
            Self::Write => "write",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single document. Other documents are unaffected.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Source file could not be read.
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Front-matter block is unclosed, invalid YAML, or not a mapping.
    #[error("Malformed front-matter in {}: {source}", .path.display())]
    MalformedFrontMatter {
        path: PathBuf,
        #[source]
        source: FrontMatterError,
    },

    /// Layout or partial resolution, compile, or render failure.
    #[error("{}: {source}", .path.display())]
    Template {
        path: PathBuf,
        phase: Phase,
        #[source]
        source: TemplateError,
    },

    /// A hook returned an error.
    #[error("{phase} hook failed for {}: {source}", .path.display())]
    Hook {
        path: PathBuf,
        phase: Phase,
        #[source]
        source: HookFailure,
    },

    /// Rendered output could not be written.
    #[error("Failed to write {}: {source}", .output.display())]
    Write {
        path: PathBuf,
        output: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DocumentError {
    /// Phase the document failed in.
    #[must_use]
    pub fn phase(&self) -> Phase {
        match self {
            Self::Read { .. } => Phase::Read,
            Self::MalformedFrontMatter { .. } => Phase::ParseFrontMatter,
            Self::Template { phase, .. } | Self::Hook { phase, .. } => *phase,
            Self::Write { .. } => Phase::Write,
        }
    }

    /// Document path relative to the content root.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Read { path, .. }
            | Self::MalformedFrontMatter { path, .. }
            | Self::Template { path, .. }
            | Self::Hook { path, .. }
            | Self::Write { path, .. } => path,
        }
    }

    /// Underlying template error, if this is a template failure.
    #[must_use]
    pub fn template_error(&self) -> Option<&TemplateError> {
        match self {
            Self::Template { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Fatal configuration error raised before any document is read.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// No `default` entry in the layout mapping.
    #[error("No `default` layout is configured")]
    MissingDefaultLayout,

    /// The `default` layout maps to a missing file.
    #[error("Default layout does not exist at {}", .0.display())]
    DefaultLayoutNotFound(PathBuf),

    /// Templates directory does not exist.
    #[error("Templates directory not found: {}", .0.display())]
    TemplatesDirNotFound(PathBuf),
}
