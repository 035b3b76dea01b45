//! Build driver: renders a content tree into an output tree.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::error::DocumentError;
use crate::pipeline::DocumentPipeline;
use crate::scanner::{Entry, Scanner};

/// Default source file extensions.
pub const DEFAULT_EXTENSIONS: [&str; 2] = ["md", "markdown"];

/// Options of a build pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildOptions {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Source extensions to render, matched case-insensitively.
    pub extensions: Vec<String>,
    /// Abort the pass at the first failed document.
    pub fail_fast: bool,
}

impl BuildOptions {
    #[must_use]
    pub fn new(source_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_dir: output_dir.into(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|&e| e.to_owned()).collect(),
            fail_fast: false,
        }
    }
}

/// A file written by a build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WrittenFile {
    /// Source path relative to the source directory.
    pub source: PathBuf,
    /// Output path relative to the output directory.
    pub output: PathBuf,
    pub bytes: u64,
}

/// Outcome of a build pass.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub written: Vec<WrittenFile>,
    /// Directories mirrored into the output tree, relative to it.
    pub directories: Vec<PathBuf>,
    pub failures: Vec<DocumentError>,
}

impl BuildReport {
    /// Whether every document was written.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// One `SIZE\tPATH` line per written file.
    ///
    /// Sizes under 1024 bytes print as `B`, larger ones as rounded `KB`.
    #[must_use]
    pub fn size_lines(&self) -> Vec<String> {
        self.written
            .iter()
            .map(|file| format!("{}\t{}", format_size(file.bytes), file.output.display()))
            .collect()
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes}B")
    } else {
        format!("{}KB", (bytes + 512) / 1024)
    }
}

/// Build pass error. Document failures only end up here with `fail_fast`.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Source directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Invalid extension pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Failed to scan {}: {source}", .path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create directory {}: {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    FailFast(DocumentError),
}

/// Runs a [`DocumentPipeline`] over every source file of a tree.
#[derive(Debug)]
pub struct BuildDriver {
    pipeline: DocumentPipeline,
    options: BuildOptions,
}

impl BuildDriver {
    #[must_use]
    pub fn new(pipeline: DocumentPipeline, options: BuildOptions) -> Self {
        Self { pipeline, options }
    }

    #[must_use]
    pub fn pipeline(&self) -> &DocumentPipeline {
        &self.pipeline
    }

    #[must_use]
    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Render every document and mirror every directory.
    ///
    /// Documents are processed in lexical path order. A failed document is
    /// recorded in the report and the pass moves on, unless `fail_fast` is set.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] if the tree cannot be scanned, an output
    /// directory cannot be created, or a document fails with `fail_fast`.
    pub fn build(&self) -> Result<BuildReport, BuildError> {
        let start = Instant::now();
        let source_dir = &self.options.source_dir;
        let output_dir = &self.options.output_dir;

        if !source_dir.is_dir() {
            return Err(BuildError::SourceNotFound(source_dir.clone()));
        }
        let scanner = Scanner::new(source_dir.clone(), &self.options.extensions)
            .map_err(|(pattern, source)| BuildError::Pattern { pattern, source })?;
        let entries = scanner.scan().map_err(|source| BuildError::Scan {
            path: source_dir.clone(),
            source,
        })?;

        create_dir(output_dir)?;

        let mut report = BuildReport::default();
        for entry in entries {
            match entry {
                Entry::Directory(relative) => {
                    create_dir(&output_dir.join(&relative))?;
                    report.directories.push(relative);
                }
                Entry::Document { source, relative } => {
                    match self.build_document(&source, &relative) {
                        Ok(written) => report.written.push(written),
                        Err(err) => {
                            tracing::warn!(
                                path = %err.path().display(),
                                phase = %err.phase(),
                                error = %err,
                                "Document failed"
                            );
                            if self.options.fail_fast {
                                return Err(BuildError::FailFast(err));
                            }
                            report.failures.push(err);
                        }
                    }
                }
            }
        }

        tracing::info!(
            written = report.written.len(),
            directories = report.directories.len(),
            failed = report.failures.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Build finished"
        );
        Ok(report)
    }

    fn build_document(&self, source: &Path, relative: &Path) -> Result<WrittenFile, DocumentError> {
        let rendered = self.pipeline.process_file(source, relative)?;
        let output = rendered.document.output_path;
        let target = self.options.output_dir.join(&output);

        let write_error = |source: io::Error| DocumentError::Write {
            path: relative.to_path_buf(),
            output: target.clone(),
            source,
        };
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        fs::write(&target, rendered.html.as_bytes()).map_err(write_error)?;

        Ok(WrittenFile {
            source: relative.to_path_buf(),
            output,
            bytes: rendered.html.len() as u64,
        })
    }
}

fn create_dir(path: &Path) -> Result<(), BuildError> {
    fs::create_dir_all(path).map_err(|source| BuildError::OutputDir {
        path: path.to_path_buf(),
        source,
    })
}
