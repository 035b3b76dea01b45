//! CLI error types.

use quill_config::ConfigError;
use quill_site::{BuildError, SetupError};

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Setup(#[from] SetupError),

    #[error("{0}")]
    Build(#[from] BuildError),

    #[error("Invalid [data] section: {0}")]
    Data(#[from] serde_json::Error),

    #[error("{count} document(s) failed to render")]
    Failed { count: usize },
}
