//! Harness error types.

use std::path::PathBuf;
use strider_models::TimerangeError;

/// Structured errors raised by the harness libraries. The runner binary
/// wraps these in `anyhow` with call-site context.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn bot command `{command}`: {detail}")]
    Spawn { command: String, detail: String },

    #[error("missing required file: {0}")]
    MissingFile(PathBuf),

    #[error(transparent)]
    Timerange(#[from] TimerangeError),

    #[error(transparent)]
    Window(#[from] crate::windows::WindowError),
}

impl HarnessError {
    /// Wraps an io::Error with the path it concerned.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HarnessError::Io { path: path.into(), source }
    }
}
