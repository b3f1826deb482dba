//! Error types for the launch primitive.

use thiserror::Error;

/// Result type alias for launch operations.
pub type Result<T> = std::result::Result<T, ExecError>;

/// Errors produced while launching or waiting on external commands.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The process could not be started at all (missing binary,
    /// permission denied). Distinct from a clean non-zero exit, which
    /// is reported through `ExitCode` and is not an error.
    #[error("failed to launch `{program}`: {source}")]
    LaunchFailure {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The enclosing job was cancelled while a launch or wait was
    /// blocked. Must propagate to the caller; never downgraded to a
    /// failed probe.
    #[error("interrupted while waiting for `{program}`")]
    Interrupted { program: String },

    /// Waiting on an already-started process failed.
    #[error("failed to wait for `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// An empty argument vector was submitted.
    #[error("empty command")]
    EmptyCommand,
}

impl ExecError {
    /// True for job cancellation, which callers must surface as-is.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, ExecError::Interrupted { .. })
    }
}
