//! Error types for confinement decisions.

use autoarmor_exec::ExecError;
use thiserror::Error;

/// Result type alias for confinement operations.
pub type Result<T> = std::result::Result<T, ConfineError>;

/// Job-fatal confinement failures.
///
/// Each variant carries a distinct operator-readable reason so a
/// failed build can be diagnosed from its log alone. All of these mark
/// the job failed and stopped; none are retried.
#[derive(Debug, Error)]
pub enum ConfineError {
    /// The persisted mode is not one of the three recognized values.
    /// Host-wide misconfiguration, not job-specific.
    #[error("confinement configuration is corrupt: {0}")]
    ConfigCorrupt(String),

    /// Host confinement is inactive and the configuration forbids
    /// building without it.
    #[error("confinement is not active on this host and unconfined builds are not allowed")]
    HostNotConfined,

    /// The wrapper self-test failed. Always fatal once host
    /// confinement is active: running unconfined after claiming
    /// confinement would be unsafe.
    #[error("the confinement wrapper self-test failed")]
    WrapperBroken,

    /// The profile tool could not generate/load the job's profile.
    #[error("failed to load confinement profile `{profile}`")]
    ProfileLoadFailed { profile: String },

    /// A confined command could read a file that confinement should
    /// have blocked.
    #[error("sanity check failed: a confined command could read a protected file")]
    SanityCheckFailed,

    /// A launch-primitive failure surfaced past the probe layer,
    /// including job interruption.
    #[error(transparent)]
    Exec(#[from] ExecError),
}

impl ConfineError {
    /// True when the underlying cause is job cancellation.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, ConfineError::Exec(err) if err.is_interrupted())
    }
}
