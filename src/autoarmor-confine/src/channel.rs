//! Execution channels.
//!
//! An [`ExecutionChannel`] is "how to launch commands for this job":
//! either the unconfined host channel, or a confined channel holding
//! the wrapper prefix and masking flag. Exactly one channel is active
//! per job; it is immutable once constructed, and a job resolves a new
//! channel only at setup time.

use std::collections::HashMap;

use autoarmor_exec::{AgentChannel, CommandRequest, Launcher, Result, Running};
use tracing::info;

use crate::probe::WRAPPER_TOOL;
use crate::transform::{wrap_command, wrap_masks};

/// How to launch commands for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionChannel {
    /// Pass-through: commands reach the host launcher unmodified.
    Unconfined,
    /// Every launch is prefixed by the confinement wrapper.
    Confined(ConfinedChannel),
}

/// The confined channel variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfinedChannel {
    /// Wrapper prefix tokens: the wrapper tool and the profile name.
    wrapper: Vec<String>,
    /// Hide the wrapper tokens from the console echo.
    mask_wrapper: bool,
    /// Violations are blocked rather than only logged.
    enforce: bool,
}

impl ExecutionChannel {
    /// Build the confined variant for a profile.
    pub fn confined(profile_name: &str, mask_wrapper: bool, enforce: bool) -> Self {
        ExecutionChannel::Confined(ConfinedChannel {
            wrapper: vec![WRAPPER_TOOL.to_string(), profile_name.to_string()],
            mask_wrapper,
            enforce,
        })
    }

    /// True for the confined variant.
    pub fn is_confined(&self) -> bool {
        matches!(self, ExecutionChannel::Confined(_))
    }

    /// True when the confined variant enforces rather than complains.
    pub fn is_enforcing(&self) -> bool {
        matches!(self, ExecutionChannel::Confined(c) if c.enforce)
    }

    /// The wrapper prefix, if confined.
    pub fn wrapper(&self) -> Option<&[String]> {
        match self {
            ExecutionChannel::Unconfined => None,
            ExecutionChannel::Confined(c) => Some(&c.wrapper),
        }
    }

    /// Apply the channel's transform to one launch request.
    ///
    /// For the confined channel: echo the *unwrapped* masked command
    /// line (operators see the job's real command, not wrapper
    /// internals) unless the caller already suppressed it, force the
    /// forwarded request quiet, then prepend the wrapper to the argv
    /// and extend the mask vector to match. Call exactly once per
    /// launch; wrapping is deliberately not idempotent.
    pub fn prepare(&self, mut request: CommandRequest) -> CommandRequest {
        let ExecutionChannel::Confined(confined) = self else {
            return request;
        };

        if !request.quiet {
            info!(command = %request.masked_command_line(), "launching confined command");
            request.quiet = true;
        }

        let original_len = request.argv.len();
        request.masks = Some(wrap_masks(
            request.masks.as_deref(),
            original_len,
            confined.wrapper.len(),
            confined.mask_wrapper,
        ));
        request.argv = wrap_command(&request.argv, &confined.wrapper);
        request
    }

    /// Launch a command through this channel.
    pub async fn launch(&self, launcher: &dyn Launcher, request: CommandRequest) -> Result<Running> {
        launcher.launch(self.prepare(request)).await
    }

    /// Open a control channel to a remote execution agent, wrapping
    /// the agent command like any other launch.
    pub async fn launch_channel(
        &self,
        launcher: &dyn Launcher,
        request: CommandRequest,
    ) -> Result<AgentChannel> {
        launcher.launch_channel(self.prepare(request)).await
    }

    /// Kill job processes. Passes straight through: kill targets
    /// already-wrapped processes.
    pub async fn kill(&self, launcher: &dyn Launcher, env: &HashMap<String, String>) -> Result<()> {
        launcher.kill(env).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_request() -> CommandRequest {
        CommandRequest::from_argv(vec![
            "make".to_string(),
            "--token".to_string(),
            "s3cret".to_string(),
        ])
        .masks(vec![false, false, true])
        .cwd("/workspace/my-job")
    }

    #[test]
    fn test_unconfined_prepare_is_identity() {
        let request = build_request();
        let prepared = ExecutionChannel::Unconfined.prepare(request.clone());
        assert_eq!(prepared.argv, request.argv);
        assert_eq!(prepared.masks, request.masks);
        assert!(!prepared.quiet);
    }

    #[test]
    fn test_confined_prepare_prepends_wrapper_and_masks() {
        let channel = ExecutionChannel::confined("my-job", true, true);
        let prepared = channel.prepare(build_request());

        assert_eq!(
            prepared.argv,
            vec!["autoarmor-wrapper", "my-job", "make", "--token", "s3cret"]
        );
        assert_eq!(
            prepared.masks.as_deref(),
            Some(&[true, true, false, false, true][..])
        );
        // The echo has been issued here; the host must not echo again.
        assert!(prepared.quiet);
        // Working directory and ordering of the original tokens are
        // untouched.
        assert_eq!(prepared.workdir(), std::path::Path::new("/workspace/my-job"));
    }

    #[test]
    fn test_confined_prepare_without_masking_policy() {
        let channel = ExecutionChannel::confined("my-job", false, false);
        let request = CommandRequest::new("ls");
        let prepared = channel.prepare(request);

        assert_eq!(
            prepared.masks.as_deref(),
            Some(&[false, false, false][..])
        );
        assert!(!channel.is_enforcing());
    }

    #[test]
    fn test_masks_length_matches_argv_after_transform() {
        let channel = ExecutionChannel::confined("job", true, true);
        let prepared = channel.prepare(build_request());
        assert_eq!(prepared.argv.len(), prepared.masks.as_ref().unwrap().len());
    }

    #[test]
    fn test_wrapper_prefix_is_two_tokens() {
        let channel = ExecutionChannel::confined("my-job", true, false);
        assert_eq!(
            channel.wrapper(),
            Some(&["autoarmor-wrapper".to_string(), "my-job".to_string()][..])
        );
        assert!(channel.is_confined());
        assert!(ExecutionChannel::Unconfined.wrapper().is_none());
    }
}
