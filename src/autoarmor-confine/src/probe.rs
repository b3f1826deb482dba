//! Host confinement probes.
//!
//! Three yes/no questions about the host, each answered by running one
//! external tool and comparing its exit code to 0. All three are
//! synchronous and side-effecting (a profile load changes host state),
//! so callers run them in order: active-check, wrapper self-test,
//! profile load - each later check assumes the former succeeded.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use autoarmor_exec::{CommandProber, CommandRequest, ExecError};
use tracing::debug;

use crate::error::Result;

/// The confining wrapper tool, also the first token of every wrapped
/// command.
pub const WRAPPER_TOOL: &str = "autoarmor-wrapper";

/// The profile generation/loading tool.
pub const GENPROF_TOOL: &str = "autoarmor-genprof";

/// Kernel parameter that reports whether the confinement subsystem is
/// enabled.
pub const KERNEL_PARAM_PATH: &str = "/sys/module/apparmor/parameters/enabled";

/// Uniquely names the confinement profile for one job run.
///
/// Created fresh per job execution; nothing here is persisted (the
/// external profile tool owns any persistence).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileIdentity {
    workspace_root: PathBuf,
    job_name: String,
}

impl ProfileIdentity {
    /// Name a profile for the given workspace root and job.
    pub fn new(workspace_root: impl Into<PathBuf>, job_name: impl Into<String>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            job_name: job_name.into(),
        }
    }

    /// Derive the identity from a host node root, using the
    /// `<node-root>/workspace` layout convention.
    pub fn for_job(node_root: &Path, job_name: impl Into<String>) -> Self {
        Self::new(node_root.join("workspace"), job_name)
    }

    /// The workspace root the profile is generated for.
    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// The profile name (the job name).
    pub fn profile_name(&self) -> &str {
        &self.job_name
    }

    /// The job's own workspace directory under the workspace root.
    pub fn job_workspace(&self) -> PathBuf {
        self.workspace_root.join(&self.job_name)
    }
}

/// Answers the three host-state questions through a [`CommandProber`].
///
/// Probe commands run in `/` with the job's environment, echo-masked
/// per the configured masking policy.
pub struct ConfinementProbe {
    prober: Arc<dyn CommandProber>,
    env: HashMap<String, String>,
    mask_commands: bool,
}

impl ConfinementProbe {
    /// Create a probe over the given runner and job environment.
    pub fn new(
        prober: Arc<dyn CommandProber>,
        env: HashMap<String, String>,
        mask_commands: bool,
    ) -> Self {
        Self {
            prober,
            env,
            mask_commands,
        }
    }

    fn request(&self, argv: Vec<String>) -> CommandRequest {
        CommandRequest::from_argv(argv)
            .cwd("/")
            .envs(self.env.clone())
            .quiet(self.mask_commands)
            .discard_output(true)
    }

    /// Run one probe, downgrading launch failures to `false`.
    /// Interruption always propagates.
    async fn soft_probe(&self, argv: Vec<String>) -> Result<bool> {
        match self.prober.probe(self.request(argv)).await {
            Ok(code) => Ok(code.success()),
            Err(err @ ExecError::Interrupted { .. }) => Err(err.into()),
            Err(err) => {
                debug!(error = %err, "probe command could not run, treating as failed");
                Ok(false)
            }
        }
    }

    /// Is the confinement subsystem enabled at the kernel level?
    pub async fn is_host_active(&self) -> Result<bool> {
        self.soft_probe(vec![
            "grep".to_string(),
            "Y".to_string(),
            KERNEL_PARAM_PATH.to_string(),
        ])
        .await
    }

    /// Does the wrapper tool pass its own self-test?
    pub async fn is_wrapper_functional(&self) -> Result<bool> {
        self.soft_probe(vec![WRAPPER_TOOL.to_string(), "--self-test".to_string()])
            .await
    }

    /// Generate and load the job's profile. Side-effecting: on success
    /// the host's confinement state now contains the profile.
    pub async fn load_profile(&self, identity: &ProfileIdentity, enforce: bool) -> Result<bool> {
        let mode = if enforce { "enforce" } else { "complain" };
        self.soft_probe(vec![
            GENPROF_TOOL.to_string(),
            identity.workspace_root().display().to_string(),
            identity.profile_name().to_string(),
            mode.to_string(),
        ])
        .await
    }
}
