//! Post-decision sanity check.
//!
//! Once a job is marked confined, run one command that correct
//! confinement must block - reading a normally world-readable
//! credential listing - through the confined channel. If the read
//! unexpectedly succeeds, confinement claims to be active but is not,
//! and the job aborts before any job-defined command executes.

use std::collections::HashMap;
use std::path::Path;

use autoarmor_exec::{CommandProber, CommandRequest};
use tracing::info;

use crate::channel::ExecutionChannel;
use crate::error::{ConfineError, Result};

/// File a confined build must not be able to read.
const GUARDED_FILE: &str = "/etc/passwd";

/// Verify a resolved channel really confines.
///
/// Runs once per job, only for the confined variant; pass-through
/// channels return immediately without probing. Launch failures here
/// are job-fatal: a sanity check that cannot run proves nothing.
pub async fn verify_confinement(
    channel: &ExecutionChannel,
    prober: &dyn CommandProber,
    workspace: &Path,
    env: &HashMap<String, String>,
    mask_commands: bool,
) -> Result<()> {
    if !channel.is_confined() {
        return Ok(());
    }

    let request = CommandRequest::from_argv(vec!["cat".to_string(), GUARDED_FILE.to_string()])
        .cwd(workspace)
        .envs(env.clone())
        .quiet(mask_commands)
        .discard_output(true);

    let code = prober.probe(channel.prepare(request)).await?;
    if code.success() {
        return Err(ConfineError::SanityCheckFailed);
    }

    info!("sanity check passed, confinement is working");
    Ok(())
}
