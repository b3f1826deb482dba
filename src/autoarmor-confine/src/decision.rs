//! Confinement decision state machine.
//!
//! Executed once at job setup: `Unresolved -> { Unconfined,
//! ConfinedEnforce, ConfinedComplain, Aborted }`. Abort is terminal;
//! the job is marked failed and no further job commands may run. Each
//! decision branch logs exactly one line.

use tracing::{info, warn};

use crate::channel::ExecutionChannel;
use crate::config::{ConfineConfig, ConfinementMode};
use crate::error::{ConfineError, Result};
use crate::probe::{ConfinementProbe, ProfileIdentity};

/// Resolve the execution channel for one job.
///
/// Reads the configuration snapshot and host probes, in the documented
/// order (active-check, wrapper self-test, profile load), and returns
/// the channel all of the job's commands will launch through. An error
/// aborts the job with a reason distinct per failure kind.
///
/// A failed probe means "assume not confined" or "abort"; nothing is
/// retried.
pub async fn resolve_channel(
    config: &ConfineConfig,
    probe: &ConfinementProbe,
    identity: &ProfileIdentity,
) -> Result<ExecutionChannel> {
    if config.mode == ConfinementMode::Disabled {
        info!("confinement disabled, commands pass through unmodified");
        return Ok(ExecutionChannel::Unconfined);
    }

    if !probe.is_host_active().await? {
        if config.ignore_absence {
            warn!("confinement not active, build will run unconfined");
            return Ok(ExecutionChannel::Unconfined);
        }
        warn!("confinement not active and unconfined builds are not allowed, aborting");
        return Err(ConfineError::HostNotConfined);
    }

    // A broken wrapper is always fatal once host confinement is
    // active: silently running unconfined after claiming confinement
    // would be unsafe, regardless of ignore-absence.
    if !probe.is_wrapper_functional().await? {
        warn!("confinement wrapper self-test failed, aborting");
        return Err(ConfineError::WrapperBroken);
    }

    info!(
        workspace = %identity.job_workspace().display(),
        profile = identity.profile_name(),
        "loading confinement profile"
    );
    if !probe
        .load_profile(identity, config.mode.is_enforce())
        .await?
    {
        return Err(ConfineError::ProfileLoadFailed {
            profile: identity.profile_name().to_string(),
        });
    }

    info!(mode = %config.mode, "build confined");
    Ok(ExecutionChannel::confined(
        identity.profile_name(),
        config.mask_commands,
        config.mode.is_enforce(),
    ))
}
