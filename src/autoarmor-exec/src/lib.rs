//! Autoarmor Exec - Process launch primitive.
//!
//! This crate owns the one seam through which external commands are
//! started on the build host:
//! - [`CommandRequest`] - a fully-formed launch request (argv, masks,
//!   cwd, environment)
//! - [`Launcher`] - the host launch primitive, decorated (never
//!   reimplemented) by the confinement layer
//! - [`ProbeRunner`] - runs one command to completion and reports its
//!   exit status, the only building block the confinement probes use
//!
//! # Exit codes vs. launch failures
//!
//! A process that starts and exits non-zero is *not* an error here;
//! callers receive the raw [`ExitCode`] and interpret it. Only a
//! process that cannot be started at all yields
//! [`ExecError::LaunchFailure`], and a cancelled job yields
//! [`ExecError::Interrupted`] - the two must never be conflated.

mod error;
mod request;
mod runner;

#[cfg(test)]
mod tests;

pub use error::{ExecError, Result};
pub use request::{CommandRequest, ExitCode};
pub use runner::{AgentChannel, CommandProber, HostLauncher, Launcher, ProbeRunner, Running};
