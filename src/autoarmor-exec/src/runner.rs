//! Host launch primitive and probe runner.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{ExecError, Result};
use crate::request::{CommandRequest, ExitCode};

/// The host's process launch primitive.
///
/// The confinement layer only decorates calls into this trait; it
/// never reimplements process management. One implementation exists
/// per host ([`HostLauncher`]); tests substitute their own.
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Start a process and hand back its running handle.
    async fn launch(&self, request: CommandRequest) -> Result<Running>;

    /// Open a bidirectional control channel to a remote execution
    /// agent: the child's stdin/stdout become the channel transport.
    async fn launch_channel(&self, request: CommandRequest) -> Result<AgentChannel>;

    /// Kill every process tagged with the given marker environment
    /// variables.
    async fn kill(&self, env: &HashMap<String, String>) -> Result<()>;
}

/// Handle to a launched process.
#[derive(Debug)]
pub struct Running {
    child: Child,
    program: String,
}

impl Running {
    /// Block until the process terminates and report its exit status.
    pub async fn join(&mut self) -> Result<ExitCode> {
        let status = self
            .child
            .wait()
            .await
            .map_err(|source| ExecError::Wait {
                program: self.program.clone(),
                source,
            })?;
        Ok(ExitCode::from_status(status))
    }

    /// Kill the process. Errors are swallowed; the process may have
    /// already exited.
    pub async fn kill(&mut self) {
        let _ = self.child.kill().await;
    }

    /// The launched program name.
    pub fn program(&self) -> &str {
        &self.program
    }
}

/// A bidirectional control channel to a remote execution agent.
#[derive(Debug)]
pub struct AgentChannel {
    child: Child,
    program: String,
}

impl AgentChannel {
    /// Take the channel's write half (the agent's stdin).
    pub fn take_writer(&mut self) -> Option<ChildStdin> {
        self.child.stdin.take()
    }

    /// Take the channel's read half (the agent's stdout).
    pub fn take_reader(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// Wait for the agent process to terminate.
    pub async fn join(&mut self) -> Result<ExitCode> {
        let status = self
            .child
            .wait()
            .await
            .map_err(|source| ExecError::Wait {
                program: self.program.clone(),
                source,
            })?;
        Ok(ExitCode::from_status(status))
    }
}

/// Launcher implementation over the host operating system.
#[derive(Debug, Default)]
pub struct HostLauncher;

impl HostLauncher {
    /// Create a new host launcher.
    pub fn new() -> Self {
        Self
    }

    fn command(request: &CommandRequest) -> Result<(Command, String)> {
        let program = request
            .program()
            .ok_or(ExecError::EmptyCommand)?
            .to_string();

        let mut cmd = Command::new(&program);
        cmd.args(&request.argv[1..]);
        cmd.current_dir(&request.cwd);
        for (key, value) in &request.env {
            cmd.env(key, value);
        }
        // Stdin is null to keep external tools from blocking on
        // interactive prompts.
        cmd.stdin(Stdio::null());
        if request.discard_output {
            cmd.stdout(Stdio::null());
            cmd.stderr(Stdio::null());
        }
        cmd.kill_on_drop(true);
        Ok((cmd, program))
    }
}

#[async_trait]
impl Launcher for HostLauncher {
    async fn launch(&self, request: CommandRequest) -> Result<Running> {
        let (mut cmd, program) = Self::command(&request)?;
        let child = cmd.spawn().map_err(|source| ExecError::LaunchFailure {
            program: program.clone(),
            source,
        })?;
        Ok(Running { child, program })
    }

    async fn launch_channel(&self, request: CommandRequest) -> Result<AgentChannel> {
        let (mut cmd, program) = Self::command(&request)?;
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        let child = cmd.spawn().map_err(|source| ExecError::LaunchFailure {
            program: program.clone(),
            source,
        })?;
        Ok(AgentChannel { child, program })
    }

    #[cfg(target_os = "linux")]
    async fn kill(&self, env: &HashMap<String, String>) -> Result<()> {
        if env.is_empty() {
            return Ok(());
        }
        for pid in processes_matching_env(env) {
            debug!(pid, "killing process matching job environment");
            // The process may already be gone; ignore failures.
            unsafe {
                let _ = libc::kill(pid, libc::SIGKILL);
            }
        }
        Ok(())
    }

    #[cfg(not(target_os = "linux"))]
    async fn kill(&self, env: &HashMap<String, String>) -> Result<()> {
        debug!(markers = env.len(), "environment-matching kill unsupported on this platform");
        Ok(())
    }
}

/// Scan `/proc` for live processes whose environment contains every
/// given marker variable.
#[cfg(target_os = "linux")]
fn processes_matching_env(env: &HashMap<String, String>) -> Vec<i32> {
    let mut matches = Vec::new();
    let Ok(entries) = std::fs::read_dir("/proc") else {
        return matches;
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(pid) = name.to_str().and_then(|s| s.parse::<i32>().ok()) else {
            continue;
        };
        let Ok(raw) = std::fs::read(entry.path().join("environ")) else {
            continue;
        };
        let proc_env: HashMap<&str, &str> = raw
            .split(|b| *b == 0)
            .filter_map(|pair| std::str::from_utf8(pair).ok())
            .filter_map(|pair| pair.split_once('='))
            .collect();
        let all_present = env
            .iter()
            .all(|(k, v)| proc_env.get(k.as_str()) == Some(&v.as_str()));
        if all_present {
            matches.push(pid);
        }
    }
    matches
}

/// Runs one external command to completion.
///
/// The single synchronous building block behind every confinement
/// probe: no retries, no timeouts (a hang in an external tool hangs
/// the job; that tradeoff is inherited from the host). Cancellation of
/// the enclosing job surfaces as [`ExecError::Interrupted`].
pub struct ProbeRunner {
    launcher: Arc<dyn Launcher>,
    cancel: CancellationToken,
}

impl ProbeRunner {
    /// Create a probe runner over the given launcher, observing the
    /// job's cancellation token.
    pub fn new(launcher: Arc<dyn Launcher>, cancel: CancellationToken) -> Self {
        Self { launcher, cancel }
    }

    /// Run the command to completion and report its raw exit status.
    ///
    /// Exit code 0 is "success" by Unix convention; anything else is a
    /// plain non-zero exit, not an error.
    pub async fn run(&self, request: CommandRequest) -> Result<ExitCode> {
        let program = request.program().unwrap_or_default().to_string();
        let mut running = self.launcher.launch(request).await?;
        tokio::select! {
            code = running.join() => code,
            () = self.cancel.cancelled() => {
                running.kill().await;
                Err(ExecError::Interrupted { program })
            }
        }
    }
}

/// Seam for issuing a single probe command.
///
/// [`ProbeRunner`] is the production implementation; decision-machine
/// tests substitute scripted outcomes.
#[async_trait]
pub trait CommandProber: Send + Sync {
    /// Run one command to completion and report its exit status.
    async fn probe(&self, request: CommandRequest) -> Result<ExitCode>;
}

#[async_trait]
impl CommandProber for ProbeRunner {
    async fn probe(&self, request: CommandRequest) -> Result<ExitCode> {
        self.run(request).await
    }
}
