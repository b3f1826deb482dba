//! Command requests and exit codes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Placeholder printed in place of masked argument tokens.
const MASKED_TOKEN: &str = "******";

/// A fully-formed request to launch one external command.
///
/// Invariants: `masks`, when present, has the same length as `argv`;
/// `cwd` is an absolute path the host can access. Wrapping by the
/// confinement layer only ever prepends tokens, so the relative order
/// of the original argv and masks is preserved.
#[derive(Debug, Clone)]
pub struct CommandRequest {
    /// Argument vector; `argv[0]` is the program.
    pub argv: Vec<String>,
    /// Per-token masking flags, same length as `argv` when present.
    /// A masked token is hidden from the console echo.
    pub masks: Option<Vec<bool>>,
    /// Working directory.
    pub cwd: PathBuf,
    /// Environment variables for the child process.
    pub env: HashMap<String, String>,
    /// Suppress the command-line echo for this launch.
    pub quiet: bool,
    /// Discard child stdout/stderr instead of inheriting the host's.
    pub discard_output: bool,
}

impl CommandRequest {
    /// Create a request for the given program with no arguments,
    /// running in `/`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            argv: vec![program.into()],
            masks: None,
            cwd: PathBuf::from("/"),
            env: HashMap::new(),
            quiet: false,
            discard_output: false,
        }
    }

    /// Create a request from a complete argument vector.
    pub fn from_argv(argv: Vec<String>) -> Self {
        Self {
            argv,
            masks: None,
            cwd: PathBuf::from("/"),
            env: HashMap::new(),
            quiet: false,
            discard_output: false,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.argv.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.argv.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }

    /// Set one environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Replace the environment with the given mapping.
    pub fn envs(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Set the masking vector. Must match the argv length; consumers
    /// reject mismatched vectors.
    pub fn masks(mut self, masks: Vec<bool>) -> Self {
        self.masks = Some(masks);
        self
    }

    /// Suppress the command-line echo.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Discard child output.
    pub fn discard_output(mut self, discard: bool) -> Self {
        self.discard_output = discard;
        self
    }

    /// The program token, if any.
    pub fn program(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }

    /// The working directory.
    pub fn workdir(&self) -> &Path {
        &self.cwd
    }

    /// Render the command line with masked tokens replaced, suitable
    /// for echoing to the build console. A missing mask vector means
    /// nothing is masked.
    pub fn masked_command_line(&self) -> String {
        match &self.masks {
            None => self.argv.join(" "),
            Some(masks) => self
                .argv
                .iter()
                .enumerate()
                .map(|(i, token)| {
                    if masks.get(i).copied().unwrap_or(false) {
                        MASKED_TOKEN
                    } else {
                        token.as_str()
                    }
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// Raw exit status of an external process.
///
/// Code 0 is "success" by Unix convention; this type does not
/// interpret anything beyond that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Exit code 0.
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Wrap a raw exit code.
    pub fn new(code: i32) -> Self {
        Self(code)
    }

    /// The raw code.
    pub fn code(&self) -> i32 {
        self.0
    }

    /// True iff the process exited 0.
    pub fn success(&self) -> bool {
        self.0 == 0
    }

    /// Convert from the platform exit status. Signal-terminated
    /// processes map to the conventional `128 + signal`.
    pub fn from_status(status: std::process::ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Self(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Self(128 + signal);
            }
        }
        Self(-1)
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
