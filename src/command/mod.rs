//! External command invocation.
//!
//! Every external program the tools depend on is described by a [`Command`] value and run
//! through a [`Runner`]. Success is a zero exit status; there is no timeout, retry or
//! cancellation.
//!
//! Two implementations are provided, [`system::SystemRunner`] and
//! [`memory::RecordingRunner`]. The former spawns real processes. The latter only records
//! what it was asked to run and can be told to fail, for tests.

use crate::error::Error;
use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

pub mod memory;
pub mod system;

pub use memory::RecordingRunner;
pub use system::SystemRunner;

/// `DynRunner` is a type alias for a [`Runner`] shared by every operation of a
/// [`Tools`][crate::tools::Tools] context.
pub type DynRunner = Arc<dyn Runner + Send + Sync>;

/// A program and its arguments. Arguments are passed as-is, never through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl Command {
    /// A command running `program` with no arguments. `program` is looked up in `PATH`
    /// unless it contains a slash.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append every item of `args`, in order.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Build a command from a configured argv, e.g. `["yunohost", "dyndns", "subscribe"]`.
    /// Returns `None` for an empty argv.
    pub fn from_argv<S: AsRef<str>>(argv: &[S]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        let program: &str = program.as_ref();
        Some(Self::new(program).args(args.iter().map(|a| -> &str { a.as_ref() })))
    }

    /// `cp <from> <to>`. Overwrites `to` if it exists.
    pub fn copy(from: &Path, to: &Path) -> Self {
        Self::new("cp").arg(from).arg(to)
    }

    /// `ln -s <target> <link>`. Fails if `link` already exists, so callers remove stale
    /// links first.
    pub fn symlink(target: &Path, link: &Path) -> Self {
        Self::new("ln").arg("-s").arg(target).arg(link)
    }

    /// `service <name> <action>`, e.g. `service postfix restart`.
    pub fn service(name: &str, action: &str) -> Self {
        Self::new("service").arg(name).arg(action)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// How a command terminated. `code` is `None` when the process couldn't be spawned or was
/// killed by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub code: Option<i32>,
}

impl Outcome {
    pub const SUCCESS: Outcome = Outcome { code: Some(0) };

    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// An async trait for running external commands to completion.
#[async_trait::async_trait]
pub trait Runner {
    /// Run `command`, blocking until it exits.
    ///
    /// Failing to spawn is reported as an unsuccessful [`Outcome`], not as an error.
    async fn run(&self, command: &Command) -> Outcome;
}

/// Run each command in order, stopping at the first one that doesn't succeed.
///
/// # Errors
///
/// Returns [`Error::CommandFailed`] carrying `task` on the first non-zero exit.
pub async fn run_all(runner: &DynRunner, task: &'static str, commands: &[Command]) -> Result<(), Error> {
    for command in commands {
        ensure_success(runner, task, command).await?;
    }
    Ok(())
}

/// Run a single command.
///
/// # Errors
///
/// Returns [`Error::CommandFailed`] carrying `task` on a non-zero exit.
pub async fn ensure_success(
    runner: &DynRunner,
    task: &'static str,
    command: &Command,
) -> Result<(), Error> {
    tracing::debug!("running `{command}`");
    let outcome = runner.run(command).await;
    if outcome.success() {
        Ok(())
    } else {
        tracing::error!("`{command}` failed with {:?}", outcome.code);
        Err(Error::CommandFailed { task })
    }
}
