//! Utilities for [`std::process::Command`].

use std::{io, process, sync::Arc};

/// Why a command did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No program was given.
    #[error("empty command provided")]
    Empty,
    /// The program could not be spawned.
    #[error("io error")]
    Io(#[from] io::Error),
    /// The program ran and exited unsuccessfully.
    #[error("non-zero exit status: {}", .0.status)]
    NonZero(Output),
}

/// What a finished command left behind.
#[derive(Debug, Clone)]
pub struct Output {
    /// Exit status.
    pub status: process::ExitStatus,
    /// Captured standard output, lossily decoded.
    pub stdout: String,
    /// Captured standard error, lossily decoded.
    pub stderr: String,
}

impl From<process::Output> for Output {
    fn from(value: process::Output) -> Self {
        Self {
            status: value.status,
            stdout: String::from_utf8_lossy(&value.stdout).to_string(),
            stderr: String::from_utf8_lossy(&value.stderr).to_string(),
        }
    }
}

/// Result of running a command.
pub type Result<T> = std::result::Result<T, Error>;

/// Runs external commands given as literal argument lists. The first element is the program,
/// the rest are passed through untouched: no shell is involved, so nothing needs quoting.
///
/// Implementations block until the command has exited. A zero exit status is success,
/// anything else is reported as [`Error::NonZero`].
pub trait Executor: Send + Sync {
    /// Runs `args[0]` with the remaining arguments.
    fn run(&self, args: &[&str]) -> Result<Output>;
}

impl<E: Executor + ?Sized> Executor for &E {
    fn run(&self, args: &[&str]) -> Result<Output> {
        (**self).run(args)
    }
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn run(&self, args: &[&str]) -> Result<Output> {
        (**self).run(args)
    }
}

impl<E: Executor + ?Sized> Executor for Box<E> {
    fn run(&self, args: &[&str]) -> Result<Output> {
        (**self).run(args)
    }
}

/// Executor spawning real processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct Runner;

impl Executor for Runner {
    fn run(&self, args: &[&str]) -> Result<Output> {
        let (program, rest) = args.split_first().ok_or(Error::Empty)?;
        let mut cmd = process::Command::new(program);
        cmd.args(rest).stderr(process::Stdio::piped()).stdout(process::Stdio::piped());

        tracing::debug!(?cmd, "running command");

        let output: Output = cmd.spawn()?.wait_with_output()?.into();

        if !output.status.success() {
            tracing::debug!(?output.stderr, ?output.status, ?cmd, "command returned non-zero status");
            return Err(Error::NonZero(output));
        }

        Ok(output)
    }
}

/// Joins an argument list for logging.
pub fn display(args: &[&str]) -> String {
    args.join(" ")
}
