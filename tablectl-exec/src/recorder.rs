use std::{os::unix::process::ExitStatusExt as _, process::ExitStatus};

use parking_lot::Mutex;

use crate::command::{self, Error, Executor, Output};

fn exited(code: i32) -> Output {
    Output { status: ExitStatus::from_raw(code << 8), stdout: String::new(), stderr: String::new() }
}

/// Executor that logs every command and reports success without spawning anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRun;

impl Executor for DryRun {
    fn run(&self, args: &[&str]) -> command::Result<Output> {
        if args.is_empty() {
            return Err(Error::Empty);
        }

        tracing::info!(cmd = %command::display(args), "dry run");
        Ok(exited(0))
    }
}

/// Executor recording every command it is asked to run, in order.
///
/// Commands succeed unless they contain one of the token sequences registered with
/// [`Recorder::fail_on`], in which case they exit with status 1. Failed commands are still
/// recorded.
#[derive(Debug, Default)]
pub struct Recorder {
    calls: Mutex<Vec<Vec<String>>>,
    failures: Mutex<Vec<Vec<String>>>,
}

impl Recorder {
    /// Creates a recorder that lets every command succeed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent command containing `tokens` (contiguously) fail.
    pub fn fail_on(&self, tokens: &[&str]) {
        self.failures.lock().push(tokens.iter().map(|t| t.to_string()).collect());
    }

    /// Forgets every pattern registered with [`fail_on`](Self::fail_on).
    pub fn clear_failures(&self) {
        self.failures.lock().clear();
    }

    /// All recorded commands, joined with single spaces.
    pub fn commands(&self) -> Vec<String> {
        self.calls.lock().iter().map(|args| args.join(" ")).collect()
    }

    /// Returns the recorded commands and forgets them.
    pub fn take(&self) -> Vec<String> {
        let calls = std::mem::take(&mut *self.calls.lock());
        calls.into_iter().map(|args| args.join(" ")).collect()
    }

    /// Number of commands recorded so far.
    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }

    /// Whether no command has been recorded.
    pub fn is_empty(&self) -> bool {
        self.calls.lock().is_empty()
    }

    fn should_fail(&self, args: &[&str]) -> bool {
        self.failures.lock().iter().any(|tokens| {
            !tokens.is_empty()
                && args
                    .windows(tokens.len())
                    .any(|window| window.iter().zip(tokens).all(|(a, t)| *a == t.as_str()))
        })
    }
}

impl Executor for Recorder {
    fn run(&self, args: &[&str]) -> command::Result<Output> {
        if args.is_empty() {
            return Err(Error::Empty);
        }

        self.calls.lock().push(args.iter().map(|a| a.to_string()).collect());

        if self.should_fail(args) {
            tracing::debug!(cmd = %command::display(args), "recorder failing command");
            return Err(Error::NonZero(exited(1)));
        }

        Ok(exited(0))
    }
}
