//! External command execution.
//!
//! The template only ever talks to the outside world through
//! [`CommandRunner::run`]: a command line goes in, captured stdout comes out.

use crate::error::{Error, Result};
use indexmap::{IndexMap, IndexSet};
use log::debug;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Runs a command line and returns what it printed on stdout.
pub trait CommandRunner {
    fn run(&self, command: &str) -> Result<String>;
}

/// Runs commands through `sh -c`, optionally inside a working directory.
#[derive(Debug, Default)]
pub struct ShellCommandRunner {
    working_dir: Option<PathBuf>,
}

impl ShellCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self { working_dir: Some(dir.as_ref().to_path_buf()) }
    }
}

impl CommandRunner for ShellCommandRunner {
    fn run(&self, command: &str) -> Result<String> {
        debug!("Spawning: sh -c {command:?}");
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command).stdin(Stdio::null());
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let output = cmd.output().map_err(|e| Error::CommandExecutionError {
            command: command.to_string(),
            reason: e.to_string(),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = match stderr.trim() {
                "" => output.status.to_string(),
                msg => format!("{}: {msg}", output.status),
            };
            return Err(Error::CommandExecutionError { command: command.to_string(), reason });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Passes read-only lookups through to a real runner and swallows the rest.
pub struct DryRunCommandRunner<'a> {
    inner: &'a dyn CommandRunner,
    passthrough: IndexSet<String>,
}

impl<'a> DryRunCommandRunner<'a> {
    pub fn new<I, S>(inner: &'a dyn CommandRunner, passthrough: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { inner, passthrough: passthrough.into_iter().map(Into::into).collect() }
    }
}

impl CommandRunner for DryRunCommandRunner<'_> {
    fn run(&self, command: &str) -> Result<String> {
        if self.passthrough.contains(command) {
            return self.inner.run(command);
        }
        debug!("Dry run, not executing: {command}");
        Ok(String::new())
    }
}

#[derive(Debug, Clone)]
enum CannedResponse {
    Output(String),
    Failure(String),
}

/// Canned responses keyed by the exact command line.
///
/// Unregistered commands succeed with empty output. Every command is
/// remembered so callers can check what was asked for and in which order.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    responses: IndexMap<String, CannedResponse>,
    history: RefCell<Vec<String>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_command(mut self, command: impl Into<String>, output: impl Into<String>) -> Self {
        self.responses.insert(command.into(), CannedResponse::Output(output.into()));
        self
    }

    /// Makes `command` fail as if it had exited non-zero.
    pub fn fail_on(mut self, command: impl Into<String>, reason: impl Into<String>) -> Self {
        self.responses.insert(command.into(), CannedResponse::Failure(reason.into()));
        self
    }

    pub fn history(&self) -> Vec<String> {
        self.history.borrow().clone()
    }
}

impl CommandRunner for CommandRegistry {
    fn run(&self, command: &str) -> Result<String> {
        self.history.borrow_mut().push(command.to_string());
        match self.responses.get(command) {
            Some(CannedResponse::Output(output)) => Ok(output.clone()),
            Some(CannedResponse::Failure(reason)) => Err(Error::CommandExecutionError {
                command: command.to_string(),
                reason: reason.clone(),
            }),
            None => Ok(String::new()),
        }
    }
}
