// Edge FTU: congestion-reactive forwarding table updates for edge routers
// Copyright (C) 2023 The edge-ftu developers
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Module for executing local programs with a timeout.

use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    process::{Command as StdCommand, Output},
    string::FromUtf8Error,
    time::Duration,
};

use itertools::Itertools;
use thiserror::Error;
use tokio::{process::Command, time::timeout};

/// Default timeout for a single invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// A local program that is invoked with different arguments. Every invocation is bounded by the
/// configured timeout. If the timeout expires, the child process is killed.
///
/// The following example will execute the command `echo hi`:
/// ```rust,no_run
/// use edge_lab::cmd::Executable;
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
///
/// let echo = Executable::new("echo");
/// let stdout = echo.execute_cmd_stdout(&["hi"]).await?;
/// assert_eq!(stdout, "hi\n");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Executable {
    /// Path (or name) of the program
    program: PathBuf,
    /// Arguments that are always passed before the arguments of each invocation
    prefix_args: Vec<String>,
    /// Timeout for a single invocation
    timeout: Duration,
}

impl Executable {
    /// Create a new executable with the [`DEFAULT_TIMEOUT`].
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            prefix_args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Pass `args` to the program before the arguments of each invocation. This can be used to
    /// wrap a program, e.g., `sudo ovs-ofctl` or `sh -c <script> <name>`.
    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.prefix_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Change the timeout of every invocation.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the name of the program, used for logging.
    pub fn name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }

    /// Get the path of the program
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Get the configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Create a raw `tokio` command with the given arguments and with `kill_on_drop = true`, such
    /// that the child is killed once the command (or its output future) is dropped.
    pub fn command(&self, args: &[impl AsRef<OsStr>]) -> Command {
        let mut cmd = Command::from(self.std_command(args));
        log::trace!("[tokio::process::Command] {:?}", cmd);
        cmd.kill_on_drop(true);
        cmd
    }

    /// Create a raw `std` command with the given arguments.
    pub fn std_command(&self, args: &[impl AsRef<OsStr>]) -> StdCommand {
        let mut cmd = StdCommand::new(&self.program);
        cmd.args(&self.prefix_args).args(args);
        cmd
    }

    /// Execute the program and return the bytes of both `STDOUT` and `STDERR`. This function call
    /// will check that the returned exit code is 0, and that the program terminates before the
    /// timeout.
    pub async fn execute_cmd(
        &self,
        args: &[impl AsRef<str> + Sync],
    ) -> Result<(Vec<u8>, Vec<u8>), CmdError> {
        let args: Vec<&str> = args.iter().map(|a| a.as_ref()).collect();
        let name = self.name();
        let cmd_str = || {
            std::iter::once(name.as_str())
                .chain(self.prefix_args.iter().map(String::as_str))
                .chain(args.iter().copied())
                .join(" ")
        };

        log::trace!("`{}`", cmd_str());
        let mut cmd = self.command(args.as_slice());

        let output = match timeout(self.timeout, cmd.output()).await {
            Ok(Ok(out)) => out,
            Ok(Err(e)) => {
                log::error!("{} failed: {}", cmd_str(), e);
                return Err(CmdError::Spawn(cmd_str(), e));
            }
            Err(_) => {
                log::warn!("{} did not terminate within {:?}", cmd_str(), self.timeout);
                return Err(CmdError::Timeout(cmd_str(), self.timeout));
            }
        };

        check_output(output, cmd_str)
    }

    /// Execute the program. Then, check that the status is successful, and return the parsed
    /// `STDOUT`. `STDERR` is only logged.
    pub async fn execute_cmd_stdout(
        &self,
        args: &[impl AsRef<str> + Sync],
    ) -> Result<String, CmdError> {
        let (stdout, stderr) = self.execute_cmd(args).await?;
        if !stderr.is_empty() {
            log::trace!(
                "{} returned non-empty stderr:\nSTDERR:\n{}",
                self.name(),
                String::from_utf8_lossy(&stderr)
            );
        }
        Ok(String::from_utf8(stdout)?)
    }
}

/// Check the output for successful exit code
pub fn check_output<F, S>(output: Output, cmd: F) -> Result<(Vec<u8>, Vec<u8>), CmdError>
where
    F: FnOnce() -> S,
    S: std::fmt::Display,
{
    if output.status.success() {
        Ok((output.stdout, output.stderr))
    } else {
        let cmd = cmd().to_string();
        log::debug!(
            "{} exited with exit code {}{}{}",
            cmd,
            output.status.code().unwrap_or_default(),
            if !output.stdout.is_empty() {
                format!("\nSTDOUT:\n{}", String::from_utf8_lossy(&output.stdout))
            } else {
                String::new()
            },
            if !output.stderr.is_empty() {
                format!("\nSTDERR:\n{}", String::from_utf8_lossy(&output.stderr))
            } else {
                String::new()
            }
        );
        Err(CmdError::CommandError(
            cmd,
            output.status.code().unwrap_or_default(),
        ))
    }
}

/// Error kind returned by [`Executable`].
#[derive(Debug, Error)]
pub enum CmdError {
    /// Cannot spawn the program
    #[error("Cannot execute {0}: {1}")]
    Spawn(String, std::io::Error),
    /// The program did not terminate in time.
    #[error("{0} did not terminate within {1:?}")]
    Timeout(String, Duration),
    /// Error while executing a command.
    #[error("Non-zero exit code of command {0}: {1}")]
    CommandError(String, i32),
    /// Cannot parse output as utf8
    #[error("Cannot parse output as UTF-8: {0}")]
    FromUtf8(#[from] FromUtf8Error),
}

impl CmdError {
    /// Returns `true` if the error was caused by a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, CmdError::Timeout(_, _))
    }
}
