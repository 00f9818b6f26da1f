//! Process execution seam.
//!
//! Everything that spawns a process goes through [`CommandRunner`], so state
//! pulls and imports can be replayed in tests without a backend installed.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::Result;

/// Captured output of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Exit code, if the process exited normally.
    pub exit_code: Option<i32>,
}

/// Exit status of a process whose output went to the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStatus {
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Exit code, if the process exited normally.
    pub exit_code: Option<i32>,
}

/// Runs external processes.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `program` with `args` and captures its output.
    ///
    /// A non-zero exit is reported in the output, not as an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be started.
    async fn run(&self, program: &str, args: &[String], cwd: Option<&Path>)
        -> Result<CommandOutput>;

    /// Runs a command line through the shell in `cwd`, inheriting stdio.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell cannot be started.
    async fn run_shell(&self, command_line: &str, cwd: &Path) -> Result<CommandStatus>;
}

/// [`CommandRunner`] backed by real processes.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    shell: PathBuf,
}

impl ProcessRunner {
    /// Creates a runner that uses `shell -c` for command lines.
    #[must_use]
    pub fn new(shell: impl Into<PathBuf>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new("/bin/bash")
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: Option<&Path>,
    ) -> Result<CommandOutput> {
        debug!("Running {program} {}", args.join(" "));

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        let output = command.output().await?;
        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }

    async fn run_shell(&self, command_line: &str, cwd: &Path) -> Result<CommandStatus> {
        debug!("Running in {}: {command_line}", cwd.display());

        let status = Command::new(&self.shell)
            .arg("-c")
            .arg(command_line)
            .current_dir(cwd)
            .status()
            .await?;

        Ok(CommandStatus {
            success: status.success(),
            exit_code: status.code(),
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::TfImportError;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// A call seen by [`ScriptedRunner`].
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum RecordedCall {
        Run { program: String, args: Vec<String> },
        Shell { command_line: String, cwd: PathBuf },
    }

    /// A scripted reply: `Err` holds the message of a spawn failure.
    pub type Scripted<T> = std::result::Result<T, String>;

    /// Replays canned outputs in order and records every call.
    #[derive(Debug, Default)]
    pub struct ScriptedRunner {
        outputs: Mutex<VecDeque<Scripted<CommandOutput>>>,
        statuses: Mutex<VecDeque<Scripted<CommandStatus>>>,
        calls: Mutex<Vec<RecordedCall>>,
    }

    impl ScriptedRunner {
        pub fn with_outputs(outputs: impl IntoIterator<Item = CommandOutput>) -> Self {
            Self::with_output_results(outputs.into_iter().map(Ok))
        }

        pub fn with_output_results(
            outputs: impl IntoIterator<Item = Scripted<CommandOutput>>,
        ) -> Self {
            Self {
                outputs: Mutex::new(outputs.into_iter().collect()),
                ..Self::default()
            }
        }

        pub fn with_statuses(statuses: impl IntoIterator<Item = CommandStatus>) -> Self {
            Self::with_status_results(statuses.into_iter().map(Ok))
        }

        pub fn with_status_results(
            statuses: impl IntoIterator<Item = Scripted<CommandStatus>>,
        ) -> Self {
            Self {
                statuses: Mutex::new(statuses.into_iter().collect()),
                ..Self::default()
            }
        }

        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().expect("calls lock").clone()
        }
    }

    fn spawn_error(message: String) -> TfImportError {
        TfImportError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, message))
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run(
            &self,
            program: &str,
            args: &[String],
            _cwd: Option<&Path>,
        ) -> Result<CommandOutput> {
            self.calls.lock().expect("calls lock").push(RecordedCall::Run {
                program: program.to_string(),
                args: args.to_vec(),
            });
            self.outputs
                .lock()
                .expect("outputs lock")
                .pop_front()
                .unwrap_or_else(|| Ok(CommandOutput::default()))
                .map_err(spawn_error)
        }

        async fn run_shell(&self, command_line: &str, cwd: &Path) -> Result<CommandStatus> {
            self.calls.lock().expect("calls lock").push(RecordedCall::Shell {
                command_line: command_line.to_string(),
                cwd: cwd.to_path_buf(),
            });
            self.statuses
                .lock()
                .expect("statuses lock")
                .pop_front()
                .unwrap_or(Ok(CommandStatus {
                    success: true,
                    exit_code: Some(0),
                }))
                .map_err(spawn_error)
        }
    }
}
