//! Plan executor for running import commands.
//!
//! This module prints every command of an [`ImportPlan`] and, unless in
//! dry-run mode, runs it. A failing import is recorded and the remaining
//! commands still run.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::io::Write;
use tracing::{error, info};

use crate::backend::CommandRunner;
use crate::error::{ExecutionError, Result};

use super::command::ImportCommand;
use super::plan::ImportPlan;

/// Executor for import plans.
#[derive(Debug)]
pub struct ImportExecutor<'a, R: CommandRunner + ?Sized> {
    /// Process runner.
    runner: &'a R,
    /// Print commands without running them.
    dry_run: bool,
}

/// What happened to one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStatus {
    /// The import ran and exited successfully.
    Imported,
    /// The command was printed only.
    DryRun,
    /// The import could not start or exited with an error.
    Failed,
}

/// Result of a single import command.
#[derive(Debug, Clone, Serialize)]
pub struct ImportOutcome {
    /// The command.
    pub command: ImportCommand,
    /// Outcome status.
    pub status: ImportStatus,
    /// Failure details (if failed).
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<ExecutionError>,
}

/// Result of executing a whole plan.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    /// When execution started.
    pub started_at: DateTime<Utc>,
    /// When execution finished.
    pub finished_at: DateTime<Utc>,
    /// Whether this was a dry run.
    pub dry_run: bool,
    /// Per-command outcomes, in execution order.
    pub outcomes: Vec<ImportOutcome>,
    /// Number of successful imports.
    pub imported: usize,
    /// Number of failed imports.
    pub failed: usize,
}

fn serialize_error<S: Serializer>(
    error: &Option<ExecutionError>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

impl<'a, R: CommandRunner + ?Sized> ImportExecutor<'a, R> {
    /// Creates a new executor.
    #[must_use]
    pub const fn new(runner: &'a R) -> Self {
        Self {
            runner,
            dry_run: false,
        }
    }

    /// Sets dry-run mode.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Executes a plan, writing each command line to `out` before it runs.
    ///
    /// # Errors
    ///
    /// Returns an error only if writing to `out` fails. Import failures are
    /// reported in the [`ExecutionReport`].
    pub async fn execute<W: Write>(&self, plan: &ImportPlan, out: &mut W) -> Result<ExecutionReport> {
        info!(
            "Executing {} import commands{}",
            plan.len(),
            if self.dry_run { " (dry run)" } else { "" }
        );

        let started_at = Utc::now();
        let mut outcomes = Vec::with_capacity(plan.len());

        for command in &plan.commands {
            writeln!(out, "{}", command.command_line)?;
            out.flush()?;

            let outcome = if self.dry_run {
                ImportOutcome {
                    command: command.clone(),
                    status: ImportStatus::DryRun,
                    error: None,
                }
            } else {
                self.run_one(command).await
            };
            outcomes.push(outcome);
        }

        let imported = outcomes
            .iter()
            .filter(|o| o.status == ImportStatus::Imported)
            .count();
        let failed = outcomes
            .iter()
            .filter(|o| o.status == ImportStatus::Failed)
            .count();

        Ok(ExecutionReport {
            started_at,
            finished_at: Utc::now(),
            dry_run: self.dry_run,
            outcomes,
            imported,
            failed,
        })
    }

    async fn run_one(&self, command: &ImportCommand) -> ImportOutcome {
        let address = command.address.to_string();
        let error = match self
            .runner
            .run_shell(&command.command_line, &command.source_directory)
            .await
        {
            Ok(status) if status.success => None,
            Ok(status) => Some(ExecutionError::NonZeroExit {
                address,
                exit_code: status.exit_code,
            }),
            Err(e) => Some(ExecutionError::SpawnFailed {
                address,
                message: e.to_string(),
            }),
        };

        if let Some(e) = &error {
            error!("{e}");
        }

        ImportOutcome {
            command: command.clone(),
            status: if error.is_some() {
                ImportStatus::Failed
            } else {
                ImportStatus::Imported
            },
            error,
        }
    }
}

impl ExecutionReport {
    /// Returns true if no import failed.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.failed == 0
    }

    /// Returns the failed outcomes.
    pub fn failures(&self) -> impl Iterator<Item = &ImportOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == ImportStatus::Failed)
    }
}

impl fmt::Display for ExecutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dry_run {
            return write!(f, "Dry run: {} import commands printed", self.outcomes.len());
        }
        write!(
            f,
            "{} imported, {} failed ({}s)",
            self.imported,
            self.failed,
            (self.finished_at - self.started_at).num_seconds()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::{RecordedCall, ScriptedRunner};
    use crate::backend::{Backend, CommandStatus};
    use crate::declaration::ResourceAddress;
    use crate::resolver::ResolvedResource;
    use std::path::PathBuf;

    fn plan() -> ImportPlan {
        let backend = Backend::terraform("terraform", "-chdir", "/infra");
        let resolved: Vec<ResolvedResource> = ["a", "b", "c"]
            .iter()
            .map(|name| ResolvedResource {
                address: ResourceAddress::new("aws_iam_role", *name),
                identifier: format!("{name}-role"),
                source_directory: PathBuf::from("/infra/iam"),
            })
            .collect();
        ImportPlan::from_resolved(&backend, &resolved)
    }

    fn printed(out: Vec<u8>) -> Vec<String> {
        String::from_utf8(out)
            .expect("utf8 output")
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn test_dry_run_prints_same_commands_without_running() {
        let plan = plan();

        let dry_runner = ScriptedRunner::default();
        let mut dry_out = Vec::new();
        let dry = ImportExecutor::new(&dry_runner)
            .with_dry_run(true)
            .execute(&plan, &mut dry_out)
            .await
            .expect("dry run");

        let live_runner = ScriptedRunner::default();
        let mut live_out = Vec::new();
        let live = ImportExecutor::new(&live_runner)
            .execute(&plan, &mut live_out)
            .await
            .expect("live run");

        assert!(dry_runner.calls().is_empty());
        assert_eq!(printed(dry_out), printed(live_out));
        assert_eq!(dry.imported, 0);
        assert!(dry.outcomes.iter().all(|o| o.status == ImportStatus::DryRun));
        assert_eq!(live.imported, 3);

        let executed: Vec<String> = live_runner
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                RecordedCall::Shell { command_line, cwd } => {
                    assert_eq!(cwd, PathBuf::from("/infra/iam"));
                    Some(command_line)
                }
                RecordedCall::Run { .. } => None,
            })
            .collect();
        assert_eq!(executed, plan.commands.iter().map(|c| c.command_line.clone()).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_later_imports() {
        let plan = plan();
        let runner = ScriptedRunner::with_statuses([
            CommandStatus {
                success: true,
                exit_code: Some(0),
            },
            CommandStatus {
                success: false,
                exit_code: Some(1),
            },
            CommandStatus {
                success: true,
                exit_code: Some(0),
            },
        ]);

        let mut out = Vec::new();
        let report = ImportExecutor::new(&runner)
            .execute(&plan, &mut out)
            .await
            .expect("execution");

        assert_eq!(runner.calls().len(), 3);
        assert_eq!(report.imported, 2);
        assert_eq!(report.failed, 1);
        assert!(!report.success());

        let failure = report.failures().next().expect("one failure");
        assert_eq!(failure.command.address.name, "b");
        assert!(matches!(
            failure.error,
            Some(ExecutionError::NonZeroExit { exit_code: Some(1), .. })
        ));
    }

    #[tokio::test]
    async fn test_spawn_failure_is_recorded_and_batch_continues() {
        let plan = plan();
        let ok = CommandStatus {
            success: true,
            exit_code: Some(0),
        };
        let runner = ScriptedRunner::with_status_results([
            Ok(ok),
            Err(String::from("/bin/bash: not found")),
            Ok(ok),
        ]);

        let mut out = Vec::new();
        let report = ImportExecutor::new(&runner)
            .execute(&plan, &mut out)
            .await
            .expect("execution");

        assert_eq!(runner.calls().len(), 3);
        assert_eq!(printed(out).len(), 3);
        assert_eq!(report.imported, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.outcomes[2].status, ImportStatus::Imported);

        let failure = report.failures().next().expect("one failure");
        assert!(matches!(
            failure.error,
            Some(ExecutionError::SpawnFailed { ref address, ref message })
                if address == "aws_iam_role.b" && message.contains("/bin/bash: not found")
        ));
    }

    #[tokio::test]
    async fn test_empty_plan() {
        let backend = Backend::terraform("terraform", "-chdir", "/infra");
        let plan = ImportPlan::from_resolved(&backend, &[]);
        let runner = ScriptedRunner::default();
        let mut out = Vec::new();

        let report = ImportExecutor::new(&runner)
            .execute(&plan, &mut out)
            .await
            .expect("execution");
        assert!(report.success());
        assert!(out.is_empty());
    }

    #[test]
    fn test_report_serializes_error_text() {
        let report = ExecutionReport {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            dry_run: false,
            outcomes: vec![ImportOutcome {
                command: plan().commands[0].clone(),
                status: ImportStatus::Failed,
                error: Some(ExecutionError::NonZeroExit {
                    address: String::from("aws_iam_role.a"),
                    exit_code: Some(1),
                }),
            }],
            imported: 0,
            failed: 1,
        };

        let json = serde_json::to_value(&report).expect("serializable");
        assert_eq!(json["outcomes"][0]["status"], "failed");
        assert_eq!(
            json["outcomes"][0]["error"],
            "Import of aws_iam_role.a exited with 1"
        );
    }
}
