//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use std::fmt::Write;
use std::path::Path;
use tabled::{Table, Tabled};

use crate::planner::{ExecutionReport, ImportPlan, ImportStatus};
use crate::reconciler::ReconciliationResult;

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// New resource row for table display.
#[derive(Tabled)]
struct NewResourceRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Type")]
    resource_type: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Directory")]
    directory: String,
}

/// Import outcome row for table display.
#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Identifier")]
    identifier: String,
    #[tabled(rename = "Result")]
    result: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Returns true for machine-readable output.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Formats the new resources found by reconciliation.
    ///
    /// Directories are shown relative to `root` when possible.
    #[must_use]
    pub fn format_new_resources(&self, result: &ReconciliationResult, root: &Path) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(result).unwrap_or_default(),
            OutputFormat::Text => Self::format_new_resources_text(result, root),
        }
    }

    fn format_new_resources_text(result: &ReconciliationResult, root: &Path) -> String {
        let mut output = String::new();

        if result.table.is_empty() {
            let _ = writeln!(
                output,
                "{} No new resources - every declared resource is tracked.",
                "✓".green()
            );
        } else {
            let rows: Vec<NewResourceRow> = result
                .table
                .iter()
                .enumerate()
                .map(|(i, r)| NewResourceRow {
                    index: i + 1,
                    resource_type: r.address.resource_type.clone(),
                    name: r.address.name.clone(),
                    directory: Self::relative(&r.source_directory, root),
                })
                .collect();

            let _ = writeln!(output, "\nNew resources");
            output.push_str(&Table::new(rows).to_string());
            output.push('\n');
        }

        let _ = writeln!(
            output,
            "\n{} new, {} tracked, {} declared in {} directories",
            result.table.len().to_string().green(),
            result.tracked,
            result.declared,
            result.directories
        );

        for address in &result.overwritten {
            let _ = writeln!(
                output,
                "{} {address} is declared more than once; the last declaration is used",
                "⚠".yellow()
            );
        }

        output
    }

    /// Formats an import plan before execution.
    #[must_use]
    pub fn format_plan(&self, plan: &ImportPlan) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(plan).unwrap_or_default(),
            OutputFormat::Text => format!("{}\n", plan.summary()),
        }
    }

    /// Formats an execution report.
    #[must_use]
    pub fn format_report(&self, report: &ExecutionReport) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report).unwrap_or_default(),
            OutputFormat::Text => Self::format_report_text(report),
        }
    }

    fn format_report_text(report: &ExecutionReport) -> String {
        let mut output = String::new();

        if !report.outcomes.is_empty() && !report.dry_run {
            let rows: Vec<OutcomeRow> = report
                .outcomes
                .iter()
                .map(|o| OutcomeRow {
                    resource: o.command.address.to_string(),
                    identifier: Self::truncate(&o.command.identifier, 60),
                    result: Self::format_status(o.status),
                })
                .collect();
            output.push_str(&Table::new(rows).to_string());
            output.push('\n');
        }

        let mark = if report.success() {
            "✓".green()
        } else {
            "✗".red()
        };
        let _ = writeln!(output, "\n{mark} {report}");

        for failure in report.failures() {
            if let Some(e) = &failure.error {
                let _ = writeln!(output, "   - {e}");
            }
        }

        output
    }

    /// Formats an import status with color.
    fn format_status(status: ImportStatus) -> String {
        match status {
            ImportStatus::Imported => "imported".green().to_string(),
            ImportStatus::DryRun => "dry run".dimmed().to_string(),
            ImportStatus::Failed => "failed".red().to_string(),
        }
    }

    /// Shows `path` relative to `root`, or as-is outside it.
    fn relative(path: &Path, root: &Path) -> String {
        match path.strip_prefix(root) {
            Ok(relative) if relative.as_os_str().is_empty() => String::from("."),
            Ok(relative) => relative.display().to_string(),
            Err(_) => path.display().to_string(),
        }
    }

    /// Truncates a string to a maximum number of characters.
    fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len {
            s.to_string()
        } else {
            let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
            format!("{kept}...")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::{DeclaredResource, ResourceAddress};
    use crate::reconciler::NewResourceTable;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn result() -> ReconciliationResult {
        let table: NewResourceTable = [DeclaredResource {
            address: ResourceAddress::new("aws_iam_role", "app"),
            fields: BTreeMap::new(),
            source_directory: PathBuf::from("/infra/iam"),
            source_file: PathBuf::from("/infra/iam/main.tf"),
        }]
        .into_iter()
        .collect();

        ReconciliationResult {
            table,
            directories: 1,
            declared: 2,
            tracked: 1,
            overwritten: vec![],
        }
    }

    #[test]
    fn test_text_lists_new_resources() {
        colored::control::set_override(false);
        let text = OutputFormatter::new(OutputFormat::Text)
            .format_new_resources(&result(), Path::new("/infra"));

        assert!(text.contains("aws_iam_role"));
        assert!(text.contains("iam"));
        assert!(text.contains("1 new, 1 tracked, 2 declared in 1 directories"));
    }

    #[test]
    fn test_json_new_resources() {
        let json = OutputFormatter::new(OutputFormat::Json)
            .format_new_resources(&result(), Path::new("/infra"));
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

        assert_eq!(value["table"][0]["address"]["type"], "aws_iam_role");
        assert_eq!(value["table"][0]["address"]["name"], "app");
        assert_eq!(value["tracked"], 1);
    }

    #[test]
    fn test_relative_and_truncate() {
        assert_eq!(OutputFormatter::relative(Path::new("/infra"), Path::new("/infra")), ".");
        assert_eq!(
            OutputFormatter::relative(Path::new("/infra/a/b"), Path::new("/infra")),
            "a/b"
        );
        assert_eq!(OutputFormatter::truncate("abcdef", 10), "abcdef");
        assert_eq!(OutputFormatter::truncate("abcdefghijkl", 8), "abcde...");
    }
}
