//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use std::collections::BTreeSet;

use davmirror_core::{CycleReport, SyncPlan};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print the actions the next cycle would take
    pub fn print_plan(&self, plan: &SyncPlan) {
        match self.format {
            OutputFormat::Human => {
                if plan.is_empty() {
                    println!("Remote is up to date.");
                    return;
                }
                print_section("Delete", &plan.delete);
                print_section("Upload", &plan.load);
                print_section("Replace", &plan.reload);
                println!("\n{} action(s)", plan.len());
            }
            OutputFormat::Json => {
                println!("{}", to_json(plan));
            }
            OutputFormat::Quiet => {
                for name in &plan.delete {
                    println!("delete\t{}", name);
                }
                for name in &plan.load {
                    println!("load\t{}", name);
                }
                for name in &plan.reload {
                    println!("reload\t{}", name);
                }
            }
        }
    }

    /// Print the outcome of a single cycle
    pub fn print_report(&self, report: &CycleReport) {
        match self.format {
            OutputFormat::Human => {
                if let Some(ref reason) = report.skipped {
                    println!("Cycle skipped: {}", reason);
                    return;
                }
                println!(
                    "Deleted: {}  Uploaded: {}  Replaced: {}",
                    report.deleted.len() + report.already_absent.len(),
                    report.uploaded.len(),
                    report.reloaded.len()
                );
                if !report.failed.is_empty() {
                    println!();
                    println!("── Failed ({}) ──", report.failed.len());
                    for failed in &report.failed {
                        println!("{:?} {}: {}", failed.action, failed.name, failed.error);
                    }
                }
            }
            OutputFormat::Json => {
                println!("{}", to_json(report));
            }
            OutputFormat::Quiet => {
                for failed in &report.failed {
                    println!("{}", failed.name);
                }
            }
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_section(title: &str, names: &BTreeSet<String>) {
    if names.is_empty() {
        return;
    }
    println!("{} ({}):", title, names.len());
    for name in names {
        println!("  {}", name);
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        serde_json::json!({"status": "error", "message": e.to_string()}).to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_plan_json() {
        let mut plan = SyncPlan::default();
        plan.load.insert("b.txt".to_string());
        plan.reload.insert("a.txt".to_string());

        let json: serde_json::Value = serde_json::from_str(&to_json(&plan)).unwrap();
        assert_eq!(json["load"][0], "b.txt");
        assert_eq!(json["reload"][0], "a.txt");
        assert_eq!(json["delete"].as_array().unwrap().len(), 0);
    }
}
