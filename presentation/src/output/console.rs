//! Console output formatter for run summaries

use colored::Colorize;
use medqa_domain::{RunSummary, StrategyKind};
use std::path::Path;

/// Formats run summaries and listings for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Enable or disable ANSI colors for everything this crate prints
    pub fn set_color(enabled: bool) {
        colored::control::set_override(enabled);
    }

    /// Format a run summary as a human-readable report
    pub fn format_summary(summary: &RunSummary, run_dir: Option<&Path>) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("MedQA Benchmark Results"));
        output.push('\n');

        output.push_str(&format!(
            "{} {}\n\n",
            "Strategy:".cyan().bold(),
            summary.strategy_name
        ));

        output.push_str(&Self::section_header("Accuracy"));
        output.push_str(&Self::row("Questions", summary.total.to_string()));
        output.push_str(&Self::row("Answered", summary.attempted.to_string()));
        output.push_str(&Self::row("Correct", summary.correct.to_string()));
        output.push_str(&Self::row(
            "Accuracy",
            format!("{:.2}%", summary.accuracy * 100.0).green().bold().to_string(),
        ));

        // Failed questions are reported next to, never inside, the accuracy.
        let failed = if summary.failed > 0 {
            summary.failed.to_string().red().bold().to_string()
        } else {
            summary.failed.to_string()
        };
        output.push_str(&Self::row("Failed", failed));
        output.push_str(&Self::row(
            "Error rate",
            format!("{:.2}%", summary.error_rate * 100.0),
        ));
        for (kind, count) in &summary.errors_by_kind {
            output.push_str(&format!("    {:<26} {}\n", kind.as_str().dimmed(), count));
        }

        output.push_str(&Self::section_header("Cost"));
        output.push_str(&Self::row("Total tokens", summary.total_tokens.to_string()));
        output.push_str(&Self::row("Tokens / question", format!("{:.1}", summary.avg_tokens)));
        output.push_str(&Self::row("Calls / question", format!("{:.2}", summary.avg_calls)));
        output.push_str(&Self::row(
            "Latency / question",
            format!("{:.2}s", summary.avg_latency_seconds),
        ));

        if let Some(dir) = run_dir {
            output.push_str(&format!(
                "\n{} {}\n",
                "Results:".dimmed(),
                dir.display()
            ));
        }

        output.push_str(&Self::footer());
        output
    }

    /// Format a run summary as JSON
    pub fn format_json(summary: &RunSummary) -> String {
        serde_json::to_string_pretty(summary).unwrap_or_else(|_| "{}".to_string())
    }

    /// List every strategy with its description
    pub fn format_strategies() -> String {
        let mut output = format!("{}\n", "Available strategies:".cyan().bold());
        for kind in StrategyKind::ALL {
            output.push_str(&format!("  {:<34} {}\n", kind.as_str().bold(), kind.description()));
        }
        output
    }

    fn row(label: &str, value: String) -> String {
        format!("  {:<28} {}\n", label, value)
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}
