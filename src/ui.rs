//! Terminal presentation: role headers, instruction reports, status lines
//!
//! Formatting functions return plain `String`s (colored when the terminal
//! supports it) so the binary decides where they go.

use crate::automode::AutomodeSummary;
use crate::context::TokenUsage;
use crate::executor::InstructionReport;
use colored::Colorize;

/// Longest stretch of instruction output echoed to the terminal
const PREVIEW_LIMIT: usize = 800;

pub fn banner(model: &str, work_dir: &std::path::Path) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", "Groq Engineer".bright_cyan().bold()));
    out.push_str(&format!(
        "{}\n",
        format!("Model: {}  Working directory: {}", model, work_dir.display()).bright_black()
    ));
    out.push_str(&format!(
        "{}\n",
        "Commands: 'exit', 'reset', 'save chat', 'image', 'automode <n>'".bright_black()
    ));
    out
}

pub fn user_prompt() -> String {
    format!("{} ", "You:".bright_green().bold())
}

pub fn assistant_header() -> String {
    format!("{}", "AI:".bright_blue().bold())
}

pub fn system_line(text: &str) -> String {
    format!("{} {}", "System:".bright_yellow().bold(), text)
}

pub fn error_line(err: &dyn std::fmt::Display) -> String {
    format!("{} {}", "Error:".bright_red().bold(), err)
}

/// One applied instruction, with its output shortened for display
pub fn report_line(report: &InstructionReport) -> String {
    match &report.outcome {
        Ok(text) => format!(
            "{} {}\n{}",
            "✓".bright_green(),
            report.instruction,
            preview(text).bright_black()
        ),
        Err(e) => format!("{} {}: {}", "✗".bright_red(), report.instruction, e),
    }
}

pub fn automode_iteration(iteration: u32, budget: u32) -> String {
    format!(
        "{}",
        format!("── automode iteration {}/{} ──", iteration, budget).bright_magenta()
    )
}

pub fn automode_summary(summary: &AutomodeSummary) -> String {
    system_line(&format!(
        "Automode stopped ({}) after {} round-trip(s)",
        summary.reason, summary.round_trips
    ))
}

/// Approximate usage line; the numbers are estimates, not provider counts
pub fn usage_line(usage: &TokenUsage) -> String {
    format!(
        "{}",
        format!(
            "~{} tokens in, ~{} out (~{:.1}% of context)",
            usage.input,
            usage.output,
            usage.percentage()
        )
        .bright_black()
    )
}

fn preview(text: &str) -> String {
    let text = text.trim_end();
    if text.chars().count() <= PREVIEW_LIMIT {
        return text.to_string();
    }
    let cut: String = text.chars().take(PREVIEW_LIMIT).collect();
    format!("{}\n... ({} chars total)", cut, text.chars().count())
}
