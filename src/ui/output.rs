//! Output functions for consistent CLI formatting

use super::context::UiContext;
use crate::explanation::{ExplanationRecord, RiskLevel};
use console::{style, Style};

/// Banner style and label for each risk level
fn risk_style(level: RiskLevel) -> (Style, &'static str) {
    match level {
        RiskLevel::Critical => (Style::new().white().on_red().bold(), " CRITICAL RISK "),
        RiskLevel::High => (Style::new().red().bold(), "HIGH RISK"),
        RiskLevel::Medium => (Style::new().yellow().bold(), "MEDIUM RISK"),
        RiskLevel::Low => (Style::new().green(), "LOW RISK"),
        RiskLevel::Minimal => (Style::new().cyan(), "MINIMAL RISK"),
        RiskLevel::Unknown => (Style::new().magenta().dim(), "UNKNOWN RISK"),
    }
}

fn risk_marker(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Critical => "!!",
        RiskLevel::High => "!",
        RiskLevel::Medium => "~",
        RiskLevel::Low | RiskLevel::Minimal => "-",
        RiskLevel::Unknown => "?",
    }
}

/// Color-coded risk banner, e.g. `[!] HIGH RISK`
pub fn risk_banner(level: RiskLevel) -> String {
    let (banner_style, label) = risk_style(level);
    format!(
        "{} {}",
        banner_style.apply_to(format!("[{}]", risk_marker(level))),
        banner_style.apply_to(label)
    )
}

/// Full explanation text: banner, summary, then every section in order
pub fn format_explanation(record: &ExplanationRecord, from_cache: bool) -> String {
    let mut out = String::new();

    out.push_str(&risk_banner(record.risk_level));
    out.push_str("  ");
    out.push_str(&style(&record.command).bold().to_string());
    if from_cache {
        out.push_str(&format!("  {}", style("(cached)").dim()));
    }
    out.push_str("\n\n");

    out.push_str(&format!("{}\n", style("Summary").bold().underlined()));
    out.push_str(&indent(&record.summary));

    for section in &record.sections {
        out.push('\n');
        out.push_str(&format!("{}\n", style(&section.title).bold().underlined()));
        out.push_str(&indent(&section.content));
    }

    out
}

fn indent(text: &str) -> String {
    text.lines().map(|line| format!("  {}\n", line)).collect()
}

/// Print an explanation to stdout
pub fn explanation(record: &ExplanationRecord, from_cache: bool) {
    println!();
    print!("{}", format_explanation(record, from_cache));
    println!();
}

/// Display a success step
pub fn step_ok(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::success(message).ok();
    } else {
        println!("  {} {}", style("[OK]").green(), message);
    }
}

/// Display a warning step
pub fn step_warn(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::warning(message).ok();
    } else {
        println!("  {} {}", style("[WARN]").yellow(), message);
    }
}

/// Display an error step with detail
pub fn step_error_detail(ctx: &UiContext, message: &str, detail: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::error(format!("{}: {}", message, style(detail).red())).ok();
    } else {
        println!("  {} {}: {}", style("[FAIL]").red(), message, detail);
    }
}

/// Display an info step
pub fn step_info(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::info(message).ok();
    } else {
        println!("  {} {}", style("[INFO]").cyan(), message);
    }
}

/// Display a remark/hint
pub fn remark(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::remark(message).ok();
    } else {
        println!("  {}", style(message).dim());
    }
}
