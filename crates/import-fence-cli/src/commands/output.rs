//! Shared output formatting for lint results.

use anyhow::Result;
use import_fence_core::{LintResult, Severity};
use std::fmt::Write;

use crate::OutputFormat;

/// Print lint results in the specified format.
pub fn print(result: &LintResult, format: OutputFormat) -> Result<()> {
    print!("{}", render(result, format, true)?);
    Ok(())
}

/// Renders lint results; `color` enables ANSI colors in text output.
pub fn render(result: &LintResult, format: OutputFormat, color: bool) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => render_text(result, color),
        OutputFormat::Json => render_json(result)?,
        OutputFormat::Compact => render_compact(result),
    })
}

fn paint(text: &str, code: &str, color: bool) -> String {
    if color {
        format!("\x1b[{code}m{text}\x1b[0m")
    } else {
        text.to_string()
    }
}

fn render_text(result: &LintResult, color: bool) -> String {
    let (errors, warnings, infos) = result.count_by_severity();
    let mut out = String::new();

    for violation in &result.violations {
        let severity = match violation.severity {
            Severity::Error => paint("error", "31", color),
            Severity::Warning => paint("warning", "33", color),
            Severity::Info => paint("info", "34", color),
        };

        out.push_str(&violation.format(&severity));
        out.push('\n');
    }

    for degraded in &result.degraded {
        let location = degraded.location.as_ref().map_or_else(
            || degraded.module.clone(),
            |loc| format!("{}:{}:{}", loc.file.display(), loc.line, loc.column),
        );
        let _ = writeln!(
            out,
            "{}: {location}: {degraded}; its imports are not checked",
            paint("note", "36", color)
        );
    }
    if !result.degraded.is_empty() {
        out.push('\n');
    }

    let summary = format!(
        "Found {errors} error(s), {warnings} warning(s), {infos} info(s) in {} module(s)",
        result.modules_checked
    );
    let summary_color = if errors > 0 {
        "31"
    } else if warnings > 0 {
        "33"
    } else {
        "32"
    };
    let _ = writeln!(out, "{}", paint(&summary, summary_color, color));
    out
}

fn render_json(result: &LintResult) -> Result<String> {
    let mut json = serde_json::to_string_pretty(result)?;
    json.push('\n');
    Ok(json)
}

fn render_compact(result: &LintResult) -> String {
    let mut out = String::new();
    for violation in &result.violations {
        let _ = writeln!(out, "{violation}");
    }
    out
}
