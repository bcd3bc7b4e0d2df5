//! Human-readable text output formatter

use super::OutputFormatter;
use crate::collector::LintResult;
use crate::diagnostic::{Diagnostic, Severity};
use colored::*;
use std::path::Path;

/// Text formatter with optional color support
pub struct TextFormatter {
    /// Enable colored output
    pub colored: bool,

    /// Show source line with a caret underline
    pub show_source: bool,

    /// Show help text
    pub show_help: bool,

    /// Show the summary line
    pub show_stats: bool,

    /// Show a per-rule breakdown after the summary
    pub show_rule_counts: bool,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self {
            colored: true,
            show_source: true,
            show_help: true,
            show_stats: true,
            show_rule_counts: false,
        }
    }
}

fn severity_style(severity: Severity) -> fn(&str) -> ColoredString {
    match severity {
        Severity::Error => |s| s.red().bold(),
        Severity::Warning => |s| s.yellow().bold(),
        Severity::Info => |s| s.blue(),
    }
}

fn plural(count: usize, one: &str, many: &str) -> String {
    format!("{} {}", count, if count == 1 { one } else { many })
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable colors
    pub fn without_color(mut self) -> Self {
        self.colored = false;
        self
    }

    fn paint(&self, text: &str, style: fn(&str) -> ColoredString) -> String {
        if self.colored {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn severity_str(&self, severity: Severity) -> String {
        self.paint(severity.as_str(), severity_style(severity))
    }

    fn gutter(&self, mark: &str) -> String {
        self.paint(mark, |s| s.blue())
    }

    fn file_header(&self, file: &Path) -> String {
        self.paint(&file.display().to_string(), |s| s.underline())
    }

    fn summary(&self, result: &LintResult) -> String {
        let mut output = format!(
            "\n{} processed",
            plural(result.files_processed, "file", "files")
        );
        if result.files_unlinted > 0 {
            output.push_str(&format!(
                ", {} not linted",
                plural(result.files_unlinted, "file", "files")
            ));
        }

        let counts: Vec<String> = Severity::ALL
            .iter()
            .filter_map(|&severity| {
                let count = result.count(severity);
                let label = plural(count, severity.as_str(), &format!("{}s", severity));
                (count > 0).then(|| self.paint(&label, severity_style(severity)))
            })
            .collect();
        if !counts.is_empty() {
            output.push_str(&format!(": {}", counts.join(", ")));
        }
        output.push('\n');

        if self.show_rule_counts {
            for (rule_id, count) in result.count_by_rule() {
                output.push_str(&format!(
                    "  {:<24} {:>5}\n",
                    self.paint(rule_id, |s| s.cyan()),
                    count
                ));
            }
        }

        output
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, result: &LintResult) -> String {
        let mut output = String::new();
        let mut current: Option<&Path> = None;

        // Diagnostics arrive sorted, so each file forms one run
        for diag in &result.diagnostics {
            let file = diag.location.file.as_path();
            if current != Some(file) {
                if current.is_some() {
                    output.push('\n');
                }
                output.push_str(&self.file_header(file));
                output.push('\n');
                current = Some(file);
            }
            output.push_str(&self.format_diagnostic(diag));
        }

        if self.show_stats {
            output.push_str(&self.summary(result));
        }
        output
    }

    fn format_diagnostic(&self, diag: &Diagnostic) -> String {
        let mut output = format!(
            "{}: {}[{}]: {}\n",
            diag.location,
            self.severity_str(diag.severity),
            self.paint(&diag.rule_id, |s| s.cyan()),
            diag.message
        );

        if self.show_source {
            if let Some(source) = &diag.source_line {
                let line_num = format!("{:>4}", diag.location.line);
                output.push_str(&format!("   {}\n", self.gutter("|")));
                output.push_str(&format!(
                    "{} {} {}\n",
                    self.paint(&line_num, |s| s.blue()),
                    self.gutter("|"),
                    source
                ));

                if diag.location.column > 0 {
                    let padding = " ".repeat(diag.location.column - 1);
                    let underline = "^".repeat(diag.location.length.max(1));
                    output.push_str(&format!(
                        "   {} {}{}\n",
                        self.gutter("|"),
                        padding,
                        self.paint(&underline, |s| s.red())
                    ));
                }
            }
        }

        if self.show_help {
            if let Some(help) = &diag.help {
                output.push_str(&format!("   {} help: {}\n", self.gutter("="), help));
            }
        }

        output
    }
}
