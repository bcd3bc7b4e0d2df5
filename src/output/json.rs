//! Structured (JSON) output formatter

use super::OutputFormatter;
use crate::collector::LintResult;
use crate::diagnostic::Diagnostic;
use serde::Serialize;

/// JSON formatter for machine-readable output.
///
/// Emits an array of records with no timing data, so identical runs produce
/// byte-identical output.
#[derive(Default)]
pub struct JsonFormatter {
    /// Pretty print with indentation
    pub pretty: bool,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable pretty printing
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    fn render<T: Serialize>(&self, value: &T) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.unwrap_or_default()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonDiagnostic<'a> {
    file: String,
    line: usize,
    column: usize,
    rule_id: &'a str,
    severity: String,
    message: &'a str,
}

impl<'a> From<&'a Diagnostic> for JsonDiagnostic<'a> {
    fn from(d: &'a Diagnostic) -> Self {
        Self {
            file: d.location.file.display().to_string(),
            line: d.location.line,
            column: d.location.column,
            rule_id: &d.rule_id,
            severity: d.severity.to_string(),
            message: &d.message,
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, result: &LintResult) -> String {
        let records: Vec<JsonDiagnostic<'_>> = result.diagnostics.iter().map(Into::into).collect();
        let mut output = self.render(&records);
        output.push('\n');
        output
    }

    fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        self.render(&JsonDiagnostic::from(diagnostic))
    }
}
