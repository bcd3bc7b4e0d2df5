//! Rule definition and evaluation

use crate::config::{Config, ConfigError};
use crate::diagnostic::Severity;
use crate::source::Dialect;
use crate::token::Span;
use crate::tree::Node;
use std::collections::BTreeMap;
use std::path::Path;

/// Pseudo rule id for a predicate that panicked
pub const RULE_FAULT: &str = "rule-fault";

/// Pseudo rule id for a file that could not be read
pub const FILE_READ_ERROR: &str = "file-read-error";

/// Static description of a rule, used for diagnostics and the rule catalogue
#[derive(Debug, Clone, Copy)]
pub struct RuleMeta {
    /// Unique rule identifier (e.g., "bem-depth")
    pub id: &'static str,

    /// One-line description, shown as diagnostic help
    pub description: &'static str,

    /// Why the convention exists
    pub rationale: &'static str,

    /// Example of non-conforming code
    pub example_bad: &'static str,

    /// Example of conforming code
    pub example_good: &'static str,

    /// Message template; `{detail}`, `{name}` and `{kind}` are substituted
    pub message: &'static str,

    /// Dialects the rule applies to
    pub dialects: &'static [Dialect],

    /// Default severity level
    pub severity: Severity,
}

impl RuleMeta {
    pub fn applies_to(&self, dialect: Dialect) -> bool {
        self.dialects.contains(&dialect)
    }
}

/// One finding of a predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub span: Span,
    pub detail: String,
}

impl Violation {
    pub fn new(span: Span, detail: impl Into<String>) -> Self {
        Self {
            span,
            detail: detail.into(),
        }
    }
}

/// Result of evaluating a rule against one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Violation(Vec<Violation>),
}

impl Outcome {
    /// A single violation
    pub fn violation(span: Span, detail: impl Into<String>) -> Self {
        Outcome::Violation(vec![Violation::new(span, detail)])
    }

    /// `Pass` when no violations were collected
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        if violations.is_empty() {
            Outcome::Pass
        } else {
            Outcome::Violation(violations)
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass)
    }

    pub fn into_violations(self) -> Vec<Violation> {
        match self {
            Outcome::Pass => Vec::new(),
            Outcome::Violation(v) => v,
        }
    }
}

/// Traversal state handed to each predicate. Built per node, never stored.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub file: &'a Path,
    pub dialect: Dialect,
    /// Ancestors from the root down to the parent
    pub ancestors: &'a [&'a Node],
    /// The node and its siblings, in source order
    pub siblings: &'a [Node],
    /// Position of the node within `siblings`
    pub index: usize,
    /// Number of `&__` element selectors on the path to this node, the node included
    pub bem_depth: usize,
}

impl<'a> Context<'a> {
    pub fn parent(&self) -> Option<&'a Node> {
        self.ancestors.last().copied()
    }

    /// Siblings that come before the node
    pub fn preceding_siblings(&self) -> &'a [Node] {
        &self.siblings[..self.index.min(self.siblings.len())]
    }

    pub fn previous_sibling(&self) -> Option<&'a Node> {
        self.preceding_siblings().last()
    }

    /// Full selector of a node with every `&` replaced by its parent selector
    pub fn resolved_selector(&self, node: &Node) -> String {
        let mut resolved = String::new();
        for part in self
            .ancestors
            .iter()
            .copied()
            .chain(std::iter::once(node))
            .filter(|n| n.kind.is_selector_rule())
        {
            let own = part.name.split(',').next().unwrap_or("").trim();
            resolved = if own.contains('&') {
                own.replace('&', &resolved)
            } else if resolved.is_empty() {
                own.to_string()
            } else {
                format!("{} {}", resolved, own)
            };
        }
        resolved
    }
}

/// A lint rule: an independent predicate over (node, context)
pub trait Rule: Send + Sync {
    fn meta(&self) -> &'static RuleMeta;

    fn id(&self) -> &'static str {
        self.meta().id
    }

    /// Apply configured parameters. Unknown or invalid parameters are errors.
    fn configure(&mut self, params: &BTreeMap<String, serde_yaml::Value>) -> Result<(), ConfigError> {
        match params.keys().next() {
            Some(key) => Err(unknown_parameter(self.id(), key)),
            None => Ok(()),
        }
    }

    /// Evaluate the rule against one node
    fn check(&self, node: &Node, ctx: &Context<'_>) -> Outcome;
}

/// Render a message template
pub fn format_message(template: &str, node: &Node, detail: &str) -> String {
    template
        .replace("{detail}", detail)
        .replace("{name}", &node.name)
        .replace("{kind}", &node.kind.to_string())
}

pub fn unknown_parameter(rule: &str, key: &str) -> ConfigError {
    ConfigError::invalid_parameter(rule, key, "unknown parameter")
}

/// Read a non-negative integer parameter no smaller than `min`
pub fn param_usize(rule: &str, key: &str, value: &serde_yaml::Value, min: usize) -> Result<usize, ConfigError> {
    let n = value
        .as_u64()
        .ok_or_else(|| ConfigError::invalid_parameter(rule, key, "expected a non-negative integer"))?;
    let n = usize::try_from(n)
        .map_err(|_| ConfigError::invalid_parameter(rule, key, "value is too large"))?;
    if n < min {
        return Err(ConfigError::invalid_parameter(
            rule,
            key,
            format!("must be at least {}", min),
        ));
    }
    Ok(n)
}

pub fn param_bool(rule: &str, key: &str, value: &serde_yaml::Value) -> Result<bool, ConfigError> {
    value
        .as_bool()
        .ok_or_else(|| ConfigError::invalid_parameter(rule, key, "expected true or false"))
}

pub fn param_str<'v>(rule: &str, key: &str, value: &'v serde_yaml::Value) -> Result<&'v str, ConfigError> {
    value
        .as_str()
        .ok_or_else(|| ConfigError::invalid_parameter(rule, key, "expected a string"))
}

/// A registered rule with its effective settings
pub struct RuleEntry {
    pub rule: Box<dyn Rule>,
    pub severity: Severity,
    pub enabled: bool,
}

impl RuleEntry {
    pub fn meta(&self) -> &'static RuleMeta {
        self.rule.meta()
    }
}

/// The rule registry. Read-only once built.
pub struct RuleSet {
    entries: Vec<RuleEntry>,
}

impl RuleSet {
    /// Registry over the given rules with their default settings
    pub fn new(rules: Vec<Box<dyn Rule>>) -> Self {
        let entries = rules
            .into_iter()
            .map(|rule| RuleEntry {
                severity: rule.meta().severity,
                enabled: true,
                rule,
            })
            .collect();
        Self { entries }
    }

    /// All built-in rules with default settings
    pub fn builtin() -> Self {
        Self::new(crate::rules::builtin_rules())
    }

    /// Built-in rules with configuration overrides applied
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let mut set = Self::builtin();

        for (id, settings) in &config.rules {
            let entry = set
                .entries
                .iter_mut()
                .find(|e| e.rule.id() == id)
                .ok_or_else(|| ConfigError::UnknownRule(id.clone()))?;

            if let Some(enabled) = settings.enabled {
                entry.enabled = enabled;
            }
            if let Some(severity) = settings.severity {
                entry.severity = severity;
            }
            entry.rule.configure(&settings.parameters)?;
            log::debug!("Configured rule {}", id);
        }

        Ok(set)
    }

    pub fn get(&self, id: &str) -> Option<&RuleEntry> {
        self.entries.iter().find(|e| e.rule.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RuleEntry> {
        self.entries.iter()
    }

    /// Enabled rules applying to a dialect
    pub fn active_for(&self, dialect: Dialect) -> impl Iterator<Item = &RuleEntry> {
        self.entries
            .iter()
            .filter(move |e| e.enabled && e.meta().applies_to(dialect))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
