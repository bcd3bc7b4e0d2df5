use crate::classifier::PatternError;
use crate::config::ConfigError;
use crate::diagnostic::Severity;
use crate::rule::{param_str, unknown_parameter, Context, Outcome, Rule, RuleMeta, Violation};
use crate::source::Dialect;
use crate::tree::{Node, NodeKind};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::collections::BTreeMap;

static META: RuleMeta = RuleMeta {
    id: "attribute-order",
    description: "Order attributes by how specifically they identify the element",
    rationale: "A consistent attribute order (id, class, name, data-*, then the rest) makes \
                elements scannable and keeps diffs small.",
    example_bad: "<a href=\"/\" class=\"nav__link\" id=\"home\">Home</a>",
    example_good: "<a id=\"home\" class=\"nav__link\" href=\"/\">Home</a>",
    message: "{detail}",
    dialects: &[Dialect::Markup],
    severity: Severity::Warning,
};

const DEFAULT_ORDER: &[&[&str]] = &[
    &["id"],
    &["class"],
    &["name"],
    &["data-*"],
    &["src", "for", "type", "href", "value"],
    &["title", "alt"],
    &["role", "aria-*"],
];

/// Attribute ordering by rank groups
pub struct AttributeOrder {
    groups: Vec<GlobSet>,
}

impl Default for AttributeOrder {
    fn default() -> Self {
        let groups = DEFAULT_ORDER
            .iter()
            .map(|g| g.iter().map(|p| p.to_string()).collect::<Vec<_>>())
            .collect::<Vec<_>>();
        Self {
            groups: compile(&groups).unwrap_or_default(),
        }
    }
}

fn compile(groups: &[Vec<String>]) -> Result<Vec<GlobSet>, PatternError> {
    groups
        .iter()
        .map(|patterns| {
            let mut builder = GlobSetBuilder::new();
            for pattern in patterns {
                let glob = GlobBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| PatternError {
                        pattern: pattern.clone(),
                        message: e.to_string(),
                    })?;
                builder.add(glob);
            }
            builder.build().map_err(|e| PatternError {
                pattern: patterns.join(", "),
                message: e.to_string(),
            })
        })
        .collect()
}

impl AttributeOrder {
    /// Rank of an attribute name; unmatched names rank after every group
    pub fn rank(&self, name: &str) -> usize {
        self.groups
            .iter()
            .position(|g| g.is_match(name))
            .unwrap_or(self.groups.len())
    }

    /// Parse the `order` parameter: a list whose items are a pattern or a list of patterns
    fn parse_order(value: &serde_yaml::Value) -> Result<Vec<Vec<String>>, ConfigError> {
        let invalid = || ConfigError::invalid_parameter(META.id, "order", "expected a list of patterns or pattern lists");
        let items = value.as_sequence().ok_or_else(invalid)?;

        items
            .iter()
            .map(|item| match item {
                serde_yaml::Value::Sequence(group) => group
                    .iter()
                    .map(|p| param_str(META.id, "order", p).map(str::to_string))
                    .collect(),
                other => param_str(META.id, "order", other).map(|p| vec![p.to_string()]),
            })
            .collect()
    }
}

impl Rule for AttributeOrder {
    fn meta(&self) -> &'static RuleMeta {
        &META
    }

    fn configure(&mut self, params: &BTreeMap<String, serde_yaml::Value>) -> Result<(), ConfigError> {
        for (key, value) in params {
            match key.as_str() {
                "order" => self.groups = compile(&Self::parse_order(value)?)?,
                _ => return Err(unknown_parameter(META.id, key)),
            }
        }
        Ok(())
    }

    fn check(&self, node: &Node, _ctx: &Context<'_>) -> Outcome {
        if !node.is(NodeKind::Element) {
            return Outcome::Pass;
        }

        let mut highest: Option<(usize, &Node)> = None;
        let mut violations = Vec::new();

        for attr in node.attributes() {
            let rank = self.rank(&attr.name);
            match highest {
                Some((top, top_attr)) if rank < top => violations.push(Violation::new(
                    attr.span,
                    format!("'{}' should come before '{}'", attr.name, top_attr.name),
                )),
                Some((top, _)) if rank == top => {}
                _ => highest = Some((rank, attr)),
            }
        }

        Outcome::from_violations(violations)
    }
}
