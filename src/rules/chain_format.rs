use crate::config::ConfigError;
use crate::diagnostic::Severity;
use crate::rule::{param_usize, unknown_parameter, Context, Outcome, Rule, RuleMeta};
use crate::source::Dialect;
use crate::tree::{Node, NodeKind};
use std::collections::BTreeMap;

static META: RuleMeta = RuleMeta {
    id: "chain-format",
    description: "Start each call of a long method chain on its own line",
    rationale: "One call per line keeps long chains readable and makes each step show up \
                separately in diffs.",
    example_bad: "$('#items').find('.selected').highlight().end();",
    example_good: "$('#items')\n  .find('.selected')\n    .highlight()\n    .end();",
    message: "{detail}",
    dialects: &[Dialect::Script],
    severity: Severity::Warning,
};

pub const DEFAULT_MIN_LENGTH: usize = 2;

/// Line breaks in method chains
pub struct ChainFormat {
    min_length: usize,
}

impl Default for ChainFormat {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_LENGTH,
        }
    }
}

impl Rule for ChainFormat {
    fn meta(&self) -> &'static RuleMeta {
        &META
    }

    fn configure(&mut self, params: &BTreeMap<String, serde_yaml::Value>) -> Result<(), ConfigError> {
        for (key, value) in params {
            match key.as_str() {
                "min-length" => self.min_length = param_usize(META.id, key, value, 1)?,
                _ => return Err(unknown_parameter(META.id, key)),
            }
        }
        Ok(())
    }

    fn check(&self, node: &Node, _ctx: &Context<'_>) -> Outcome {
        if !node.is(NodeKind::ChainCall) || node.value.len() < self.min_length {
            return Outcome::Pass;
        }

        let same_line = node
            .value
            .windows(2)
            .find(|pair| pair[1].line() == pair[0].line());

        match same_line {
            Some(pair) => Outcome::violation(
                pair[1].span,
                format!(
                    "chain on '{}' has {} calls; start each call after the first on a new line",
                    node.name,
                    node.value.len()
                ),
            ),
            None => Outcome::Pass,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{lint, positions};

    fn check(src: &str) -> Vec<(usize, usize)> {
        positions(&lint(ChainFormat::default(), Dialect::Script, src))
    }

    #[test]
    fn test_one_line_chain() {
        let src = "$('#items').find('.selected').highlight().end();\n";
        let diagnostics = lint(ChainFormat::default(), Dialect::Script, src);
        assert_eq!(positions(&diagnostics), vec![(1, 30)]);
        assert!(diagnostics[0].message.contains("chain on '$' has 3 calls"));
    }

    #[test]
    fn test_broken_chain_passes() {
        let src = "$('#items')\n  .find('.selected')\n  .highlight()\n  .end();\n";
        assert!(check(src).is_empty());
    }

    #[test]
    fn test_partially_broken_chain() {
        let src = "promise\n  .then(load).then(render)\n  .catch(report);\n";
        assert_eq!(check(src), vec![(2, 14)]);
    }

    #[test]
    fn test_short_chains_and_property_access() {
        assert!(check("items.push(x);\n").is_empty());
        assert!(check("document.body.style.color = 'red';\n").is_empty());
        assert!(check("a.b.c().d;\n").is_empty());
    }

    #[test]
    fn test_chains_inside_arguments_and_blocks() {
        let src = "function f() {\n  return $(el).on('click', function () {\n    $(this).hide().fadeIn();\n  });\n}\n";
        assert_eq!(check(src), vec![(3, 19)]);
    }

    #[test]
    fn test_literal_and_grouped_primaries() {
        let src = "var s = 'a'.trim().split(',');\nnew Foo().bar().baz();\n(a || b).foo().bar();\n";
        let diagnostics = lint(ChainFormat::default(), Dialect::Script, src);
        assert_eq!(positions(&diagnostics), vec![(1, 19), (2, 16), (3, 15)]);
        assert!(diagnostics[0].message.contains("chain on ''a'' has 2 calls"));
        assert!(diagnostics[2].message.contains("chain on '(...)' has 2 calls"));
    }

    #[test]
    fn test_min_length() {
        let mut rule = ChainFormat::default();
        let mut params = BTreeMap::new();
        params.insert("min-length".to_string(), serde_yaml::Value::from(3u64));
        rule.configure(&params).unwrap();
        assert!(lint(rule, Dialect::Script, "a.b().c();\n").is_empty());

        params.insert("min-length".to_string(), serde_yaml::Value::from(0u64));
        assert!(ChainFormat::default().configure(&params).is_err());
    }
}
