use crate::config::ConfigError;
use crate::diagnostic::Severity;
use crate::rule::{param_usize, unknown_parameter, Context, Outcome, Rule, RuleMeta};
use crate::source::Dialect;
use crate::tree::Node;
use std::collections::BTreeMap;

static META: RuleMeta = RuleMeta {
    id: "bem-depth",
    description: "Limit how many `&__element` levels a selector nests",
    rationale: "Deep element chains such as `.block__a__b__c` mirror the DOM instead of naming \
                components, and break as soon as markup moves.",
    example_bad: ".card {\n  &__body {\n    &__title {\n      &__icon { width: 1em; }\n    }\n  }\n}",
    example_good: ".card {\n  &__body { padding: 1em; }\n\n  &__title { margin: 0; }\n\n  &__icon { width: 1em; }\n}",
    message: "{detail}",
    dialects: &[Dialect::Stylesheet],
    severity: Severity::Warning,
};

pub const DEFAULT_MAX_DEPTH: usize = 2;

/// Maximum BEM element nesting
pub struct BemDepth {
    max_depth: usize,
}

impl Default for BemDepth {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl BemDepth {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }
}

impl Rule for BemDepth {
    fn meta(&self) -> &'static RuleMeta {
        &META
    }

    fn configure(&mut self, params: &BTreeMap<String, serde_yaml::Value>) -> Result<(), ConfigError> {
        for (key, value) in params {
            match key.as_str() {
                "max-depth" => self.max_depth = param_usize(META.id, key, value, 1)?,
                _ => return Err(unknown_parameter(META.id, key)),
            }
        }
        Ok(())
    }

    fn check(&self, node: &Node, ctx: &Context<'_>) -> Outcome {
        if !node.kind.is_selector_rule() || !node.name.trim_start().starts_with("&__") {
            return Outcome::Pass;
        }
        if ctx.bem_depth <= self.max_depth {
            return Outcome::Pass;
        }
        Outcome::violation(
            node.span,
            format!(
                "'{}' nests {} element levels (maximum {})",
                ctx.resolved_selector(node),
                ctx.bem_depth,
                self.max_depth
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{lint, positions};

    fn check(rule: BemDepth, src: &str) -> Vec<(usize, usize)> {
        positions(&lint(rule, Dialect::Stylesheet, src))
    }

    const THREE_LEVELS: &str = "\
.card {
  &__body {
    &__title {
      &__icon { width: 1em; }
    }
  }
}
";

    #[test]
    fn test_within_threshold() {
        assert!(check(BemDepth::default(), ".card {\n  &__body {\n    &__title { margin: 0; }\n  }\n}\n").is_empty());
        assert!(check(BemDepth::new(3), THREE_LEVELS).is_empty());
    }

    #[test]
    fn test_one_past_threshold() {
        let diagnostics = lint(BemDepth::default(), Dialect::Stylesheet, THREE_LEVELS);
        assert_eq!(positions(&diagnostics), vec![(4, 7)]);
        assert!(diagnostics[0].message.contains(".card__body__title__icon"));
    }

    #[test]
    fn test_tag_selector_suspends_counting() {
        let src = "\
.nav {
  &__list {
    li {
      &__item { color: red; }
    }
  }
}
";
        assert!(check(BemDepth::default(), src).is_empty());

        let deeper = "\
.nav {
  &__list {
    &__group {
      li {
        &__item { color: red; }
      }
    }
  }
}
";
        assert_eq!(check(BemDepth::default(), deeper), vec![(5, 9)]);
    }

    #[test]
    fn test_new_block_resets() {
        let src = "\
.a {
  &__b {
    &__c {
      .other {
        &__d { color: red; }
      }
    }
  }
}
";
        assert!(check(BemDepth::default(), src).is_empty());
    }

    #[test]
    fn test_modifiers_and_states_do_not_count() {
        let src = ".a {\n  &__b {\n    &--wide {\n      &:hover {\n        &__c { color: red; }\n      }\n    }\n  }\n}\n";
        assert!(check(BemDepth::default(), src).is_empty());
    }

    #[test]
    fn test_invalid_threshold() {
        let mut params = BTreeMap::new();
        params.insert("max-depth".to_string(), serde_yaml::Value::from(0u64));
        assert!(BemDepth::default().configure(&params).is_err());
    }
}
