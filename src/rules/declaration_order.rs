use crate::config::ConfigError;
use crate::diagnostic::Severity;
use crate::rule::{param_bool, unknown_parameter, Context, Outcome, Rule, RuleMeta};
use crate::source::Dialect;
use crate::tree::{Node, NodeKind};
use std::collections::BTreeMap;

static META: RuleMeta = RuleMeta {
    id: "declaration-order",
    description: "Order rule bodies as @extend, @include, declarations, then nested blocks",
    rationale: "A fixed order makes it obvious where inherited styles end and the selector's own \
                styles begin, and keeps nested blocks from hiding declarations.",
    example_bad: ".btn {\n  &:hover { color: red; }\n  color: blue;\n  @extend %reset;\n}",
    example_good: ".btn {\n  @extend %reset;\n  color: blue;\n\n  &:hover { color: red; }\n}",
    message: "{detail}",
    dialects: &[Dialect::Stylesheet],
    severity: Severity::Warning,
};

/// Order of children inside one rule body
pub struct DeclarationOrder {
    pseudo_first: bool,
}

impl Default for DeclarationOrder {
    fn default() -> Self {
        Self { pseudo_first: true }
    }
}

/// Position of a child kind in the required sequence; `None` for kinds the
/// order does not cover (comments, other at-rules)
fn stage(node: &Node) -> Option<u8> {
    match node.kind {
        NodeKind::Extend => Some(0),
        NodeKind::MixinInclude if node.children.is_empty() => Some(1),
        NodeKind::Declaration => Some(2),
        NodeKind::MixinInclude
        | NodeKind::NestedRule
        | NodeKind::MediaQuery
        | NodeKind::PseudoRule
        | NodeKind::StateRule => Some(3),
        _ => None,
    }
}

impl DeclarationOrder {
    /// The earlier sibling that `siblings[idx]` should have preceded
    fn blocker<'a>(&self, siblings: &'a [Node], idx: usize) -> Option<&'a Node> {
        let node = &siblings[idx];
        let own = stage(node)?;
        let earlier = &siblings[..idx];

        if let Some(later) = earlier.iter().find(|s| stage(s).is_some_and(|st| st > own)) {
            return Some(later);
        }
        if self.pseudo_first && node.is(NodeKind::PseudoRule) {
            return earlier.iter().find(|s| s.is(NodeKind::StateRule));
        }
        None
    }
}

impl Rule for DeclarationOrder {
    fn meta(&self) -> &'static RuleMeta {
        &META
    }

    fn configure(&mut self, params: &BTreeMap<String, serde_yaml::Value>) -> Result<(), ConfigError> {
        for (key, value) in params {
            match key.as_str() {
                "pseudo-first" => self.pseudo_first = param_bool(META.id, key, value)?,
                _ => return Err(unknown_parameter(META.id, key)),
            }
        }
        Ok(())
    }

    fn check(&self, node: &Node, ctx: &Context<'_>) -> Outcome {
        if !ctx.parent().is_some_and(|p| p.kind.has_rule_body()) {
            return Outcome::Pass;
        }
        let Some(blocker) = self.blocker(ctx.siblings, ctx.index) else {
            return Outcome::Pass;
        };

        // A displaced run of same-stage children is reported once, at its head
        let previous = ctx.siblings[..ctx.index]
            .iter()
            .rposition(|s| stage(s).is_some());
        if let Some(prev) = previous {
            if stage(&ctx.siblings[prev]) == stage(node)
                && self.blocker(ctx.siblings, prev).is_some()
            {
                return Outcome::Pass;
            }
        }

        Outcome::violation(
            node.span,
            format!(
                "{} '{}' should come before {} '{}' (line {})",
                node.kind, node.name, blocker.kind, blocker.name, blocker.span.start.line
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{lint, positions};

    fn check(src: &str) -> Vec<(usize, usize)> {
        positions(&lint(DeclarationOrder::default(), Dialect::Stylesheet, src))
    }

    #[test]
    fn test_ordered_body_passes() {
        let src = "\
.card {
  @extend %box;
  @include shadow;
  color: red;
  margin: 0;

  &:before { content: ''; }

  &:hover { color: blue; }

  &__title { margin: 0; }

  @media print { display: none; }
}
";
        assert!(check(src).is_empty());
    }

    #[test]
    fn test_nested_blocks_share_one_stage() {
        let src = ".a {\n  color: red;\n\n  @media print { color: black; }\n\n  &__b { color: red; }\n\n  &:before { content: ''; }\n}\n";
        assert!(check(src).is_empty());
    }

    #[test]
    fn test_single_transposition() {
        let src = ".a {\n  @include shadow;\n  @extend %box;\n  color: red;\n}\n";
        assert_eq!(check(src), vec![(3, 3)]);

        let src = ".a {\n  @extend %box;\n  &__b { color: red; }\n  color: red;\n}\n";
        assert_eq!(check(src), vec![(4, 3)]);
    }

    #[test]
    fn test_state_then_pseudo_then_declarations() {
        let src = "\
.link {
  &:hover { color: red; }
  &:before { content: ''; }
  color: blue;
  margin: 0;
}
";
        let diagnostics = lint(DeclarationOrder::default(), Dialect::Stylesheet, src);
        assert_eq!(positions(&diagnostics), vec![(3, 3), (4, 3)]);
        assert!(diagnostics[0].message.contains("state rule '&:hover'"));
        assert!(diagnostics[1].message.contains("declaration 'color'"));
    }

    #[test]
    fn test_pseudo_inside_state_is_allowed() {
        let src = ".a {\n  &:hover {\n    &:before { content: ''; }\n  }\n}\n";
        assert!(check(src).is_empty());
    }

    #[test]
    fn test_pseudo_first_can_be_disabled() {
        let mut rule = DeclarationOrder::default();
        let mut params = BTreeMap::new();
        params.insert("pseudo-first".to_string(), serde_yaml::Value::from(false));
        rule.configure(&params).unwrap();

        let src = ".a {\n  &:hover { color: red; }\n  &:before { content: ''; }\n}\n";
        assert!(lint(rule, Dialect::Stylesheet, src).is_empty());
    }

    #[test]
    fn test_include_with_block_counts_as_nested() {
        let src = ".a {\n  @include mq(tablet) { color: red; }\n  @include shadow;\n}\n";
        assert_eq!(check(src), vec![(3, 3)]);
    }

    #[test]
    fn test_comments_and_root_are_ignored() {
        let src = "color: red;\n.a {\n  color: red;\n  // trailing note\n}\n";
        assert!(check(src).is_empty());
    }
}
