use crate::diagnostic::Severity;
use crate::rule::{Context, Outcome, Rule, RuleMeta};
use crate::source::Dialect;
use crate::tree::{Node, NodeKind};

static META: RuleMeta = RuleMeta {
    id: "block-whitespace",
    description: "Keep declarations together and separate nested blocks with a blank line",
    rationale: "Declarations of one selector read as a unit; a blank line before each nested \
                block marks where a new selector starts.",
    example_bad: ".a {\n  color: red;\n\n  margin: 0;\n  &:hover { color: blue; }\n}",
    example_good: ".a {\n  color: red;\n  margin: 0;\n\n  &:hover { color: blue; }\n}",
    message: "{detail}",
    dialects: &[Dialect::Stylesheet],
    severity: Severity::Warning,
};

/// Blank-line placement inside rule bodies
pub struct BlockWhitespace;

fn is_nested_block(node: &Node) -> bool {
    matches!(
        node.kind,
        NodeKind::NestedRule | NodeKind::MediaQuery | NodeKind::PseudoRule | NodeKind::StateRule
    )
}

impl Rule for BlockWhitespace {
    fn meta(&self) -> &'static RuleMeta {
        &META
    }

    fn check(&self, node: &Node, ctx: &Context<'_>) -> Outcome {
        if !ctx.parent().is_some_and(|p| p.kind.has_rule_body()) {
            return Outcome::Pass;
        }
        let preceding = ctx.preceding_siblings();
        let Some(at) = preceding.iter().rposition(|n| !n.is(NodeKind::Comment)) else {
            return Outcome::Pass;
        };
        let previous = &preceding[at];
        // Comments on the previous sibling's last line trail it and separate nothing
        let comments = &preceding[at + 1..];
        let trailing = comments
            .iter()
            .take_while(|c| c.span.start.line == previous.span.end.line)
            .count();
        let lead = comments.get(trailing).unwrap_or(node);

        if node.is(NodeKind::Declaration)
            && previous.is(NodeKind::Declaration)
            && std::ptr::eq(lead, node)
            && node.blank_lines_before > 0
        {
            return Outcome::violation(
                node.span,
                format!("unexpected blank line before declaration '{}'", node.name),
            );
        }

        if is_nested_block(node) && lead.blank_lines_before == 0 {
            return Outcome::violation(
                node.span,
                format!("expected a blank line before {} '{}'", node.kind, node.name),
            );
        }

        Outcome::Pass
    }
}
