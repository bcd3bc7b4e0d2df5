use crate::diagnostic::Severity;
use crate::rule::{Context, Outcome, Rule, RuleMeta};
use crate::source::Dialect;
use crate::token::TokenKind;
use crate::tree::{Node, NodeKind};

static META: RuleMeta = RuleMeta {
    id: "var-group",
    description: "Group consecutive single-variable declarations into one statement",
    rationale: "One declaration per scope section shows every local at a glance and keeps the \
                keyword from repeating down the page.",
    example_bad: "var width = 10;\nvar height = 20;",
    example_good: "var width = 10,\n    height = 20;",
    message: "{detail}",
    dialects: &[Dialect::Script],
    severity: Severity::Warning,
};

/// Consecutive single-binding declarations
pub struct VarGroup;

/// A declaration binding exactly one plain identifier
fn single_binding(node: &Node) -> bool {
    node.is(NodeKind::VarDeclGroup)
        && node.value.len() == 1
        && node.value[0].is(TokenKind::Ident)
}

fn groupable(a: &Node, b: &Node) -> bool {
    single_binding(a) && single_binding(b) && a.name == b.name
}

impl Rule for VarGroup {
    fn meta(&self) -> &'static RuleMeta {
        &META
    }

    fn check(&self, node: &Node, ctx: &Context<'_>) -> Outcome {
        let earlier = ctx.preceding_siblings();
        let Some((previous, rest)) = earlier.split_last() else {
            return Outcome::Pass;
        };
        if !groupable(previous, node) {
            return Outcome::Pass;
        }
        // Report each run once, at its second statement
        if rest.last().is_some_and(|before| groupable(before, previous)) {
            return Outcome::Pass;
        }

        let run = 1 + ctx.siblings[ctx.index..]
            .iter()
            .take_while(|s| groupable(previous, s))
            .count();
        Outcome::violation(
            node.span,
            format!(
                "{} consecutive '{}' declarations of a single variable; group them into one statement",
                run, node.name
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{lint, positions};

    fn check(src: &str) -> Vec<(usize, usize)> {
        positions(&lint(VarGroup, Dialect::Script, src))
    }

    #[test]
    fn test_grouped_declaration_passes() {
        assert!(check("var a = 1,\n    b = 2;\n").is_empty());
        assert!(check("var a = 1;\nfoo();\nvar b = 2;\n").is_empty());
    }

    #[test]
    fn test_run_reported_once_at_second_statement() {
        let src = "var a = 1;\nvar b = 2;\nvar c = 3;\n";
        let diagnostics = lint(VarGroup, Dialect::Script, src);
        assert_eq!(positions(&diagnostics), vec![(2, 1)]);
        assert!(diagnostics[0].message.starts_with("3 consecutive 'var'"));
    }

    #[test]
    fn test_keywords_and_patterns_break_runs() {
        assert!(check("let a = 1;\nconst b = 2;\n").is_empty());
        assert!(check("const { a } = obj;\nconst b = 2;\n").is_empty());
        assert!(check("let a = 1, b = 2;\nlet c = 3;\n").is_empty());
    }

    #[test]
    fn test_nested_function_bodies() {
        let src = "function f() {\n  let x = 1;\n  let y = 2;\n  return x + y;\n}\n";
        assert_eq!(check(src), vec![(3, 3)]);
    }

    #[test]
    fn test_statements_without_semicolons() {
        assert_eq!(check("let a = 1\nlet b = 2\n"), vec![(2, 1)]);
    }
}
