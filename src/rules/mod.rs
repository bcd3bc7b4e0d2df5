//! Built-in style rules

mod attribute_order;
mod bem_depth;
mod block_whitespace;
mod chain_format;
mod declaration_order;
mod numeric_literal;
mod quotes;
mod var_group;

pub use attribute_order::AttributeOrder;
pub use bem_depth::BemDepth;
pub use block_whitespace::BlockWhitespace;
pub use chain_format::ChainFormat;
pub use declaration_order::DeclarationOrder;
pub use numeric_literal::NumericLiteral;
pub use quotes::Quotes;
pub use var_group::VarGroup;

use crate::rule::Rule;

/// Every built-in rule with default parameters, in catalogue order
pub fn builtin_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(DeclarationOrder::default()),
        Box::new(BemDepth::default()),
        Box::new(BlockWhitespace),
        Box::new(NumericLiteral),
        Box::new(Quotes::default()),
        Box::new(AttributeOrder::default()),
        Box::new(VarGroup),
        Box::new(ChainFormat::default()),
    ]
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::Config;
    use crate::diagnostic::Diagnostic;
    use crate::engine::Engine;
    use crate::rule::{Rule, RuleSet};
    use crate::source::{Dialect, SourceFile};

    /// Lint a snippet with a single rule
    pub fn lint(rule: impl Rule + 'static, dialect: Dialect, src: &str) -> Vec<Diagnostic> {
        let rules = RuleSet::new(vec![Box::new(rule)]);
        let engine = Engine::with_rules(Config::default(), rules).unwrap();
        let path = format!("snippet.{}", dialect.extensions()[0]);
        let result = engine.lint_source(&SourceFile::new(path, src, dialect));
        assert!(
            result.diagnostics.iter().all(|d| !d.rule_id.ends_with("-error")),
            "snippet failed to parse: {:?}",
            result.diagnostics
        );
        result.diagnostics
    }

    /// (line, column) of each diagnostic
    pub fn positions(diagnostics: &[Diagnostic]) -> Vec<(usize, usize)> {
        diagnostics
            .iter()
            .map(|d| (d.location.line, d.location.column))
            .collect()
    }
}
