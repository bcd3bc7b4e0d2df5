use crate::config::ConfigError;
use crate::diagnostic::Severity;
use crate::rule::{param_str, unknown_parameter, Context, Outcome, Rule, RuleMeta, Violation};
use crate::source::Dialect;
use crate::token::{Quote, Token, TokenKind};
use crate::tree::{strip_quotes, Node, NodeKind};
use std::collections::BTreeMap;

static META: RuleMeta = RuleMeta {
    id: "quotes",
    description: "Use single quotes in stylesheets and double quotes for attribute values",
    rationale: "One quote style per language keeps strings greppable and avoids escaping \
                when stylesheet values are embedded in markup.",
    example_bad: ".icon { content: \"\\2014\"; }\n<a class='nav'>",
    example_good: ".icon { content: '\\2014'; }\n<a class=\"nav\">",
    message: "{detail}",
    dialects: &[Dialect::Stylesheet, Dialect::Markup],
    severity: Severity::Warning,
};

/// Preferred quote character per dialect
pub struct Quotes {
    stylesheet: Quote,
    markup: Quote,
}

impl Default for Quotes {
    fn default() -> Self {
        Self {
            stylesheet: Quote::Single,
            markup: Quote::Double,
        }
    }
}

fn parse_quote(key: &str, value: &serde_yaml::Value) -> Result<Quote, ConfigError> {
    match param_str(META.id, key, value)? {
        "single" => Ok(Quote::Single),
        "double" => Ok(Quote::Double),
        other => Err(ConfigError::invalid_parameter(
            META.id,
            key,
            format!("expected 'single' or 'double', found '{}'", other),
        )),
    }
}

/// Whether a string token breaks the preferred style. A string that contains
/// the preferred quote is left alone.
fn mismatched(token: &Token, preferred: Quote) -> bool {
    match token.kind {
        TokenKind::String(q) if q == preferred => false,
        TokenKind::String(_) => !strip_quotes(&token.text).contains(preferred.as_char()),
        _ => false,
    }
}

impl Quotes {
    fn check_stylesheet(&self, node: &Node) -> Outcome {
        if node.is(NodeKind::Comment) {
            return Outcome::Pass;
        }
        let violations = node
            .value
            .iter()
            .filter(|t| mismatched(t, self.stylesheet))
            .map(|t| {
                Violation::new(
                    t.span,
                    format!("string {} should use {} quotes", t.text, self.stylesheet),
                )
            })
            .collect();
        Outcome::from_violations(violations)
    }

    fn check_attribute(&self, node: &Node) -> Outcome {
        if !node.is(NodeKind::Attribute) {
            return Outcome::Pass;
        }
        // Boolean attribute
        let Some(value) = node.value.first() else {
            return Outcome::Pass;
        };

        match value.kind {
            TokenKind::String(_) if !mismatched(value, self.markup) => Outcome::Pass,
            TokenKind::String(q) => Outcome::violation(
                value.span,
                format!(
                    "attribute '{}' uses {} quotes, expected {}",
                    node.name, q, self.markup
                ),
            ),
            _ => Outcome::violation(
                value.span,
                format!("attribute '{}' value should be {}-quoted", node.name, self.markup),
            ),
        }
    }
}

impl Rule for Quotes {
    fn meta(&self) -> &'static RuleMeta {
        &META
    }

    fn configure(&mut self, params: &BTreeMap<String, serde_yaml::Value>) -> Result<(), ConfigError> {
        for (key, value) in params {
            match key.as_str() {
                "stylesheet" => self.stylesheet = parse_quote(key, value)?,
                "markup" => self.markup = parse_quote(key, value)?,
                _ => return Err(unknown_parameter(META.id, key)),
            }
        }
        Ok(())
    }

    fn check(&self, node: &Node, ctx: &Context<'_>) -> Outcome {
        match ctx.dialect {
            Dialect::Stylesheet => self.check_stylesheet(node),
            Dialect::Markup => self.check_attribute(node),
            Dialect::Script => Outcome::Pass,
        }
    }
}
