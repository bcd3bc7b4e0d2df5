use crate::diagnostic::Severity;
use crate::rule::{Context, Outcome, Rule, RuleMeta, Violation};
use crate::source::Dialect;
use crate::token::{Token, TokenKind};
use crate::tree::{Node, NodeKind};

static META: RuleMeta = RuleMeta {
    id: "numeric-literal",
    description: "Write numbers with a leading zero, no trailing zeros and no unit on zero",
    rationale: "`0.5` reads faster than `.5`, trailing zeros add noise, and `0px` is just `0`.",
    example_bad: ".a {\n  opacity: .5;\n  line-height: 1.50;\n  margin: 0px;\n}",
    example_good: ".a {\n  opacity: 0.5;\n  line-height: 1.5;\n  margin: 0;\n}",
    message: "{detail}",
    dialects: &[Dialect::Stylesheet],
    severity: Severity::Warning,
};

/// Units that are meaningless on a zero length
const LENGTH_UNITS: &[&str] = &[
    "px", "em", "rem", "ex", "ch", "vw", "vh", "vmin", "vmax", "cm", "mm", "in", "pt", "pc", "q",
];

/// Number formatting in stylesheet values
pub struct NumericLiteral;

/// A numeric token split into magnitude digits and unit
struct Number<'a> {
    digits: &'a str,
    unit: &'a str,
}

impl<'a> Number<'a> {
    fn parse(text: &'a str) -> Self {
        let unsigned = text.trim_start_matches(['+', '-']);
        let split = unsigned
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(unsigned.len());
        let (digits, unit) = unsigned.split_at(split);
        Self { digits, unit }
    }

    fn fraction(&self) -> Option<&'a str> {
        self.digits.split_once('.').map(|(_, frac)| frac)
    }

    fn is_zero(&self) -> bool {
        self.digits.chars().any(|c| c.is_ascii_digit())
            && self.digits.chars().all(|c| c == '0' || c == '.')
    }
}

fn check_token(token: &Token, violations: &mut Vec<Violation>) {
    let number = Number::parse(&token.text);

    if number.digits.starts_with('.') {
        violations.push(Violation::new(
            token.span,
            format!("'{}' is missing a leading zero", token.text),
        ));
    }
    if number.fraction().is_some_and(|f| f.ends_with('0')) {
        violations.push(Violation::new(
            token.span,
            format!("'{}' has a trailing zero", token.text),
        ));
    }
    if number.is_zero() && LENGTH_UNITS.contains(&number.unit.to_ascii_lowercase().as_str()) {
        violations.push(Violation::new(
            token.span,
            format!("'{}' is zero and needs no unit", token.text),
        ));
    }
}

impl Rule for NumericLiteral {
    fn meta(&self) -> &'static RuleMeta {
        &META
    }

    fn check(&self, node: &Node, _ctx: &Context<'_>) -> Outcome {
        if node.kind.is_selector_rule() || node.is(NodeKind::Comment) {
            return Outcome::Pass;
        }

        let mut violations = Vec::new();
        for token in node.value.iter().filter(|t| t.is(TokenKind::Number)) {
            check_token(token, &mut violations);
        }
        Outcome::from_violations(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{lint, positions};

    fn check(src: &str) -> Vec<String> {
        lint(NumericLiteral, Dialect::Stylesheet, src)
            .into_iter()
            .map(|d| d.message)
            .collect()
    }

    #[test]
    fn test_number_parts() {
        let n = Number::parse("-0.50em");
        assert_eq!((n.digits, n.unit), ("0.50", "em"));
        assert_eq!(n.fraction(), Some("50"));
        assert!(!n.is_zero());
        assert!(Number::parse("0.0px").is_zero());
        assert!(!Number::parse("5").is_zero());
    }

    #[test]
    fn test_missing_leading_zero() {
        assert_eq!(check(".a { opacity: .5; }"), vec!["'.5' is missing a leading zero"]);
        assert_eq!(
            positions(&lint(NumericLiteral, Dialect::Stylesheet, ".a { opacity: .5; }")),
            vec![(1, 15)]
        );
    }

    #[test]
    fn test_signed_number_after_number() {
        let src = ".a { width: calc(100%-.5em); }";
        assert_eq!(check(src), vec!["'-.5em' is missing a leading zero"]);
        assert_eq!(positions(&lint(NumericLiteral, Dialect::Stylesheet, src)), vec![(1, 22)]);
    }

    #[test]
    fn test_trailing_zero() {
        assert_eq!(check(".a { line-height: 0.50; }"), vec!["'0.50' has a trailing zero"]);
    }

    #[test]
    fn test_unit_on_zero() {
        assert_eq!(check(".a { margin: 0px; }"), vec!["'0px' is zero and needs no unit"]);
        assert!(check(".a { transition: opacity 0s; flex: 1 1 0%; }").is_empty());
    }

    #[test]
    fn test_clean_values() {
        let src = "\
$gutter: 0.5rem;
.a {
  width: calc(100% - 2px);
  margin: 0 auto;
  padding: (2 * $gutter);
  line-height: 1.5;
  z-index: -1;
  color: #050505;
}
";
        assert!(check(src).is_empty());
    }

    #[test]
    fn test_mixin_arguments_and_multiple_findings() {
        let src = ".a {\n  @include fade(.50, 0em);\n}\n";
        assert_eq!(
            check(src),
            vec![
                "'.50' is missing a leading zero",
                "'.50' has a trailing zero",
                "'0em' is zero and needs no unit",
            ]
        );
    }
}
