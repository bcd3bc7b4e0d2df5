//! Script statement splitter
//!
//! Only two shapes are recognized: `var`/`let`/`const` declaration groups and
//! method chains. Everything else becomes an opaque `Statement` whose brace
//! blocks are split recursively.

use super::lexer::ends_expression;
use crate::plugin::ParseError;
use crate::token::{Position, Span, Token, TokenKind, TokenStream};
use crate::tree::{Node, NodeKind};

const DECLARATION_KEYWORDS: &[&str] = &["var", "let", "const"];

/// Tokens that continue the previous line's expression
const CONTINUATION_PUNCT: &[&str] = &[
    ".", "?.", ",", "=", "=>", "?", ":", "+", "-", "*", "/", "%", "**", "&&", "||", "??", "==",
    "===", "!=", "!==", "<", ">", "<=", ">=", "&", "|", "^", "<<", ">>", ">>>", "+=", "-=", "*=",
    "/=", "%=", "&&=", "||=", "??=",
];

const CONTINUATION_KEYWORDS: &[&str] = &["else", "catch", "finally", "instanceof", "in", "of"];

pub struct ScriptParser {
    tokens: Vec<Token>,
    matching: Vec<Option<usize>>,
}

impl ScriptParser {
    /// Comments carry no structure here and are dropped up front
    pub fn new(stream: &TokenStream) -> Self {
        let tokens: Vec<Token> = stream
            .tokens()
            .iter()
            .filter(|t| !t.is(TokenKind::Comment))
            .cloned()
            .collect();
        Self {
            matching: vec![None; tokens.len()],
            tokens,
        }
    }

    pub fn parse(mut self) -> Result<Node, ParseError> {
        self.match_brackets()?;
        let children = self.statements(0, self.tokens.len());
        let end = self
            .tokens
            .last()
            .map(|t| t.span.end)
            .unwrap_or_else(Position::start);
        Ok(Node::new(NodeKind::Root, "", Span::new(Position::start(), end)).with_children(children))
    }

    /// Pair every opening bracket with its closer
    fn match_brackets(&mut self) -> Result<(), ParseError> {
        let mut stack: Vec<usize> = Vec::new();

        for (i, token) in self.tokens.iter().enumerate() {
            if !token.is(TokenKind::Punct) {
                continue;
            }
            match token.text.as_str() {
                "(" | "[" | "{" => stack.push(i),
                ")" | "]" | "}" => {
                    let Some(open) = stack.pop() else {
                        return Err(ParseError::new(
                            token.span.start,
                            "a statement",
                            format!("'{}'", token.text),
                        ));
                    };
                    let expected = closer_for(&self.tokens[open].text);
                    if token.text != expected {
                        return Err(ParseError::new(
                            token.span.start,
                            format!("'{}' closing the bracket opened at {}", expected, self.tokens[open].span.start),
                            format!("'{}'", token.text),
                        ));
                    }
                    self.matching[open] = Some(i);
                }
                _ => {}
            }
        }

        if let Some(&open) = stack.last() {
            let opener = &self.tokens[open];
            let end = self.tokens.last().map(|t| t.span.end).unwrap_or(opener.span.end);
            return Err(ParseError::new(
                end,
                format!("'{}' closing the bracket opened at {}", closer_for(&opener.text), opener.span.start),
                "end of file",
            ));
        }
        Ok(())
    }

    fn statements(&self, start: usize, end: usize) -> Vec<Node> {
        let mut nodes = Vec::new();
        let mut i = start;

        while i < end {
            if self.tokens[i].is_punct(";") {
                i += 1;
                continue;
            }
            let (stmt_end, next) = self.statement_end(i, end);
            nodes.push(self.statement(i, stmt_end));
            i = next.max(i + 1);
        }

        nodes
    }

    /// Exclusive end of the statement starting at `start`, and where the next one begins
    fn statement_end(&self, start: usize, end: usize) -> (usize, usize) {
        let mut j = start;

        while j < end {
            if self.tokens[j].is_punct(";") {
                return (j, j + 1);
            }
            let current = self.matching[j].unwrap_or(j);
            let next = current + 1;
            if next >= end {
                return (end, end);
            }

            let (a, b) = (&self.tokens[current], &self.tokens[next]);
            if b.span.start.line > a.span.end.line && ends_expression(a) && !continues(b) {
                return (next, next);
            }
            j = next;
        }

        (end, end)
    }

    fn statement(&self, start: usize, end: usize) -> Node {
        let first = &self.tokens[start];
        let span = first.span.cover(self.tokens[end.max(start + 1) - 1].span);

        if first.is(TokenKind::Ident) && DECLARATION_KEYWORDS.contains(&first.text.as_str()) {
            return Node::new(NodeKind::VarDeclGroup, first.text.clone(), span)
                .with_value(self.binding_targets(start + 1, end))
                .with_children(self.scan(start + 1, end));
        }

        Node::new(NodeKind::Statement, first.text.clone(), span).with_children(self.scan(start, end))
    }

    /// First token of every top-level comma-separated binding
    fn binding_targets(&self, start: usize, end: usize) -> Vec<Token> {
        let mut targets = Vec::new();
        let mut at_binding_start = true;
        let mut i = start;

        while i < end {
            let token = &self.tokens[i];
            if at_binding_start {
                targets.push(token.clone());
                at_binding_start = false;
            }
            if token.is_punct(",") {
                at_binding_start = true;
            }
            i = self.matching[i].unwrap_or(i) + 1;
        }

        targets
    }

    /// Find chains and nested blocks in a token range
    fn scan(&self, start: usize, end: usize) -> Vec<Node> {
        let mut nodes = Vec::new();
        let mut i = start;

        while i < end {
            let token = &self.tokens[i];
            if token.is_punct("{") {
                let close = self.matching[i].unwrap_or(end).min(end);
                nodes.extend(self.statements(i + 1, close));
                i = close + 1;
                continue;
            }
            if token.is_punct("(") || token.is_punct("[") {
                let close = self.matching[i].unwrap_or(end).min(end);
                let inner = self.scan(i + 1, close);
                let (found, next) = self.chain(i, close, end, inner);
                nodes.extend(found);
                i = next;
                continue;
            }
            if is_primary(token) {
                let (found, next) = self.chain(i, i, end, Vec::new());
                nodes.extend(found);
                i = next;
                continue;
            }
            i += 1;
        }

        nodes
    }

    /// Read `primary(.name | (args) | [index])*` where the primary spans
    /// `first..=last`: an identifier, a literal or a bracketed group.
    ///
    /// Returns a `ChainCall` when at least one `.name(...)` call was found,
    /// otherwise whatever the argument lists contained.
    fn chain(&self, first: usize, last: usize, end: usize, mut inner: Vec<Node>) -> (Vec<Node>, usize) {
        let mut suffixes = Vec::new();
        let mut j = last + 1;

        while j < end {
            let token = &self.tokens[j];
            if token.is_punct("(") || token.is_punct("[") {
                let close = self.matching[j].unwrap_or(end).min(end);
                inner.extend(self.scan(j + 1, close));
                j = close + 1;
                continue;
            }
            let is_member = token.is_punct(".") || token.is_punct("?.");
            let named = self.tokens.get(j + 1).is_some_and(|t| t.is(TokenKind::Ident)) && j + 1 < end;
            if !(is_member && named) {
                break;
            }
            let called = j + 2 < end && self.tokens[j + 2].is_punct("(");
            if called {
                suffixes.push(token.clone());
            }
            j += 2;
        }

        if suffixes.is_empty() {
            return (inner, j);
        }

        let primary = &self.tokens[first];
        let name = match primary.text.as_str() {
            "(" => "(...)".to_string(),
            "[" => "[...]".to_string(),
            text => text.to_string(),
        };
        let span = primary.span.cover(self.tokens[j - 1].span);
        let node = Node::new(NodeKind::ChainCall, name, span)
            .with_value(suffixes)
            .with_children(inner);
        (vec![node], j)
    }
}

fn closer_for(open: &str) -> &'static str {
    match open {
        "(" => ")",
        "[" => "]",
        _ => "}",
    }
}

/// Tokens that can start a chain on their own
fn is_primary(token: &Token) -> bool {
    matches!(
        token.kind,
        TokenKind::Ident | TokenKind::String(_) | TokenKind::Number | TokenKind::Word
    )
}

fn continues(token: &Token) -> bool {
    match token.kind {
        TokenKind::Punct => CONTINUATION_PUNCT.contains(&token.text.as_str()),
        TokenKind::Ident => CONTINUATION_KEYWORDS.contains(&token.text.as_str()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::script::lexer::ScriptLexer;

    fn parse(src: &str) -> Result<Node, ParseError> {
        let stream = TokenStream::collect_from(ScriptLexer::new(src)).unwrap();
        ScriptParser::new(&stream).parse()
    }

    fn chains(node: &Node) -> Vec<&Node> {
        node.descendants().filter(|n| n.is(NodeKind::ChainCall)).collect()
    }

    #[test]
    fn test_declaration_groups() {
        let root = parse("var a = 1;\nlet b = f(1, 2), [c, d] = pair;\nconst e = {x: 1, y: 2}").unwrap();
        let kinds: Vec<_> = root.children.iter().map(|c| (c.kind, c.name.as_str())).collect();
        assert_eq!(
            kinds,
            vec![
                (NodeKind::VarDeclGroup, "var"),
                (NodeKind::VarDeclGroup, "let"),
                (NodeKind::VarDeclGroup, "const"),
            ]
        );
        let targets: Vec<_> = root.children[1].value.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(targets, vec!["b", "["]);
        assert_eq!(root.children[2].value.len(), 1);
    }

    #[test]
    fn test_newline_ends_statement() {
        let root = parse("var a = 1\nvar b = 2\nfoo()\n  .bar()").unwrap();
        assert_eq!(root.children.len(), 3);
        assert_eq!(root.children[2].kind, NodeKind::Statement);
        assert_eq!(root.children[2].span.end.line, 4);
    }

    #[test]
    fn test_chain_suffixes() {
        let root = parse("$('.a').addClass('b')\n  .show();").unwrap();
        let found = chains(&root);
        assert_eq!(found.len(), 1);
        let lines: Vec<_> = found[0].value.iter().map(|t| t.line()).collect();
        assert_eq!(lines, vec![1, 2]);
        assert_eq!(found[0].name, "$");
    }

    #[test]
    fn test_property_access_is_not_a_suffix() {
        let root = parse("this.items.filter(f).length").unwrap();
        let found = chains(&root);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].value.len(), 1);
    }

    #[test]
    fn test_literal_and_grouped_primaries() {
        let root = parse("var s = 'a'.trim().split(',');\n`x`.trim().toUpperCase();\n(a || b).foo().bar();").unwrap();
        let found = chains(&root);
        let names: Vec<_> = found.iter().map(|c| (c.name.as_str(), c.value.len())).collect();
        assert_eq!(names, vec![("'a'", 2), ("`x`", 2), ("(...)", 2)]);
        assert_eq!(found[2].span.start.column, 1);
    }

    #[test]
    fn test_group_without_calls_keeps_inner_chains() {
        let root = parse("x = (list.sort().reverse());").unwrap();
        let found = chains(&root);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "list");
    }

    #[test]
    fn test_blocks_are_split_recursively() {
        let src = "function init() {\n  var a = 1;\n  var b = 2;\n  list.map(x => {\n    return x.trim().toLowerCase();\n  });\n}";
        let root = parse(src).unwrap();
        assert_eq!(root.children.len(), 1);
        let body = &root.children[0].children;
        assert_eq!(body[0].kind, NodeKind::VarDeclGroup);
        assert_eq!(body[1].kind, NodeKind::VarDeclGroup);
        assert_eq!(chains(&root).len(), 2);
    }

    #[test]
    fn test_else_continues_statement() {
        let root = parse("if (a) {\n  b()\n}\nelse {\n  c()\n}").unwrap();
        assert_eq!(root.children.len(), 1);
    }

    #[test]
    fn test_unbalanced_brackets() {
        let err = parse("foo(a, [b);").unwrap_err();
        assert_eq!(err.found, "')'");

        let err = parse("function f() {").unwrap_err();
        assert_eq!(err.found, "end of file");

        assert!(parse("}").is_err());
    }

    #[test]
    fn test_opaque_code_is_not_an_error() {
        let root = parse("class A extends B { static x = 1; get y() { return 2 } }").unwrap();
        assert_eq!(root.children[0].kind, NodeKind::Statement);
    }
}
