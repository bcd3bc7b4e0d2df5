//! Stylesheet tree builder
//!
//! Every statement or rule is read as a *prelude*: the tokens up to the
//! first `;`, `{` or `}` outside parentheses. A prelude closed by `{` opens
//! a rule; anything else is a statement.

use crate::classifier::{SelectorClass, SelectorClassifier};
use crate::plugin::ParseError;
use crate::token::{Position, Span, Token, TokenKind, TokenStream};
use crate::tree::{Node, NodeKind};

pub struct StylesheetParser<'a> {
    src: &'a str,
    tokens: &'a TokenStream,
    classifier: &'a SelectorClassifier,
    pos: usize,
}

/// How a prelude ended
enum Terminator {
    Semicolon(usize),
    Open(usize),
    Close,
    Eof,
}

impl<'a> StylesheetParser<'a> {
    pub fn new(src: &'a str, tokens: &'a TokenStream, classifier: &'a SelectorClassifier) -> Self {
        Self {
            src,
            tokens,
            classifier,
            pos: 0,
        }
    }

    /// Build the root node
    pub fn parse(mut self) -> Result<Node, ParseError> {
        let children = self.parse_block(false, None)?;
        let end = self
            .tokens
            .tokens()
            .last()
            .map(|t| t.span.end)
            .unwrap_or_else(Position::start);
        let span = Span::new(Position::start(), end);
        Ok(Node::new(NodeKind::Root, "", span).with_children(children))
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn blank_before(&self, idx: usize) -> usize {
        if idx == 0 {
            0
        } else {
            self.tokens.blank_lines_between(idx - 1, idx)
        }
    }

    /// Parse items until the closing brace of `open` (left unconsumed) or EOF
    fn parse_block(&mut self, in_rule: bool, open: Option<&Token>) -> Result<Vec<Node>, ParseError> {
        let mut children = Vec::new();

        loop {
            let Some(token) = self.peek() else {
                return match open {
                    Some(brace) => Err(ParseError::new(
                        self.eof_position(),
                        format!("'}}' closing the block opened at {}", brace.span.start),
                        "end of file",
                    )),
                    None => Ok(children),
                };
            };

            match token.kind {
                TokenKind::RBrace => {
                    if open.is_some() {
                        return Ok(children);
                    }
                    return Err(ParseError::new(token.span.start, "a rule or declaration", "'}'"));
                }
                TokenKind::Comment => {
                    let node = Node::new(NodeKind::Comment, token.text.clone(), token.span)
                        .with_blank_lines(self.blank_before(self.pos));
                    children.push(node);
                    self.pos += 1;
                }
                TokenKind::Semicolon => self.pos += 1,
                _ => children.push(self.parse_item(in_rule)?),
            }
        }
    }

    fn parse_item(&mut self, in_rule: bool) -> Result<Node, ParseError> {
        let first = self.pos;
        let (prelude, terminator) = self.scan_prelude()?;
        let blank_lines = self.blank_before(first);

        match terminator {
            Terminator::Open(brace_idx) => {
                let tokens = self.tokens;
                let brace = &tokens.tokens()[brace_idx];
                if prelude.is_empty() {
                    return Err(ParseError::new(brace.span.start, "a selector", "'{'"));
                }
                self.pos = brace_idx + 1;

                let name = self.prelude_text(&prelude);
                let kind = self.rule_kind(&prelude, &name, in_rule);
                let child_in_rule = in_rule || kind.is_selector_rule();
                let children = self.parse_block(child_in_rule, Some(brace))?;

                // parse_block only returns Ok on the closing brace here
                let close = tokens.tokens()[self.pos].span;
                self.pos += 1;

                let span = Span::new(prelude[0].span.start, close.end);
                Ok(Node::new(kind, name, span)
                    .with_value(prelude)
                    .with_blank_lines(blank_lines)
                    .with_children(children))
            }
            Terminator::Semicolon(idx) => {
                self.pos = idx + 1;
                self.statement(prelude, blank_lines)
            }
            Terminator::Close | Terminator::Eof => self.statement(prelude, blank_lines),
        }
    }

    /// Collect prelude tokens (comments dropped) and advance to the terminator
    fn scan_prelude(&mut self) -> Result<(Vec<Token>, Terminator), ParseError> {
        let mut prelude = Vec::new();
        let mut parens: Vec<&Token> = Vec::new();

        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::LParen => parens.push(token),
                TokenKind::RParen => {
                    if parens.pop().is_none() {
                        return Err(ParseError::new(token.span.start, "a value", "')'"));
                    }
                }
                TokenKind::Semicolon if parens.is_empty() => {
                    return Ok((prelude, Terminator::Semicolon(self.pos)));
                }
                TokenKind::LBrace if parens.is_empty() => {
                    return Ok((prelude, Terminator::Open(self.pos)));
                }
                TokenKind::RBrace => {
                    if let Some(open) = parens.last() {
                        return Err(ParseError::new(
                            token.span.start,
                            format!("')' closing the parenthesis opened at {}", open.span.start),
                            "'}'",
                        ));
                    }
                    return Ok((prelude, Terminator::Close));
                }
                TokenKind::Comment => {
                    self.pos += 1;
                    continue;
                }
                _ => {}
            }
            prelude.push(token.clone());
            self.pos += 1;
        }

        if let Some(open) = parens.last() {
            return Err(ParseError::new(
                self.eof_position(),
                format!("')' closing the parenthesis opened at {}", open.span.start),
                "end of file",
            ));
        }
        Ok((prelude, Terminator::Eof))
    }

    fn rule_kind(&self, prelude: &[Token], name: &str, in_rule: bool) -> NodeKind {
        if prelude[0].is(TokenKind::AtKeyword) {
            return match prelude[0].text.to_ascii_lowercase().as_str() {
                "@media" | "@supports" => NodeKind::MediaQuery,
                "@include" => NodeKind::MixinInclude,
                _ => NodeKind::AtRule,
            };
        }
        if !in_rule {
            return NodeKind::Selector;
        }
        match self.classifier.classify(name) {
            SelectorClass::Pseudo => NodeKind::PseudoRule,
            SelectorClass::State => NodeKind::StateRule,
            _ => NodeKind::NestedRule,
        }
    }

    fn statement(&self, prelude: Vec<Token>, blank_lines: usize) -> Result<Node, ParseError> {
        let Some(head) = prelude.first() else {
            return Err(ParseError::new(self.eof_position(), "a declaration", "nothing"));
        };
        let span = prelude_span(&prelude);

        if head.is(TokenKind::AtKeyword) {
            let kind = match head.text.to_ascii_lowercase().as_str() {
                "@extend" => NodeKind::Extend,
                "@include" => NodeKind::MixinInclude,
                _ => NodeKind::AtRule,
            };
            let name = self.prelude_text(&prelude);
            return Ok(Node::new(kind, name, span)
                .with_value(prelude)
                .with_blank_lines(blank_lines));
        }

        let colon = prelude
            .iter()
            .position(|t| t.is(TokenKind::Colon))
            .ok_or_else(|| {
                ParseError::new(
                    head.span.start,
                    "':' after property name",
                    format!("'{}'", self.prelude_text(&prelude)),
                )
            })?;
        if colon == 0 {
            return Err(ParseError::new(head.span.start, "a property name", "':'"));
        }

        let name = self.prelude_text(&prelude[..colon]);
        let value = prelude[colon + 1..].to_vec();
        Ok(Node::new(NodeKind::Declaration, name, span)
            .with_value(value)
            .with_blank_lines(blank_lines))
    }

    /// Source text of a token run with whitespace collapsed
    fn prelude_text(&self, tokens: &[Token]) -> String {
        match (tokens.first(), tokens.last()) {
            (Some(first), Some(last)) => self.src[first.span.start.offset..last.span.end.offset]
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" "),
            _ => String::new(),
        }
    }

    fn eof_position(&self) -> Position {
        self.tokens
            .tokens()
            .last()
            .map(|t| t.span.end)
            .unwrap_or_else(Position::start)
    }
}

fn prelude_span(prelude: &[Token]) -> Span {
    match (prelude.first(), prelude.last()) {
        (Some(first), Some(last)) => first.span.cover(last.span),
        _ => Span::default(),
    }
}
