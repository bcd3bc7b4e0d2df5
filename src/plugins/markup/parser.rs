//! HTML tree builder

use crate::plugin::ParseError;
use crate::token::{Position, Span, Token, TokenKind, TokenStream};
use crate::tree::{Node, NodeKind};

/// Elements that never have an end tag
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

/// Elements whose end tag may be left out
const OPTIONAL_END: &[&str] = &[
    "li", "dt", "dd", "p", "option", "optgroup", "tr", "td", "th", "thead", "tbody", "tfoot",
    "colgroup", "rt", "rp",
];

/// Start tags that end an open `<p>`
const CLOSES_PARAGRAPH: &[&str] = &[
    "address", "article", "aside", "blockquote", "details", "div", "dl", "fieldset", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hgroup", "hr", "main",
    "menu", "nav", "ol", "p", "pre", "section", "table", "ul",
];

fn has_optional_end(name: &str) -> bool {
    OPTIONAL_END.iter().any(|o| o.eq_ignore_ascii_case(name))
}

/// Whether a start tag `incoming` implicitly ends the open element `open`
fn implies_end(open: &str, incoming: &str) -> bool {
    let open = open.to_ascii_lowercase();
    let incoming = incoming.to_ascii_lowercase();
    let among = |names: &[&str]| names.contains(&incoming.as_str());
    match open.as_str() {
        "li" => among(&["li"]),
        "dt" | "dd" => among(&["dt", "dd"]),
        "p" => among(CLOSES_PARAGRAPH),
        "option" => among(&["option", "optgroup"]),
        "optgroup" => among(&["optgroup"]),
        "rt" | "rp" => among(&["rt", "rp"]),
        "td" | "th" => among(&["td", "th", "tr", "tbody", "tfoot"]),
        "tr" => among(&["tr", "tbody", "tfoot"]),
        "thead" | "tbody" => among(&["tbody", "tfoot"]),
        "colgroup" => !among(&["col"]),
        _ => false,
    }
}

pub struct MarkupParser<'a> {
    tokens: &'a TokenStream,
    pos: usize,
}

impl<'a> MarkupParser<'a> {
    pub fn new(tokens: &'a TokenStream) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse(mut self) -> Result<Node, ParseError> {
        let end = self
            .tokens
            .tokens()
            .last()
            .map(|t| t.span.end)
            .unwrap_or_else(Position::start);
        // Open elements; the root sits at the bottom
        let mut stack = vec![Node::new(NodeKind::Root, "", Span::new(Position::start(), end))];

        while let Some(token) = self.next_token() {
            match token.kind {
                TokenKind::Comment => {
                    let node = Node::new(NodeKind::Comment, token.text.clone(), token.span)
                        .with_blank_lines(self.blank_before(self.pos - 1));
                    push_child(&mut stack, node);
                }
                TokenKind::TagOpen => {
                    let (element, closed) = self.start_tag(token)?;
                    while stack.len() > 1
                        && stack.last().is_some_and(|open| implies_end(&open.name, &element.name))
                    {
                        close_implicitly(&mut stack);
                    }
                    if closed || is_void_element(&element.name) {
                        push_child(&mut stack, element);
                    } else {
                        stack.push(element);
                    }
                }
                TokenKind::EndTag => {
                    let name = end_tag_name(&token.text);
                    if is_void_element(name) {
                        continue;
                    }
                    if stack.len() == 1 {
                        return Err(ParseError::new(
                            token.span.start,
                            "content",
                            format!("unmatched end tag '{}'", token.text),
                        ));
                    }
                    let named_open = |n: &Node| n.name.eq_ignore_ascii_case(name);
                    if stack[1..].iter().any(named_open) {
                        while stack.len() > 1
                            && stack.last().is_some_and(|open| !named_open(open) && has_optional_end(&open.name))
                        {
                            close_implicitly(&mut stack);
                        }
                    }
                    let open = stack.last().map(|n| n.name.as_str()).unwrap_or("");
                    if !open.eq_ignore_ascii_case(name) {
                        return Err(ParseError::new(
                            token.span.start,
                            format!("'</{}>'", open),
                            format!("'{}'", token.text),
                        ));
                    }
                    if let Some(mut element) = stack.pop() {
                        element.span.end = token.span.end;
                        push_child(&mut stack, element);
                    }
                }
                TokenKind::Text | TokenKind::Doctype => {}
                _ => {
                    return Err(ParseError::new(
                        token.span.start,
                        "a tag or text",
                        format!("'{}'", token.text),
                    ));
                }
            }
        }

        while stack.len() > 1 && stack.last().is_some_and(|open| has_optional_end(&open.name)) {
            close_implicitly(&mut stack);
        }
        if stack.len() > 1 {
            let open = &stack[stack.len() - 1];
            return Err(ParseError::new(
                end,
                format!("'</{}>' closing the element opened at {}", open.name, open.span.start),
                "end of file",
            ));
        }
        stack.pop().ok_or_else(|| ParseError::new(end, "a document", "nothing"))
    }

    fn next_token(&mut self) -> Option<&'a Token> {
        let tokens = self.tokens;
        let token = tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    fn blank_before(&self, idx: usize) -> usize {
        if idx == 0 {
            0
        } else {
            self.tokens.blank_lines_between(idx - 1, idx)
        }
    }

    /// Read attributes up to `>` or `/>`; returns the element and whether it self-closed
    fn start_tag(&mut self, open: &Token) -> Result<(Node, bool), ParseError> {
        let open_idx = self.pos - 1;
        let name = open.text.trim_start_matches('<').to_string();
        let mut attributes = Vec::new();

        loop {
            let Some(token) = self.next_token() else {
                return Err(ParseError::new(open.span.end, "'>'", "end of file"));
            };
            match token.kind {
                TokenKind::AttrName => attributes.push(self.attribute(token)?),
                TokenKind::TagClose | TokenKind::TagSelfClose => {
                    let element = Node::new(NodeKind::Element, name, open.span.cover(token.span))
                        .with_blank_lines(self.blank_before(open_idx))
                        .with_children(attributes);
                    return Ok((element, token.is(TokenKind::TagSelfClose)));
                }
                _ => {
                    return Err(ParseError::new(
                        token.span.start,
                        "an attribute or '>'",
                        format!("'{}'", token.text),
                    ));
                }
            }
        }
    }

    fn attribute(&mut self, name: &Token) -> Result<Node, ParseError> {
        let is_equals = self.tokens.get(self.pos).is_some_and(|t| t.is(TokenKind::Equals));
        if !is_equals {
            return Ok(Node::new(NodeKind::Attribute, name.text.clone(), name.span));
        }
        self.pos += 1;

        match self.next_token() {
            Some(value) if matches!(value.kind, TokenKind::String(_) | TokenKind::Word) => {
                Ok(Node::new(NodeKind::Attribute, name.text.clone(), name.span.cover(value.span))
                    .with_value(vec![value.clone()]))
            }
            Some(other) => Err(ParseError::new(
                other.span.start,
                format!("a value for attribute '{}'", name.text),
                format!("'{}'", other.text),
            )),
            None => Err(ParseError::new(
                name.span.end,
                format!("a value for attribute '{}'", name.text),
                "end of file",
            )),
        }
    }
}

fn push_child(stack: &mut [Node], node: Node) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    }
}

/// Pop the innermost element, ending it after its last child
fn close_implicitly(stack: &mut Vec<Node>) {
    if let Some(mut element) = stack.pop() {
        if let Some(last) = element.children.last() {
            element.span.end = last.span.end;
        }
        push_child(stack, element);
    }
}

fn end_tag_name(text: &str) -> &str {
    text.trim_start_matches("</").trim_end_matches('>').trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::markup::lexer::MarkupLexer;
    use crate::token::Quote;

    fn parse(src: &str) -> Result<Node, ParseError> {
        let tokens = TokenStream::collect_from(MarkupLexer::new(src)).unwrap();
        MarkupParser::new(&tokens).parse()
    }

    #[test]
    fn test_nested_elements() {
        let root = parse("<ul class=\"list\">\n  <li>One</li>\n  <li>Two</li>\n</ul>").unwrap();
        let ul = &root.children[0];
        assert_eq!(ul.name, "ul");
        assert_eq!(ul.attributes().count(), 1);
        assert_eq!(ul.elements().count(), 2);
        assert_eq!(ul.span.end.line, 4);
    }

    #[test]
    fn test_attribute_values() {
        let root = parse("<input type=text value='a' required>").unwrap();
        let input = &root.children[0];
        let attrs: Vec<_> = input.attributes().collect();
        assert_eq!(attrs[0].attribute_value(), Some("text"));
        assert_eq!(attrs[0].quote(), None);
        assert_eq!(attrs[1].quote(), Some(Quote::Single));
        assert!(attrs[2].value.is_empty());
    }

    #[test]
    fn test_void_and_self_closing() {
        let root = parse("<div><img src=\"a.png\"><br/><hr></div>").unwrap();
        assert_eq!(root.children[0].elements().count(), 3);
    }

    #[test]
    fn test_end_tags_match_case_insensitively() {
        assert!(parse("<DIV></div>").is_ok());
    }

    #[test]
    fn test_mismatched_end_tag() {
        let err = parse("<div><span></div>").unwrap_err();
        assert_eq!(err.expected, "'</span>'");
        assert_eq!(err.found, "'</div>'");
    }

    #[test]
    fn test_unclosed_element() {
        let err = parse("<main>\n  <p>text</p>\n").unwrap_err();
        assert_eq!(err.found, "end of file");
        assert!(err.expected.contains("</main>"));
    }

    #[test]
    fn test_optional_end_tags() {
        let root = parse("<ul>\n<li>one\n<li>two\n</ul>").unwrap();
        let ul = &root.children[0];
        let items: Vec<_> = ul.elements().map(|li| li.name.as_str()).collect();
        assert_eq!(items, vec!["li", "li"]);
        assert_eq!(ul.span.end.line, 4);

        let root = parse("<table>\n<tr><td>a<td>b\n<tr><td>c\n</table>\n<p>one\n<p>two").unwrap();
        let table = &root.children[0];
        assert_eq!(table.elements().count(), 2);
        assert_eq!(table.elements().map(|tr| tr.elements().count()).collect::<Vec<_>>(), vec![2, 1]);
        assert_eq!(root.elements().count(), 3);
    }

    #[test]
    fn test_required_end_tag_is_not_implied() {
        let err = parse("<p><b></p>").unwrap_err();
        assert_eq!(err.expected, "'</b>'");
    }

    #[test]
    fn test_stray_end_tag() {
        assert!(parse("</p>").is_err());
    }

    #[test]
    fn test_comment_nodes() {
        let root = parse("<!-- a -->\n\n<p></p>").unwrap();
        assert_eq!(root.children[0].kind, NodeKind::Comment);
        assert_eq!(root.children[1].blank_lines_before, 1);
    }
}
