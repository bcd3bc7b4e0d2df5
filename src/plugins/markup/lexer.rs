//! HTML tokenizer
//!
//! Content between tags is reduced to `Text` tokens; the contents of
//! `<script>` and `<style>` are kept as a single raw `Text` token.

use crate::token::{Cursor, LexError, Position, Token, TokenKind};

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Content,
    /// Inside a start tag
    Tag { name: String, start: Position, after_equals: bool },
    /// Raw contents of a script/style element
    Raw(String),
}

/// Lazy markup token sequence
#[derive(Debug, Clone)]
pub struct MarkupLexer<'a> {
    cursor: Cursor<'a>,
    mode: Mode,
    done: bool,
}

impl<'a> MarkupLexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            cursor: Cursor::new(src),
            mode: Mode::Content,
            done: false,
        }
    }

    fn lex_token(&mut self) -> Result<Option<Token>, LexError> {
        match self.mode.clone() {
            Mode::Content => self.content(),
            Mode::Tag {
                name,
                start,
                after_equals,
            } => self.in_tag(name, start, after_equals).map(Some),
            Mode::Raw(name) => self.raw_text(&name),
        }
    }

    fn content(&mut self) -> Result<Option<Token>, LexError> {
        self.cursor.skip_whitespace();
        if self.cursor.is_eof() {
            return Ok(None);
        }
        let start = self.cursor.pos();

        if self.cursor.starts_with("<!--") {
            self.cursor.bump_n(4);
            while !self.cursor.starts_with("-->") {
                if self.cursor.bump().is_none() {
                    return Err(LexError::new(start, "unterminated comment"));
                }
            }
            self.cursor.bump_n(3);
            return Ok(Some(self.cursor.token(TokenKind::Comment, start)));
        }

        if self.cursor.starts_with("<!") || self.cursor.starts_with("<?") {
            self.cursor.eat_while(|c| c != '>');
            if self.cursor.bump().is_none() {
                return Err(LexError::new(start, "unterminated declaration"));
            }
            return Ok(Some(self.cursor.token(TokenKind::Doctype, start)));
        }

        if self.cursor.starts_with("</") && self.cursor.peek_nth(2).is_some_and(is_name_start) {
            self.cursor.bump_n(2);
            self.cursor.eat_while(is_name_char);
            self.cursor.skip_whitespace();
            if self.cursor.peek() != Some('>') {
                return Err(LexError::new(start, "unterminated end tag"));
            }
            self.cursor.bump();
            return Ok(Some(self.cursor.token(TokenKind::EndTag, start)));
        }

        if self.cursor.peek() == Some('<') && self.cursor.peek_nth(1).is_some_and(is_name_start) {
            self.cursor.bump();
            let name_start = self.cursor.pos();
            self.cursor.eat_while(is_name_char);
            let name = self.cursor.slice(name_start).to_string();
            self.mode = Mode::Tag {
                name,
                start,
                after_equals: false,
            };
            return Ok(Some(self.cursor.token(TokenKind::TagOpen, start)));
        }

        // Text runs to the next tag; a stray '<' is part of the text
        self.cursor.bump();
        while let Some(c) = self.cursor.peek() {
            if c == '<' && self.cursor.peek_nth(1).is_some_and(|n| n.is_alphabetic() || n == '/' || n == '!') {
                break;
            }
            self.cursor.bump();
        }
        Ok(Some(self.cursor.token(TokenKind::Text, start)))
    }

    fn in_tag(&mut self, name: String, tag_start: Position, after_equals: bool) -> Result<Token, LexError> {
        self.cursor.skip_whitespace();
        let start = self.cursor.pos();
        let Some(c) = self.cursor.peek() else {
            return Err(LexError::new(tag_start, format!("unterminated <{}> tag", name)));
        };

        let set_mode = |lexer: &mut Self, after_equals: bool| {
            lexer.mode = Mode::Tag {
                name: name.clone(),
                start: tag_start,
                after_equals,
            };
        };

        if c == '>' {
            self.cursor.bump();
            self.mode = if RAW_TEXT_ELEMENTS.iter().any(|r| r.eq_ignore_ascii_case(&name)) {
                Mode::Raw(name)
            } else {
                Mode::Content
            };
            return Ok(self.cursor.token(TokenKind::TagClose, start));
        }
        if self.cursor.starts_with("/>") {
            self.cursor.bump_n(2);
            self.mode = Mode::Content;
            return Ok(self.cursor.token(TokenKind::TagSelfClose, start));
        }
        if c == '<' {
            return Err(LexError::new(start, format!("unexpected '<' inside <{}> tag", name)));
        }
        if c == '=' {
            self.cursor.bump();
            set_mode(self, true);
            return Ok(self.cursor.token(TokenKind::Equals, start));
        }

        if after_equals {
            set_mode(self, false);
            if c == '"' || c == '\'' {
                let quote = self.cursor.quoted(true)?;
                return Ok(self.cursor.token(TokenKind::String(quote), start));
            }
            self.cursor
                .eat_while(|c| !c.is_whitespace() && c != '>' && c != '<');
            return Ok(self.cursor.token(TokenKind::Word, start));
        }

        if c == '"' || c == '\'' {
            return Err(LexError::new(start, "quoted text where an attribute name was expected"));
        }

        self.cursor.bump();
        while let Some(c) = self.cursor.peek() {
            if c.is_whitespace() || matches!(c, '>' | '=' | '"' | '\'' | '<') || self.cursor.starts_with("/>") {
                break;
            }
            self.cursor.bump();
        }
        Ok(self.cursor.token(TokenKind::AttrName, start))
    }

    fn raw_text(&mut self, name: &str) -> Result<Option<Token>, LexError> {
        let start = self.cursor.pos();
        let close = format!("</{}", name);
        while !self.cursor.starts_with_ignore_case(&close) {
            if self.cursor.bump().is_none() {
                return Err(LexError::new(start, format!("unterminated <{}> element", name)));
            }
        }
        self.mode = Mode::Content;
        if self.cursor.pos().offset == start.offset {
            return self.content();
        }
        Ok(Some(self.cursor.token(TokenKind::Text, start)))
    }
}

impl Iterator for MarkupLexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.lex_token() {
            Ok(Some(token)) => Some(Ok(token)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic()
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == ':' || c == '_' || c == '.'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Quote;

    fn lex(src: &str) -> Vec<(TokenKind, String)> {
        MarkupLexer::new(src)
            .map(|t| t.unwrap())
            .map(|t| (t.kind, t.text))
            .collect()
    }

    #[test]
    fn test_element_with_attributes() {
        let tokens = lex("<a id='x' href=/home disabled>Go</a>");
        assert_eq!(
            tokens,
            vec![
                (TokenKind::TagOpen, "<a".to_string()),
                (TokenKind::AttrName, "id".to_string()),
                (TokenKind::Equals, "=".to_string()),
                (TokenKind::String(Quote::Single), "'x'".to_string()),
                (TokenKind::AttrName, "href".to_string()),
                (TokenKind::Equals, "=".to_string()),
                (TokenKind::Word, "/home".to_string()),
                (TokenKind::AttrName, "disabled".to_string()),
                (TokenKind::TagClose, ">".to_string()),
                (TokenKind::Text, "Go".to_string()),
                (TokenKind::EndTag, "</a>".to_string()),
            ]
        );
    }

    #[test]
    fn test_doctype_comment_and_self_close() {
        let tokens = lex("<!DOCTYPE html>\n<!-- hi -->\n<br/>");
        assert_eq!(tokens[0].0, TokenKind::Doctype);
        assert_eq!(tokens[1], (TokenKind::Comment, "<!-- hi -->".to_string()));
        assert_eq!(tokens[3].0, TokenKind::TagSelfClose);
    }

    #[test]
    fn test_script_contents_are_raw() {
        let tokens = lex("<script>if (a < b) { x('</p>'); }</script>");
        assert_eq!(tokens[2].0, TokenKind::Text);
        assert!(tokens[2].1.contains("a < b"));
        assert_eq!(tokens[3], (TokenKind::EndTag, "</script>".to_string()));
    }

    #[test]
    fn test_empty_style_element() {
        let tokens = lex("<style></style>");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[2].0, TokenKind::EndTag);
    }

    #[test]
    fn test_multiline_attribute_value() {
        let tokens = lex("<div title=\"a\nb\">");
        assert_eq!(tokens[3].0, TokenKind::String(Quote::Double));
    }

    #[test]
    fn test_lex_errors() {
        let err = MarkupLexer::new("<div class=\"x").find_map(Result::err).unwrap();
        assert!(err.reason.contains("unterminated string"));

        let err = MarkupLexer::new("<p>\n<div id=a").find_map(Result::err).unwrap();
        assert_eq!(err.position.line, 2);
        assert!(err.reason.contains("<div>"));

        assert!(MarkupLexer::new("<!-- open").any(|t| t.is_err()));
        assert!(MarkupLexer::new("<script>x()").any(|t| t.is_err()));
    }

    #[test]
    fn test_stray_less_than_is_text() {
        let tokens = lex("<p>1 < 2</p>");
        assert_eq!(tokens[2], (TokenKind::Text, "1 < 2".to_string()));
    }
}
