//! SCSS / CSS tokenizer

use crate::token::{Cursor, LexError, Position, Token, TokenKind};

/// Lazy stylesheet token sequence. Cloning the lexer restarts the sequence
/// from the clone's position.
#[derive(Debug, Clone)]
pub struct StylesheetLexer<'a> {
    cursor: Cursor<'a>,
    depth: usize,
    prev: Option<(TokenKind, usize)>,
    done: bool,
}

impl<'a> StylesheetLexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            cursor: Cursor::new(src),
            depth: 0,
            prev: None,
            done: false,
        }
    }

    fn lex_token(&mut self) -> Result<Option<Token>, LexError> {
        self.cursor.skip_whitespace();
        let Some(c) = self.cursor.peek() else {
            return Ok(None);
        };
        let start = self.cursor.pos();

        if self.cursor.starts_with("/*") {
            self.cursor.block_comment()?;
            return Ok(Some(self.cursor.token(TokenKind::Comment, start)));
        }
        if self.cursor.starts_with("//") {
            self.cursor.line_comment();
            return Ok(Some(self.cursor.token(TokenKind::Comment, start)));
        }

        let single = |kind| Some(kind);
        let punct = match c {
            '{' => single(TokenKind::LBrace),
            '}' => single(TokenKind::RBrace),
            ';' => single(TokenKind::Semicolon),
            ':' => single(TokenKind::Colon),
            ',' => single(TokenKind::Comma),
            '(' => single(TokenKind::LParen),
            ')' => single(TokenKind::RParen),
            _ => None,
        };
        if let Some(kind) = punct {
            match kind {
                TokenKind::LBrace => self.depth += 1,
                TokenKind::RBrace => {
                    if self.depth == 0 {
                        return Err(LexError::new(start, "closing brace without an open block"));
                    }
                    self.depth -= 1;
                }
                _ => {}
            }
            self.cursor.bump();
            return Ok(Some(self.cursor.token(kind, start)));
        }

        if c == '\'' || c == '"' {
            let quote = self.cursor.quoted(false)?;
            return Ok(Some(self.cursor.token(TokenKind::String(quote), start)));
        }

        if c == '@' && self.cursor.peek_nth(1).is_some_and(is_ident_char) {
            self.cursor.bump();
            self.cursor.eat_while(is_ident_char);
            return Ok(Some(self.cursor.token(TokenKind::AtKeyword, start)));
        }

        if c == '$' && self.cursor.peek_nth(1).is_some_and(is_ident_char) {
            self.cursor.bump();
            self.cursor.eat_while(is_ident_char);
            return Ok(Some(self.cursor.token(TokenKind::Variable, start)));
        }

        if self.at_number(start) {
            self.number();
            return Ok(Some(self.cursor.token(TokenKind::Number, start)));
        }

        if self.cursor.starts_with_ignore_case("url(") && !self.url_is_quoted() {
            return self.raw_url(start).map(Some);
        }

        self.word(start)?;
        Ok(Some(self.cursor.token(TokenKind::Word, start)))
    }

    /// Numbers start with a digit, `.digit`, or a sign that cannot be an operator
    fn at_number(&self, start: Position) -> bool {
        let c0 = self.cursor.peek();
        let c1 = self.cursor.peek_nth(1);
        let c2 = self.cursor.peek_nth(2);
        let digit = |c: Option<char>| c.is_some_and(|c| c.is_ascii_digit());

        match c0 {
            Some(c) if c.is_ascii_digit() => true,
            Some('.') => digit(c1),
            Some('-') | Some('+') => {
                let unsigned = digit(c1) || (c1 == Some('.') && digit(c2));
                unsigned && self.sign_allowed(start)
            }
            _ => false,
        }
    }

    fn sign_allowed(&self, start: Position) -> bool {
        match self.prev {
            None => true,
            Some((kind, end)) => {
                end < start.offset
                    || matches!(
                        kind,
                        TokenKind::Number
                            | TokenKind::Colon
                            | TokenKind::Comma
                            | TokenKind::LParen
                            | TokenKind::LBrace
                            | TokenKind::Semicolon
                    )
            }
        }
    }

    fn number(&mut self) {
        if matches!(self.cursor.peek(), Some('-') | Some('+')) {
            self.cursor.bump();
        }
        self.cursor.eat_while(|c| c.is_ascii_digit());
        if self.cursor.peek() == Some('.')
            && self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit())
        {
            self.cursor.bump();
            self.cursor.eat_while(|c| c.is_ascii_digit());
        }
        self.cursor.eat_while(|c| c.is_ascii_alphabetic() || c == '%');
    }

    fn url_is_quoted(&self) -> bool {
        self.cursor.rest()[4..]
            .trim_start()
            .starts_with(['\'', '"'])
    }

    fn raw_url(&mut self, start: Position) -> Result<Token, LexError> {
        self.cursor.bump_n(4);
        loop {
            match self.cursor.bump() {
                None | Some('\n') => return Err(LexError::new(start, "unterminated url()")),
                Some(')') => return Ok(self.cursor.token(TokenKind::Word, start)),
                Some(_) => {}
            }
        }
    }

    fn word(&mut self, start: Position) -> Result<(), LexError> {
        while let Some(c) = self.cursor.peek() {
            if self.cursor.starts_with("#{") {
                self.interpolation()?;
                continue;
            }
            if c.is_whitespace()
                || matches!(c, '{' | '}' | ';' | ':' | ',' | '(' | ')' | '\'' | '"')
                || self.cursor.starts_with("/*")
                || self.cursor.starts_with("//")
            {
                break;
            }
            self.cursor.bump();
        }
        if self.cursor.pos().offset == start.offset {
            // Unreachable for well-formed input, but never loop without progress
            self.cursor.bump();
        }
        Ok(())
    }

    fn interpolation(&mut self) -> Result<(), LexError> {
        let start = self.cursor.pos();
        self.cursor.bump_n(2);
        let mut depth = 1;
        while depth > 0 {
            match self.cursor.bump() {
                None => return Err(LexError::new(start, "unterminated interpolation")),
                Some('{') => depth += 1,
                Some('}') => depth -= 1,
                Some(_) => {}
            }
        }
        Ok(())
    }
}

impl Iterator for StylesheetLexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.lex_token() {
            Ok(Some(token)) => {
                self.prev = Some((token.kind, token.span.end.offset));
                Some(Ok(token))
            }
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

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Quote;

    fn kinds(src: &str) -> Vec<(TokenKind, String)> {
        StylesheetLexer::new(src)
            .map(|t| t.unwrap())
            .map(|t| (t.kind, t.text))
            .collect()
    }

    #[test]
    fn test_rule_with_declaration() {
        let tokens = kinds(".card { margin: .5em 0; }");
        assert_eq!(
            tokens,
            vec![
                (TokenKind::Word, ".card".to_string()),
                (TokenKind::LBrace, "{".to_string()),
                (TokenKind::Word, "margin".to_string()),
                (TokenKind::Colon, ":".to_string()),
                (TokenKind::Number, ".5em".to_string()),
                (TokenKind::Number, "0".to_string()),
                (TokenKind::Semicolon, ";".to_string()),
                (TokenKind::RBrace, "}".to_string()),
            ]
        );
    }

    #[test]
    fn test_scss_tokens() {
        let tokens = kinds("@include mq($from: tablet) { $gap: -1px; }");
        assert_eq!(tokens[0], (TokenKind::AtKeyword, "@include".to_string()));
        assert_eq!(tokens[3], (TokenKind::Variable, "$from".to_string()));
        assert!(tokens.contains(&(TokenKind::Number, "-1px".to_string())));
    }

    #[test]
    fn test_minus_operator_is_not_a_sign() {
        let tokens = kinds("width: $a -1px;");
        assert!(tokens.contains(&(TokenKind::Number, "-1px".to_string())));

        let tokens = kinds("width: calc(1px)-2px;");
        assert!(tokens.contains(&(TokenKind::Word, "-2px".to_string())));
    }

    #[test]
    fn test_sign_glued_to_number_starts_a_number() {
        let tokens = kinds("width: calc(100%-.5em);");
        assert!(tokens.contains(&(TokenKind::Number, "100%".to_string())));
        assert!(tokens.contains(&(TokenKind::Number, "-.5em".to_string())));
    }

    #[test]
    fn test_strings_and_comments() {
        let tokens = kinds("/* a */ content: 'x'; // tail\nfont-family: \"Helvetica\";");
        assert_eq!(tokens[0].0, TokenKind::Comment);
        assert!(tokens.contains(&(TokenKind::String(Quote::Single), "'x'".to_string())));
        assert!(tokens.contains(&(TokenKind::Comment, "// tail".to_string())));
        assert!(tokens.contains(&(TokenKind::String(Quote::Double), "\"Helvetica\"".to_string())));
    }

    #[test]
    fn test_interpolation_and_url() {
        let tokens = kinds(".icon-#{$name} { background: url(http://x.test/a.png); }");
        assert_eq!(tokens[0], (TokenKind::Word, ".icon-#{$name}".to_string()));
        assert!(tokens.contains(&(TokenKind::Word, "url(http://x.test/a.png)".to_string())));
    }

    #[test]
    fn test_selector_pieces() {
        let tokens = kinds("&:hover, &__title {}");
        assert_eq!(tokens[0], (TokenKind::Word, "&".to_string()));
        assert_eq!(tokens[1].0, TokenKind::Colon);
        assert_eq!(tokens[4], (TokenKind::Word, "&__title".to_string()));
    }

    #[test]
    fn test_lex_errors() {
        let err = StylesheetLexer::new("a { content: 'open; }")
            .find_map(Result::err)
            .unwrap();
        assert!(err.reason.contains("unterminated string"));

        let err = StylesheetLexer::new("a {} }").find_map(Result::err).unwrap();
        assert_eq!(err.position.column, 6);

        assert!(StylesheetLexer::new("/* open").any(|t| t.is_err()));
    }

    #[test]
    fn test_lexer_restarts_from_clone() {
        let mut lexer = StylesheetLexer::new("a { b: c; }");
        lexer.next();
        let restarted: Vec<_> = lexer.clone().map(|t| t.unwrap().text).collect();
        let continued: Vec<_> = lexer.map(|t| t.unwrap().text).collect();
        assert_eq!(restarted, continued);
        assert_eq!(restarted.first().map(String::as_str), Some("{"));
    }

    #[test]
    fn test_lexer_stops_after_error() {
        let tokens: Vec<_> = StylesheetLexer::new("} a").collect();
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].is_err());
    }
}
