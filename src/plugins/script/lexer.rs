//! JavaScript tokenizer (enough of it to find statements and call chains)

use crate::token::{Cursor, LexError, Position, Quote, Token, TokenKind};

/// Punctuators, longest first
const PUNCTUATORS: &[&str] = &[
    ">>>=", "...", "===", "!==", "**=", "<<=", ">>=", ">>>", "&&=", "||=", "??=", "=>", "==",
    "!=", "<=", ">=", "&&", "||", "??", "?.", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=",
    "|=", "^=", "**", "<<", ">>", "{", "}", "(", ")", "[", "]", ";", ",", ".", "<", ">", "+",
    "-", "*", "/", "%", "&", "|", "^", "!", "~", "?", ":", "=", "@", "#",
];

/// Keywords after which a `/` starts a regular expression
const REGEX_PREFIX_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case", "do",
    "else", "yield", "await",
];

/// Lazy script token sequence
#[derive(Debug, Clone)]
pub struct ScriptLexer<'a> {
    cursor: Cursor<'a>,
    /// Whether the previous significant token ends an expression
    prev_ends_expression: bool,
    done: bool,
}

impl<'a> ScriptLexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            cursor: Cursor::new(src),
            prev_ends_expression: false,
            done: false,
        }
    }

    fn lex_token(&mut self) -> Result<Option<Token>, LexError> {
        self.cursor.skip_whitespace();
        let Some(c) = self.cursor.peek() else {
            return Ok(None);
        };
        let start = self.cursor.pos();

        if self.cursor.starts_with("//") {
            self.cursor.line_comment();
            return Ok(Some(self.cursor.token(TokenKind::Comment, start)));
        }
        if self.cursor.starts_with("/*") {
            self.cursor.block_comment()?;
            return Ok(Some(self.cursor.token(TokenKind::Comment, start)));
        }

        if c == '\'' || c == '"' {
            let quote = self.cursor.quoted(false)?;
            return Ok(Some(self.cursor.token(TokenKind::String(quote), start)));
        }
        if c == '`' {
            self.template(start)?;
            return Ok(Some(self.cursor.token(TokenKind::String(Quote::Backtick), start)));
        }

        if c.is_ascii_digit()
            || (c == '.' && self.cursor.peek_nth(1).is_some_and(|d| d.is_ascii_digit()))
        {
            self.cursor.eat_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
            return Ok(Some(self.cursor.token(TokenKind::Number, start)));
        }

        if is_ident_start(c) {
            self.cursor.eat_while(is_ident_char);
            return Ok(Some(self.cursor.token(TokenKind::Ident, start)));
        }

        if c == '/' && !self.prev_ends_expression {
            self.regex(start)?;
            return Ok(Some(self.cursor.token(TokenKind::Word, start)));
        }

        let rest = self.cursor.rest();
        match PUNCTUATORS.iter().find(|p| rest.starts_with(**p)) {
            Some(punct) => {
                self.cursor.bump_n(punct.chars().count());
                Ok(Some(self.cursor.token(TokenKind::Punct, start)))
            }
            None => Err(LexError::new(start, format!("unexpected character '{}'", c))),
        }
    }

    /// Template literal, including nested `${...}` substitutions
    fn template(&mut self, start: Position) -> Result<(), LexError> {
        self.cursor.bump();
        loop {
            match self.cursor.bump() {
                None => return Err(LexError::new(start, "unterminated template literal")),
                Some('\\') => {
                    self.cursor.bump();
                }
                Some('`') => return Ok(()),
                Some('$') if self.cursor.peek() == Some('{') => {
                    self.cursor.bump();
                    self.substitution(start)?;
                }
                Some(_) => {}
            }
        }
    }

    fn substitution(&mut self, start: Position) -> Result<(), LexError> {
        let mut depth = 1;
        while depth > 0 {
            match self.cursor.peek() {
                None => return Err(LexError::new(start, "unterminated template literal")),
                Some('{') => depth += 1,
                Some('}') => depth -= 1,
                Some('\'') | Some('"') => {
                    self.cursor.quoted(false)?;
                    continue;
                }
                Some('`') => {
                    let nested = self.cursor.pos();
                    self.template(nested)?;
                    continue;
                }
                Some(_) => {}
            }
            self.cursor.bump();
        }
        Ok(())
    }

    fn regex(&mut self, start: Position) -> Result<(), LexError> {
        self.cursor.bump();
        let mut in_class = false;
        loop {
            match self.cursor.bump() {
                None | Some('\n') => {
                    return Err(LexError::new(start, "unterminated regular expression"))
                }
                Some('\\') => {
                    self.cursor.bump();
                }
                Some('[') => in_class = true,
                Some(']') => in_class = false,
                Some('/') if !in_class => break,
                Some(_) => {}
            }
        }
        self.cursor.eat_while(|c| c.is_ascii_alphabetic());
        Ok(())
    }
}

impl Iterator for ScriptLexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.lex_token() {
            Ok(Some(token)) => {
                if !token.is(TokenKind::Comment) {
                    self.prev_ends_expression = ends_expression(&token);
                }
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

/// Whether a token can be the last token of an expression
pub fn ends_expression(token: &Token) -> bool {
    match token.kind {
        TokenKind::Ident => !REGEX_PREFIX_KEYWORDS.contains(&token.text.as_str()),
        TokenKind::Number | TokenKind::String(_) | TokenKind::Word => true,
        TokenKind::Punct => matches!(token.text.as_str(), ")" | "]" | "}" | "++" | "--"),
        _ => false,
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}
