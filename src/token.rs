//! Tokens, positions and the shared scanning cursor used by every dialect lexer

use std::fmt;
use thiserror::Error;

/// A point in the source text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based, in characters)
    pub column: usize,
    /// Byte offset from the start of the file
    pub offset: usize,
}

impl Position {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }

    /// Start of a file
    pub fn start() -> Self {
        Self::new(1, 1, 0)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Half-open region of source text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both
    pub fn cover(self, other: Span) -> Span {
        let start = if other.start.offset < self.start.offset {
            other.start
        } else {
            self.start
        };
        let end = if other.end.offset > self.end.offset {
            other.end
        } else {
            self.end
        };
        Span { start, end }
    }
}

/// Quote character of a string token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quote {
    Single,
    Double,
    Backtick,
}

impl Quote {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '\'' => Some(Quote::Single),
            '"' => Some(Quote::Double),
            '`' => Some(Quote::Backtick),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Quote::Single => '\'',
            Quote::Double => '"',
            Quote::Backtick => '`',
        }
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quote::Single => write!(f, "single"),
            Quote::Double => write!(f, "double"),
            Quote::Backtick => write!(f, "backtick"),
        }
    }
}

/// Token kinds for all dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Shared
    Comment,
    String(Quote),
    Number,
    Word,

    // Stylesheet
    LBrace,
    RBrace,
    Semicolon,
    Colon,
    Comma,
    LParen,
    RParen,
    AtKeyword,
    Variable,

    // Markup
    TagOpen,
    TagClose,
    TagSelfClose,
    EndTag,
    AttrName,
    Equals,
    Text,
    Doctype,

    // Script
    Ident,
    Punct,
}

/// A lexical token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: &str, span: Span) -> Self {
        Self {
            kind,
            text: text.to_string(),
            span,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    pub fn is_punct(&self, text: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == text
    }

    pub fn line(&self) -> usize {
        self.span.start.line
    }
}

/// Error produced when text cannot be tokenized
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("lex error at {position}: {reason}")]
pub struct LexError {
    pub position: Position,
    pub reason: String,
}

impl LexError {
    pub fn new(position: Position, reason: impl Into<String>) -> Self {
        Self {
            position,
            reason: reason.into(),
        }
    }
}

/// The fully materialized token sequence of one file
#[derive(Debug, Clone, Default)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    /// Collect a lexer, stopping at the first error
    pub fn collect_from<I>(lexer: I) -> Result<Self, LexError>
    where
        I: Iterator<Item = Result<Token, LexError>>,
    {
        let tokens = lexer.collect::<Result<Vec<_>, _>>()?;
        Ok(Self { tokens })
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn get(&self, idx: usize) -> Option<&Token> {
        self.tokens.get(idx)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Number of blank lines between the end of token `a` and the start of token `b`.
    ///
    /// Whitespace is never emitted, so every line strictly between two adjacent
    /// tokens holds nothing but whitespace.
    pub fn blank_lines_between(&self, a: usize, b: usize) -> usize {
        match (self.tokens.get(a), self.tokens.get(b)) {
            (Some(first), Some(second)) => second
                .span
                .start
                .line
                .saturating_sub(first.span.end.line)
                .saturating_sub(1),
            _ => 0,
        }
    }
}

/// Character cursor with line/column tracking
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    src: &'a str,
    offset: usize,
    line: usize,
    column: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn pos(&self) -> Position {
        Position::new(self.line, self.column, self.offset)
    }

    pub fn is_eof(&self) -> bool {
        self.offset >= self.src.len()
    }

    pub fn rest(&self) -> &'a str {
        &self.src[self.offset..]
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    pub fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    /// Case-insensitive prefix test (ASCII)
    pub fn starts_with_ignore_case(&self, s: &str) -> bool {
        let rest = self.rest();
        rest.len() >= s.len()
            && rest.is_char_boundary(s.len())
            && rest[..s.len()].eq_ignore_ascii_case(s)
    }

    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    pub fn bump_n(&mut self, n: usize) {
        for _ in 0..n {
            if self.bump().is_none() {
                break;
            }
        }
    }

    pub fn eat_while(&mut self, mut pred: impl FnMut(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.bump();
        }
    }

    pub fn skip_whitespace(&mut self) {
        self.eat_while(char::is_whitespace);
    }

    pub fn slice(&self, start: Position) -> &'a str {
        &self.src[start.offset..self.offset]
    }

    /// Finish a token that started at `start`
    pub fn token(&self, kind: TokenKind, start: Position) -> Token {
        Token::new(kind, self.slice(start), Span::new(start, self.pos()))
    }

    /// Consume a quoted string whose opening quote is the next character.
    /// Newlines are allowed only when `multiline` is set.
    pub fn quoted(&mut self, multiline: bool) -> Result<Quote, LexError> {
        let start = self.pos();
        let open = self
            .bump()
            .ok_or_else(|| LexError::new(start, "expected string"))?;
        let quote =
            Quote::from_char(open).ok_or_else(|| LexError::new(start, "expected quote"))?;
        loop {
            match self.bump() {
                None => return Err(LexError::new(start, "unterminated string")),
                Some('\\') => {
                    self.bump();
                }
                Some('\n') if !multiline => {
                    return Err(LexError::new(start, "unterminated string"));
                }
                Some(c) if c == open => return Ok(quote),
                Some(_) => {}
            }
        }
    }

    /// Consume a `/* ... */` comment; the cursor is on the opening slash
    pub fn block_comment(&mut self) -> Result<(), LexError> {
        let start = self.pos();
        self.bump_n(2);
        loop {
            if self.is_eof() {
                return Err(LexError::new(start, "unterminated comment"));
            }
            if self.starts_with("*/") {
                self.bump_n(2);
                return Ok(());
            }
            self.bump();
        }
    }

    /// Consume a `// ...` comment up to (not including) the newline
    pub fn line_comment(&mut self) {
        self.eat_while(|c| c != '\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_tracks_lines_and_columns() {
        let mut cursor = Cursor::new("ab\ncd");
        cursor.bump_n(3);
        assert_eq!(cursor.pos(), Position::new(2, 1, 3));
        cursor.bump();
        assert_eq!(cursor.pos(), Position::new(2, 2, 4));
    }

    #[test]
    fn test_quoted_string() {
        let mut cursor = Cursor::new("'it\\'s' rest");
        assert_eq!(cursor.quoted(false), Ok(Quote::Single));
        assert_eq!(cursor.rest(), " rest");

        let mut cursor = Cursor::new("\"open\nline\"");
        assert!(cursor.quoted(false).is_err());
    }

    #[test]
    fn test_unterminated_block_comment() {
        let mut cursor = Cursor::new("/* never closed");
        let err = cursor.block_comment().unwrap_err();
        assert_eq!(err.position, Position::start());
        assert!(err.reason.contains("comment"));
    }

    #[test]
    fn test_blank_lines_between() {
        let tok = |line: usize| {
            Token::new(
                TokenKind::Word,
                "x",
                Span::new(Position::new(line, 1, 0), Position::new(line, 2, 1)),
            )
        };
        let stream = TokenStream::new(vec![tok(1), tok(2), tok(5)]);
        assert_eq!(stream.blank_lines_between(0, 1), 0);
        assert_eq!(stream.blank_lines_between(1, 2), 2);
        assert_eq!(stream.blank_lines_between(1, 9), 0);
    }

    #[test]
    fn test_span_cover() {
        let a = Span::new(Position::new(1, 1, 0), Position::new(1, 3, 2));
        let b = Span::new(Position::new(2, 1, 10), Position::new(2, 4, 13));
        let c = a.cover(b);
        assert_eq!(c.start.offset, 0);
        assert_eq!(c.end.offset, 13);
    }
}
