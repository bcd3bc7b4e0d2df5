//! Plugin system for dialect-specific tokenizing and parsing

use crate::source::{Dialect, SourceFile};
use crate::token::{LexError, Position};
use crate::tree::Document;
use thiserror::Error;

/// Malformed nesting found while building the tree
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("parse error at {position}: expected {expected}, found {found}")]
pub struct ParseError {
    pub position: Position,
    pub expected: String,
    pub found: String,
}

impl ParseError {
    pub fn new(position: Position, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self {
            position,
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// Why a file could not be linted
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl SourceError {
    /// Pseudo rule id used when reporting the failure
    pub fn rule_id(&self) -> &'static str {
        match self {
            SourceError::Lex(_) => "lex-error",
            SourceError::Parse(_) => "parse-error",
        }
    }

    pub fn position(&self) -> Position {
        match self {
            SourceError::Lex(e) => e.position,
            SourceError::Parse(e) => e.position,
        }
    }
}

/// Plugin trait for dialect-specific parsing
pub trait Plugin: Send + Sync {
    /// Plugin identifier (e.g., "markup", "stylesheet")
    fn id(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str;

    /// Dialect handled by this plugin
    fn dialect(&self) -> Dialect;

    /// File extensions this plugin handles (without dot)
    fn extensions(&self) -> &[&str] {
        self.dialect().extensions()
    }

    /// Tokenize and parse a source file into a document tree
    fn parse(&self, source: &SourceFile) -> Result<Document, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::new(Position::new(10, 3, 120), "'}'", "end of file");
        assert_eq!(
            format!("{}", err),
            "parse error at 10:3: expected '}', found end of file"
        );
    }

    #[test]
    fn test_source_error_rule_id() {
        let lex: SourceError = LexError::new(Position::start(), "unterminated string").into();
        assert_eq!(lex.rule_id(), "lex-error");
        assert_eq!(lex.to_string(), "lex error at 1:1: unterminated string");

        let parse: SourceError = ParseError::new(Position::start(), "a", "b").into();
        assert_eq!(parse.rule_id(), "parse-error");
    }
}
