//! Markup plugin for HTML files

mod lexer;
mod parser;

pub use lexer::MarkupLexer;
pub use parser::{is_void_element, MarkupParser, VOID_ELEMENTS};

use crate::plugin::{Plugin, SourceError};
use crate::source::{Dialect, SourceFile};
use crate::token::TokenStream;
use crate::tree::Document;

/// HTML plugin
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupPlugin;

impl MarkupPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl Plugin for MarkupPlugin {
    fn id(&self) -> &str {
        "markup"
    }

    fn description(&self) -> &str {
        "HTML documents"
    }

    fn dialect(&self) -> Dialect {
        Dialect::Markup
    }

    fn parse(&self, source: &SourceFile) -> Result<Document, SourceError> {
        let tokens = TokenStream::collect_from(MarkupLexer::new(source.text()))?;
        let root = MarkupParser::new(&tokens).parse()?;
        Ok(Document::new(source.path(), Dialect::Markup, root, source.text()))
    }
}
