//! Stylesheet plugin for SCSS and CSS files

mod lexer;
mod parser;

pub use lexer::StylesheetLexer;
pub use parser::StylesheetParser;

use crate::classifier::SelectorClassifier;
use crate::plugin::{Plugin, SourceError};
use crate::source::{Dialect, SourceFile};
use crate::token::TokenStream;
use crate::tree::Document;

/// Stylesheet plugin
#[derive(Debug, Clone, Default)]
pub struct StylesheetPlugin {
    classifier: SelectorClassifier,
}

impl StylesheetPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom state/pseudo classification table
    pub fn with_classifier(classifier: SelectorClassifier) -> Self {
        Self { classifier }
    }
}

impl Plugin for StylesheetPlugin {
    fn id(&self) -> &str {
        "stylesheet"
    }

    fn description(&self) -> &str {
        "SCSS and CSS stylesheets"
    }

    fn dialect(&self) -> Dialect {
        Dialect::Stylesheet
    }

    fn parse(&self, source: &SourceFile) -> Result<Document, SourceError> {
        let tokens = TokenStream::collect_from(StylesheetLexer::new(source.text()))?;
        let root = StylesheetParser::new(source.text(), &tokens, &self.classifier).parse()?;
        Ok(Document::new(source.path(), Dialect::Stylesheet, root, source.text()))
    }
}
