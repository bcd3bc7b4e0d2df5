//! Script plugin for JavaScript files

mod lexer;
mod parser;

pub use lexer::ScriptLexer;
pub use parser::ScriptParser;

use crate::plugin::{Plugin, SourceError};
use crate::source::{Dialect, SourceFile};
use crate::token::TokenStream;
use crate::tree::Document;

/// JavaScript plugin
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptPlugin;

impl ScriptPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl Plugin for ScriptPlugin {
    fn id(&self) -> &str {
        "script"
    }

    fn description(&self) -> &str {
        "JavaScript declaration groups and method chains"
    }

    fn dialect(&self) -> Dialect {
        Dialect::Script
    }

    fn parse(&self, source: &SourceFile) -> Result<Document, SourceError> {
        let tokens = TokenStream::collect_from(ScriptLexer::new(source.text()))?;
        let root = ScriptParser::new(&tokens).parse()?;
        Ok(Document::new(source.path(), Dialect::Script, root, source.text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeKind;

    #[test]
    fn test_plugin_id() {
        let plugin = ScriptPlugin::new();
        assert_eq!(plugin.id(), "script");
        assert!(plugin.extensions().contains(&"js"));
    }

    #[test]
    fn test_parse_document() {
        let src = SourceFile::new("app.js", "var a = 1;\nvar b = 2;\n", Dialect::Script);
        let doc = ScriptPlugin::new().parse(&src).unwrap();
        assert_eq!(doc.root().children.len(), 2);
        assert!(doc.root().children.iter().all(|c| c.is(NodeKind::VarDeclGroup)));
    }

    #[test]
    fn test_parse_failure_kinds() {
        let plugin = ScriptPlugin::new();
        let lex = SourceFile::new("a.js", "var s = 'open", Dialect::Script);
        assert_eq!(plugin.parse(&lex).unwrap_err().rule_id(), "lex-error");

        let parse = SourceFile::new("a.js", "if (a) {", Dialect::Script);
        assert_eq!(plugin.parse(&parse).unwrap_err().rule_id(), "parse-error");
    }
}
