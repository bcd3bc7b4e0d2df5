//! Structural tree produced by the dialect parsers

use crate::source::Dialect;
use crate::suppress::Suppressions;
use crate::token::{Quote, Span, Token, TokenKind};
use std::fmt;
use std::path::{Path, PathBuf};

/// Node kinds across all dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Document root
    Root,

    // Markup
    Element,
    Attribute,

    // Stylesheet
    /// Selector rule with no selector ancestor
    Selector,
    Extend,
    MixinInclude,
    Declaration,
    NestedRule,
    MediaQuery,
    PseudoRule,
    StateRule,
    /// Any other at-rule (`@import`, `@if`, `@keyframes`...)
    AtRule,

    // Shared
    Comment,

    // Script
    VarDeclGroup,
    /// Opaque script statement
    Statement,
    ChainCall,
}

impl NodeKind {
    /// Kinds whose name is a selector
    pub fn is_selector_rule(self) -> bool {
        matches!(
            self,
            NodeKind::Selector | NodeKind::NestedRule | NodeKind::PseudoRule | NodeKind::StateRule
        )
    }

    /// Kinds whose children form a rule body
    pub fn has_rule_body(self) -> bool {
        self.is_selector_rule() || matches!(self, NodeKind::MediaQuery | NodeKind::MixinInclude)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Root => "root",
            NodeKind::Element => "element",
            NodeKind::Attribute => "attribute",
            NodeKind::Selector => "selector",
            NodeKind::Extend => "@extend",
            NodeKind::MixinInclude => "@include",
            NodeKind::Declaration => "declaration",
            NodeKind::NestedRule => "nested rule",
            NodeKind::MediaQuery => "media query",
            NodeKind::PseudoRule => "pseudo-selector rule",
            NodeKind::StateRule => "state rule",
            NodeKind::AtRule => "at-rule",
            NodeKind::Comment => "comment",
            NodeKind::VarDeclGroup => "variable declaration",
            NodeKind::Statement => "statement",
            NodeKind::ChainCall => "method chain",
        };
        write!(f, "{}", name)
    }
}

/// A node in the parsed tree. Children are owned and kept in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    /// Tag name, attribute name, selector text, property, keyword...
    pub name: String,
    /// Value tokens: declaration value, attribute value, selector prelude,
    /// binding targets or chain suffixes depending on the kind
    pub value: Vec<Token>,
    pub span: Span,
    /// Blank lines between the previous token and this node
    pub blank_lines_before: usize,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(kind: NodeKind, name: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            name: name.into(),
            value: Vec::new(),
            span,
            blank_lines_before: 0,
            children: Vec::new(),
        }
    }

    pub fn with_value(mut self, value: Vec<Token>) -> Self {
        self.value = value;
        self
    }

    pub fn with_blank_lines(mut self, count: usize) -> Self {
        self.blank_lines_before = count;
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn is(&self, kind: NodeKind) -> bool {
        self.kind == kind
    }

    /// Attribute children of an element
    pub fn attributes(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter(|c| c.kind == NodeKind::Attribute)
    }

    /// Element children of an element
    pub fn elements(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter(|c| c.kind == NodeKind::Element)
    }

    /// Look up an attribute by name (case-insensitive)
    pub fn attribute(&self, name: &str) -> Option<&Node> {
        self.attributes()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// Unquoted text of an attribute value
    pub fn attribute_value(&self) -> Option<&str> {
        let token = self.value.first()?;
        Some(match token.kind {
            TokenKind::String(_) => strip_quotes(&token.text),
            _ => token.text.as_str(),
        })
    }

    /// Whitespace-separated class list of a `class` attribute
    pub fn class_list(&self) -> Vec<&str> {
        self.attribute_value()
            .map(|v| v.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// Quote style of an attribute value; `None` for unquoted or absent values
    pub fn quote(&self) -> Option<Quote> {
        match self.value.first()?.kind {
            TokenKind::String(q) => Some(q),
            _ => None,
        }
    }

    /// Depth-first iterator over this node and its descendants
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }
}

/// Depth-first pre-order iterator
pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Strip one pair of matching quotes
pub fn strip_quotes(s: &str) -> &str {
    let mut chars = s.chars();
    match (chars.next(), chars.next_back()) {
        (Some(a), Some(b)) if a == b && matches!(a, '"' | '\'' | '`') && s.len() >= 2 => {
            &s[1..s.len() - 1]
        }
        _ => s,
    }
}

/// A parsed file
#[derive(Debug)]
pub struct Document {
    path: PathBuf,
    dialect: Dialect,
    root: Node,
    source_lines: Vec<String>,
    suppressions: Suppressions,
}

impl Document {
    pub fn new(path: &Path, dialect: Dialect, root: Node, source: &str) -> Self {
        Self {
            path: path.to_path_buf(),
            dialect,
            root,
            source_lines: source.lines().map(String::from).collect(),
            suppressions: Suppressions::parse(source),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Get source line at line number (1-based)
    pub fn get_source_line(&self, line: usize) -> Option<&str> {
        if line > 0 && line <= self.source_lines.len() {
            Some(&self.source_lines[line - 1])
        } else {
            None
        }
    }

    /// Check whether an inline directive silences a rule at a line
    pub fn is_rule_disabled(&self, rule_id: &str, line: usize) -> bool {
        self.suppressions.is_disabled(rule_id, line)
    }
}
