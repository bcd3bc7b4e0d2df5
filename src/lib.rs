//! Trellis - Style-Guide Linter
//!
//! A fast linter that enforces structural and formatting conventions in
//! HTML, nested SCSS and JavaScript: attribute order, BEM nesting depth,
//! declaration order, quoting, numeric literals, block whitespace,
//! declaration grouping and method-chain layout.
//!
//! # Architecture
//!
//! ```text
//! CLI -> FileDiscovery -> Engine -> Plugin (lex + parse) -> Document
//!                           |
//!                           +-> RuleSet (one traversal per file) -> LintResult -> OutputFormatter
//! ```
//!
//! Each dialect plugin turns source text into a tree of owned [`tree::Node`]s.
//! The engine walks that tree once, depth first and in source order, handing
//! every node and a transient [`rule::Context`] to each enabled rule.
//!
//! # Inline suppression
//!
//! ```scss
//! .legacy {
//!   // trellis-disable-next-line numeric-literal
//!   margin: .5em;
//! }
//! ```

pub mod classifier;
pub mod collector;
pub mod config;
pub mod diagnostic;
pub mod discovery;
pub mod engine;
pub mod output;
pub mod plugin;
pub mod rule;
pub mod rules;
pub mod source;
pub mod suppress;
pub mod token;
pub mod tree;

// Re-export main types
pub use classifier::{SelectorClass, SelectorClassifier, SelectorPatterns};
pub use collector::LintResult;
pub use config::{Config, ConfigError};
pub use diagnostic::{Diagnostic, Location, Severity};
pub use discovery::{DiscoveryError, FileDiscovery};
pub use engine::Engine;
pub use output::{JsonFormatter, OutputFormatter, TextFormatter};
pub use plugin::{ParseError, Plugin, SourceError};
pub use rule::{Context, Outcome, Rule, RuleMeta, RuleSet, Violation};
pub use source::{Dialect, SourceFile};
pub use token::{LexError, Position, Span, Token, TokenKind};
pub use tree::{Document, Node, NodeKind};

// Built-in plugins
pub mod plugins {
    pub mod markup;
    pub mod script;
    pub mod stylesheet;
}
