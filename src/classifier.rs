//! Selector fragment classification
//!
//! CSS syntax alone does not separate sub-element pseudo selectors
//! (`&:before`) from interaction states (`&:hover`), so both are resolved
//! against configurable pattern tables.

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid selector pattern
#[derive(Debug, Error)]
#[error("invalid selector pattern '{pattern}': {message}")]
pub struct PatternError {
    pub pattern: String,
    pub message: String,
}

/// Pattern tables for `&`-prefixed selector fragments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorPatterns {
    /// Fragments denoting user-interaction state
    pub state: Vec<String>,

    /// Fragments denoting engine-rendered sub-states
    pub pseudo: Vec<String>,
}

impl Default for SelectorPatterns {
    fn default() -> Self {
        let to_vec = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            state: to_vec(&[
                ":hover",
                ":focus",
                ":focus-within",
                ":focus-visible",
                ":active",
                ":visited",
                ":checked",
                ":disabled",
                ":enabled",
                ":target",
                ":valid",
                ":invalid",
                ".is-*",
                ".has-*",
            ]),
            pseudo: to_vec(&[
                "::*",
                ":before",
                ":after",
                ":first-child",
                ":last-child",
                ":only-child",
                ":first-of-type",
                ":last-of-type",
                ":nth-*",
                ":not(*)",
                ":empty",
                ":placeholder",
                ":first-letter",
                ":first-line",
                ":selection",
            ]),
        }
    }
}

/// Structural class of a selector as seen from its parent rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorClass {
    /// `&__element`
    BemElement,
    /// `&:before`, `&::after`, `&:first-child`
    Pseudo,
    /// `&:hover`, `&.is-active`
    State,
    /// Any other `&` composition (`&--modifier`, `&.other`, `.no-js &`)
    Parent,
    /// Class or id selector without `&`, which starts a new block
    Block,
    /// Bare tag, attribute or universal selector
    Tag,
}

/// Compiled classifier
#[derive(Debug, Clone)]
pub struct SelectorClassifier {
    state: GlobSet,
    pseudo: GlobSet,
}

impl Default for SelectorClassifier {
    fn default() -> Self {
        Self::new(&SelectorPatterns::default()).unwrap_or_else(|_| Self {
            state: GlobSet::empty(),
            pseudo: GlobSet::empty(),
        })
    }
}

impl SelectorClassifier {
    pub fn new(patterns: &SelectorPatterns) -> Result<Self, PatternError> {
        Ok(Self {
            state: build_set(&patterns.state)?,
            pseudo: build_set(&patterns.pseudo)?,
        })
    }

    /// Classify a (possibly comma-separated) selector by its first part
    pub fn classify(&self, selector: &str) -> SelectorClass {
        let first = selector.split(',').next().unwrap_or("").trim();

        if let Some(rest) = first.strip_prefix('&') {
            if rest.starts_with("__") {
                return SelectorClass::BemElement;
            }
            if rest.starts_with(':') || rest.starts_with('.') {
                let fragment = leading_fragment(rest);
                if self.state.is_match(fragment) {
                    return SelectorClass::State;
                }
                if self.pseudo.is_match(fragment) || rest.starts_with(':') {
                    return SelectorClass::Pseudo;
                }
            }
            return SelectorClass::Parent;
        }

        if first.contains('&') {
            return SelectorClass::Parent;
        }
        if first.starts_with('.') || first.starts_with('#') || first.starts_with('%') {
            return SelectorClass::Block;
        }
        SelectorClass::Tag
    }
}

fn build_set(patterns: &[String]) -> Result<GlobSet, PatternError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| PatternError {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| PatternError {
        pattern: patterns.join(", "),
        message: e.to_string(),
    })
}

/// First simple pseudo/class fragment: `:hover` of `:hover:before`,
/// `:not(.a)` of `:not(.a) > b`, `.is-open` of `.is-open.is-x`
fn leading_fragment(s: &str) -> &str {
    let prefix_len = if s.starts_with("::") { 2 } else { 1 };
    let mut depth = 0usize;
    for (i, c) in s.char_indices().skip(prefix_len) {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return &s[..i + 1];
                }
            }
            ':' | '.' | ' ' | '>' | '+' | '~' | '[' | ',' if depth == 0 => return &s[..i],
            _ => {}
        }
    }
    s
}
