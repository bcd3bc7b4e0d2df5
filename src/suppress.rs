//! Inline disable directives
//!
//! Directives live inside any comment syntax the dialects use:
//!
//! ```text
//! <!-- trellis-disable-next-line attribute-order -->
//! /* trellis-disable quotes, numeric-literal */
//! // trellis-disable-file var-group
//! ```
//!
//! `all` silences every rule.

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Pattern to match disable directives
static DIRECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:<!--|/\*|//)\s*trellis-disable(?P<scope>-next-line|-file)?\s+(?P<rules>[\w-]+(?:\s*,\s*[\w-]+)*)",
    )
    .unwrap()
});

/// Rules silenced per line and per file
#[derive(Debug, Clone, Default)]
pub struct Suppressions {
    lines: HashMap<String, HashSet<usize>>,
    file: HashSet<String>,
}

impl Suppressions {
    /// Scan source text for directives
    pub fn parse(source: &str) -> Self {
        let mut suppressions = Self::default();

        for (i, line) in source.lines().enumerate() {
            let line_num = i + 1;
            for cap in DIRECTIVE_RE.captures_iter(line) {
                let rules = cap["rules"].split(',').map(|r| r.trim().to_string());
                match cap.name("scope").map(|m| m.as_str()) {
                    Some("-file") => suppressions.file.extend(rules),
                    Some("-next-line") => {
                        for rule in rules {
                            suppressions.lines.entry(rule).or_default().insert(line_num + 1);
                        }
                    }
                    _ => {
                        for rule in rules {
                            suppressions.lines.entry(rule).or_default().insert(line_num);
                        }
                    }
                }
            }
        }

        suppressions
    }

    pub fn is_disabled(&self, rule_id: &str, line: usize) -> bool {
        if self.file.contains(rule_id) || self.file.contains("all") {
            return true;
        }
        [rule_id, "all"].iter().any(|id| {
            self.lines
                .get(*id)
                .is_some_and(|lines| lines.contains(&line))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.file.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_line_directive() {
        let s = Suppressions::parse("a { margin: .5em; } /* trellis-disable numeric-literal */");
        assert!(s.is_disabled("numeric-literal", 1));
        assert!(!s.is_disabled("numeric-literal", 2));
        assert!(!s.is_disabled("quotes", 1));
    }

    #[test]
    fn test_next_line_directive_with_list() {
        let src = "<!-- trellis-disable-next-line attribute-order, quotes -->\n<a class='x' id=y>";
        let s = Suppressions::parse(src);
        assert!(s.is_disabled("attribute-order", 2));
        assert!(s.is_disabled("quotes", 2));
        assert!(!s.is_disabled("quotes", 1));
    }

    #[test]
    fn test_file_directive_and_all() {
        let s = Suppressions::parse("// trellis-disable-file var-group\nvar a = 1;");
        assert!(s.is_disabled("var-group", 40));
        assert!(!s.is_disabled("chain-format", 2));

        let s = Suppressions::parse("// trellis-disable-file all");
        assert!(s.is_disabled("chain-format", 2));
    }

    #[test]
    fn test_directive_outside_comment_is_ignored() {
        let s = Suppressions::parse("content: 'trellis-disable quotes';");
        assert!(s.is_empty());
    }
}
