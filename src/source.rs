//! Source files and dialect detection

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Language family of a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Markup,
    Stylesheet,
    Script,
}

impl Dialect {
    pub const ALL: [Dialect; 3] = [Dialect::Markup, Dialect::Stylesheet, Dialect::Script];

    /// Infer the dialect from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        Self::from_extension(&ext)
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "html" | "htm" | "xhtml" => Some(Dialect::Markup),
            "scss" | "css" => Some(Dialect::Stylesheet),
            "js" | "mjs" | "cjs" => Some(Dialect::Script),
            _ => None,
        }
    }

    /// File extensions handled by this dialect
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Dialect::Markup => &["html", "htm", "xhtml"],
            Dialect::Stylesheet => &["scss", "css"],
            Dialect::Script => &["js", "mjs", "cjs"],
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Markup => write!(f, "markup"),
            Dialect::Stylesheet => write!(f, "stylesheet"),
            Dialect::Script => write!(f, "script"),
        }
    }
}

impl std::str::FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markup" | "html" => Ok(Dialect::Markup),
            "stylesheet" | "scss" | "css" => Ok(Dialect::Stylesheet),
            "script" | "js" | "javascript" => Ok(Dialect::Script),
            _ => Err(format!("Unknown dialect: {}", s)),
        }
    }
}

/// A loaded source file
#[derive(Debug, Clone)]
pub struct SourceFile {
    path: PathBuf,
    text: String,
    dialect: Dialect,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>, dialect: Dialect) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
            dialect,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Source line at line number (1-based)
    pub fn line(&self, line: usize) -> Option<&str> {
        if line == 0 {
            return None;
        }
        self.text.lines().nth(line - 1)
    }
}
