//! Input resolution: files, directories and glob patterns

use crate::classifier::PatternError;
use crate::config::FilesConfig;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error resolving command-line inputs
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Invalid pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    #[error("No such file or directory: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<PatternError> for DiscoveryError {
    fn from(e: PatternError) -> Self {
        DiscoveryError::Pattern {
            pattern: e.pattern,
            message: e.message,
        }
    }
}

/// Resolves inputs to the list of files to lint
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    include: GlobSet,
    exclude: GlobSet,
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

fn has_glob_chars(input: &str) -> bool {
    input.contains(['*', '?', '['])
}

impl FileDiscovery {
    pub fn new(files: &FilesConfig) -> Result<Self, PatternError> {
        Ok(Self {
            include: build_set(&files.include)?,
            exclude: build_set(&files.exclude)?,
        })
    }

    /// Resolve inputs. Named files are always kept; files found by walking a
    /// directory or expanding a pattern must match `include` and not `exclude`.
    /// The result is sorted and free of duplicates.
    pub fn discover(&self, inputs: &[String]) -> Result<Vec<PathBuf>, DiscoveryError> {
        let mut files = Vec::new();

        for input in inputs {
            let path = Path::new(input);
            if path.is_file() {
                files.push(path.to_path_buf());
            } else if path.is_dir() {
                self.walk(path, &mut files)?;
            } else if has_glob_chars(input) {
                self.expand(input, &mut files)?;
            } else {
                return Err(DiscoveryError::NotFound(path.to_path_buf()));
            }
        }

        files.sort();
        files.dedup();
        log::debug!("Resolved {} input(s) to {} file(s)", inputs.len(), files.len());
        Ok(files)
    }

    fn wanted(&self, path: &Path) -> bool {
        self.include.is_match(path) && !self.exclude.is_match(path)
    }

    /// Probe a directory against `dir/**` style exclude patterns
    fn pruned(&self, dir: &Path) -> bool {
        self.exclude.is_match(dir) || self.exclude.is_match(dir.join("_"))
    }

    fn walk(&self, dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), DiscoveryError> {
        let io_err = |source| DiscoveryError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut entries = std::fs::read_dir(dir)
            .map_err(io_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(io_err)?;
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            let path = entry.path();
            if path.is_dir() {
                if self.pruned(&path) {
                    log::debug!("Skipping excluded directory {}", path.display());
                    continue;
                }
                self.walk(&path, files)?;
            } else if self.wanted(&path) {
                files.push(path);
            }
        }
        Ok(())
    }

    fn expand(&self, pattern: &str, files: &mut Vec<PathBuf>) -> Result<(), DiscoveryError> {
        let paths = glob::glob(pattern).map_err(|e| DiscoveryError::Pattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        for entry in paths.flatten() {
            if entry.is_file() && !self.exclude.is_match(&entry) {
                files.push(entry);
            }
        }
        Ok(())
    }
}
