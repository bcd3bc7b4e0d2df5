//! Configuration system for the linter
//!
//! Reads configuration from:
//! - `.trellisrc.yaml` / `.trellisrc.yml` / `.trellisrc.json` (project-level)
//! - the same names in the home directory (user-level)

use crate::classifier::{PatternError, SelectorPatterns};
use crate::diagnostic::Severity;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File names searched by [`Config::load_default`]
pub const CONFIG_FILE_NAMES: &[&str] = &[".trellisrc.yaml", ".trellisrc.yml", ".trellisrc.json"];

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Unknown rule '{0}'")]
    UnknownRule(String),

    #[error("Invalid parameter '{parameter}' for rule '{rule}': {message}")]
    InvalidParameter {
        rule: String,
        parameter: String,
        message: String,
    },

    #[error(transparent)]
    Pattern(#[from] PatternError),
}

impl ConfigError {
    pub fn invalid_parameter(rule: &str, parameter: &str, message: impl Into<String>) -> Self {
        ConfigError::InvalidParameter {
            rule: rule.to_string(),
            parameter: parameter.to_string(),
            message: message.into(),
        }
    }
}

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Enable parallel processing
    pub parallel: bool,

    /// Number of parallel jobs (0 = auto-detect)
    pub jobs: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            jobs: 0,
        }
    }
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format
    pub format: OutputFormat,

    /// Color mode
    pub color: ColorMode,

    /// Show statistics after the text report
    pub statistics: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            color: ColorMode::Auto,
            statistics: false,
        }
    }
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    #[serde(alias = "json")]
    Structured,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "structured" | "json" => Ok(OutputFormat::Structured),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Color mode options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

/// File handling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Include patterns, applied when walking directories
    pub include: Vec<String>,

    /// Exclude patterns
    pub exclude: Vec<String>,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            include: vec![
                "**/*.html".to_string(),
                "**/*.htm".to_string(),
                "**/*.scss".to_string(),
                "**/*.css".to_string(),
                "**/*.js".to_string(),
                "**/*.mjs".to_string(),
            ],
            exclude: vec![
                "**/node_modules/**".to_string(),
                "**/vendor/**".to_string(),
                "**/dist/**".to_string(),
                "**/*.min.js".to_string(),
                "**/*.min.css".to_string(),
            ],
        }
    }
}

/// Per-rule settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSettings {
    /// Whether the rule runs (unset = built-in default)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Severity override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,

    /// Rule-specific parameters
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, serde_yaml::Value>,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Engine settings
    pub engine: EngineConfig,

    /// Output settings
    pub output: OutputConfig,

    /// File handling settings
    pub files: FilesConfig,

    /// State/pseudo selector pattern tables
    pub selectors: SelectorPatterns,

    /// Rule settings (rule id -> settings)
    pub rules: BTreeMap<String, RuleSettings>,

    /// Per-file rule ignores (glob pattern -> rule IDs)
    pub per_file: BTreeMap<String, Vec<String>>,
}

impl Config {
    /// Create default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let config: Self = match ext {
            "yaml" | "yml" => serde_yaml::from_str(&content)?,
            "json" => serde_json::from_str(&content)?,
            _ => {
                return Err(ConfigError::Invalid(format!(
                    "Unknown config file format: {}",
                    ext
                )))
            }
        };

        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load the first `.trellisrc.*` found in the working directory, then in
    /// the home directory; defaults when there is none
    pub fn load_default() -> Result<Self, ConfigError> {
        let search = [Some(PathBuf::from(".")), dirs::home_dir()];
        let found = search
            .iter()
            .flatten()
            .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
            .find(|path| path.is_file());

        match found {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Merge CLI arguments into configuration
    pub fn merge_cli(
        &mut self,
        format: Option<OutputFormat>,
        jobs: Option<usize>,
        disabled_rules: Option<Vec<String>>,
        bem_depth: Option<usize>,
        no_color: bool,
    ) {
        if let Some(f) = format {
            self.output.format = f;
        }
        if let Some(j) = jobs {
            self.engine.jobs = j;
        }
        if let Some(disabled) = disabled_rules {
            for rule_id in disabled {
                self.rules.entry(rule_id).or_default().enabled = Some(false);
            }
        }
        if let Some(depth) = bem_depth {
            self.rules
                .entry("bem-depth".to_string())
                .or_default()
                .parameters
                .insert("max-depth".to_string(), serde_yaml::Value::from(depth as u64));
        }
        if no_color {
            self.output.color = ColorMode::Never;
        }
    }

    /// Compile the `per_file` table
    pub fn per_file_ignores(&self) -> Result<PerFileIgnores, ConfigError> {
        PerFileIgnores::new(&self.per_file)
    }

    /// Serialize as YAML (used by `init`)
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Compiled per-file rule ignores
#[derive(Debug, Clone)]
pub struct PerFileIgnores {
    set: GlobSet,
    rules: Vec<Vec<String>>,
}

impl Default for PerFileIgnores {
    fn default() -> Self {
        Self {
            set: GlobSet::empty(),
            rules: Vec::new(),
        }
    }
}

impl PerFileIgnores {
    pub fn new(table: &BTreeMap<String, Vec<String>>) -> Result<Self, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        let mut rules = Vec::with_capacity(table.len());

        for (pattern, ids) in table {
            let glob = Glob::new(pattern).map_err(|e| PatternError {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
            builder.add(glob);
            rules.push(ids.clone());
        }

        let set = builder.build().map_err(|e| PatternError {
            pattern: table.keys().cloned().collect::<Vec<_>>().join(", "),
            message: e.to_string(),
        })?;
        Ok(Self { set, rules })
    }

    /// Check if a rule should be ignored for a file
    pub fn should_ignore_rule_for_file(&self, rule_id: &str, file_path: &Path) -> bool {
        let file_str = file_path.to_string_lossy();
        let file_str = file_str.strip_prefix("./").unwrap_or(&file_str);

        self.set
            .matches(file_str)
            .into_iter()
            .any(|i| self.rules[i].iter().any(|r| r == "all" || r == rule_id))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::new();
        assert!(config.engine.parallel);
        assert_eq!(config.engine.jobs, 0);
        assert_eq!(config.output.format, OutputFormat::Text);
        assert!(!config.files.include.is_empty());
        assert!(config.rules.is_empty());
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!(
            "structured".parse::<OutputFormat>().unwrap(),
            OutputFormat::Structured
        );
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Structured);
        assert!("sarif".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_config_merge_cli() {
        let mut config = Config::new();
        config.merge_cli(
            Some(OutputFormat::Structured),
            Some(4),
            Some(vec!["quotes".to_string()]),
            Some(3),
            true,
        );

        assert_eq!(config.output.format, OutputFormat::Structured);
        assert_eq!(config.engine.jobs, 4);
        assert_eq!(config.rules["quotes"].enabled, Some(false));
        assert_eq!(
            config.rules["bem-depth"].parameters["max-depth"],
            serde_yaml::Value::from(3u64)
        );
        assert_eq!(config.output.color, ColorMode::Never);
    }

    #[test]
    fn test_yaml_deserialize() {
        let yaml = r#"
engine:
  parallel: false
  jobs: 4
output:
  format: structured
selectors:
  state: [":hover", ".js-*"]
rules:
  bem-depth:
    severity: error
    parameters:
      max-depth: 3
  quotes:
    enabled: false
per_file:
  "legacy/**": [all]
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(!config.engine.parallel);
        assert_eq!(config.engine.jobs, 4);
        assert_eq!(config.output.format, OutputFormat::Structured);
        assert_eq!(config.selectors.state.len(), 2);
        assert!(!config.selectors.pseudo.is_empty());
        assert_eq!(config.rules["bem-depth"].severity, Some(Severity::Error));
        assert_eq!(config.rules["quotes"].enabled, Some(false));
        assert_eq!(config.per_file["legacy/**"], vec!["all".to_string()]);
    }

    #[test]
    fn test_json_deserialize() {
        let json = r#"{ "rules": { "chain-format": { "parameters": { "min-length": 3 } } } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(
            config.rules["chain-format"].parameters["min-length"],
            serde_yaml::Value::from(3u64)
        );
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trellis.toml");
        std::fs::write(&path, "").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_per_file_ignores() {
        let mut config = Config::new();
        config
            .per_file
            .insert("legacy/**".to_string(), vec!["quotes".to_string()]);
        config
            .per_file
            .insert("**/*.min.css".to_string(), vec!["all".to_string()]);

        let ignores = config.per_file_ignores().unwrap();
        assert!(ignores.should_ignore_rule_for_file("quotes", Path::new("legacy/a.scss")));
        assert!(ignores.should_ignore_rule_for_file("quotes", Path::new("./legacy/a.scss")));
        assert!(!ignores.should_ignore_rule_for_file("bem-depth", Path::new("legacy/a.scss")));
        assert!(ignores.should_ignore_rule_for_file("bem-depth", Path::new("dist/app.min.css")));
        assert!(!ignores.should_ignore_rule_for_file("quotes", Path::new("src/a.scss")));
    }

    #[test]
    fn test_invalid_per_file_pattern() {
        let mut config = Config::new();
        config.per_file.insert("[oops".to_string(), vec![]);
        assert!(matches!(config.per_file_ignores(), Err(ConfigError::Pattern(_))));
    }

    #[test]
    fn test_yaml_roundtrip_of_defaults() {
        let yaml = Config::default().to_yaml().unwrap();
        let config: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config.files.include, FilesConfig::default().include);
    }
}
