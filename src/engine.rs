//! Core linter engine

use crate::classifier::{SelectorClass, SelectorClassifier};
use crate::collector::LintResult;
use crate::config::{Config, ConfigError, PerFileIgnores};
use crate::diagnostic::{Diagnostic, Location, Severity};
use crate::plugin::Plugin;
use crate::plugins::markup::MarkupPlugin;
use crate::plugins::script::ScriptPlugin;
use crate::plugins::stylesheet::StylesheetPlugin;
use crate::rule::{format_message, Context, RuleEntry, RuleSet, FILE_READ_ERROR, RULE_FAULT};
use crate::source::{Dialect, SourceFile};
use crate::tree::{Document, Node};
use rayon::prelude::*;
use std::cell::Cell;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once};

thread_local! {
    /// Set while a rule check runs on this thread
    static IN_RULE_CHECK: Cell<bool> = const { Cell::new(false) };
}

static QUIET_RULE_PANICS: Once = Once::new();

/// Send panics raised inside rule checks to the debug log instead of stderr.
/// Panics anywhere else still reach the previously installed hook.
fn install_panic_hook() {
    QUIET_RULE_PANICS.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if IN_RULE_CHECK.with(Cell::get) {
                log::debug!("Rule check panicked: {}", info);
            } else {
                previous(info);
            }
        }));
    });
}

/// Run one rule check, turning a panic into `Err`
fn run_rule_check<T>(check: impl FnOnce() -> T) -> std::thread::Result<T> {
    IN_RULE_CHECK.with(|flag| flag.set(true));
    let result = panic::catch_unwind(AssertUnwindSafe(check));
    IN_RULE_CHECK.with(|flag| flag.set(false));
    result
}

/// The main linter engine
pub struct Engine {
    /// Configuration
    config: Config,

    /// Rule registry with configured settings
    rules: RuleSet,

    /// Registered plugins (keyed by dialect)
    plugins: HashMap<Dialect, Arc<dyn Plugin>>,

    /// Compiled per-file ignores
    per_file: PerFileIgnores,

    /// Selector classifier shared with the stylesheet plugin
    classifier: SelectorClassifier,

    /// Dialect forced from the command line
    dialect_override: Option<Dialect>,
}

impl Engine {
    /// Create an engine with the built-in rules configured from `config`
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let rules = RuleSet::from_config(&config)?;
        Self::with_rules(config, rules)
    }

    /// Create an engine with an explicit rule set
    pub fn with_rules(config: Config, rules: RuleSet) -> Result<Self, ConfigError> {
        let classifier = SelectorClassifier::new(&config.selectors)?;
        let per_file = config.per_file_ignores()?;
        install_panic_hook();

        let mut engine = Self {
            config,
            rules,
            plugins: HashMap::new(),
            per_file,
            classifier: classifier.clone(),
            dialect_override: None,
        };
        engine.register_plugin(Arc::new(MarkupPlugin::new()));
        engine.register_plugin(Arc::new(StylesheetPlugin::with_classifier(classifier)));
        engine.register_plugin(Arc::new(ScriptPlugin::new()));

        log::debug!("Engine ready with {} rules", engine.rules.len());
        Ok(engine)
    }

    /// Treat every input as one dialect instead of detecting it from the extension
    pub fn with_dialect(mut self, dialect: Option<Dialect>) -> Self {
        self.dialect_override = dialect;
        self
    }

    /// Register a plugin, replacing any plugin for the same dialect
    pub fn register_plugin(&mut self, plugin: Arc<dyn Plugin>) {
        log::debug!("Registered plugin {} ({})", plugin.id(), plugin.description());
        self.plugins.insert(plugin.dialect(), plugin);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Dialect a file is linted as
    pub fn dialect_for(&self, path: &Path) -> Option<Dialect> {
        self.dialect_override.or_else(|| Dialect::from_path(path))
    }

    /// Lint multiple files.
    ///
    /// A file that cannot be read stops the run: files not yet started are
    /// skipped, finished ones keep their diagnostics.
    pub fn lint_paths(&self, files: &[PathBuf]) -> LintResult {
        let cancelled = AtomicBool::new(false);
        let run = |path: &PathBuf| -> Option<LintResult> {
            if cancelled.load(Ordering::SeqCst) {
                return None;
            }
            let result = self.lint_file(path);
            if result.fatal.is_some() {
                cancelled.store(true, Ordering::SeqCst);
            }
            Some(result)
        };

        let results: Vec<LintResult> = if self.config.engine.parallel {
            let threads = if self.config.engine.jobs > 0 {
                self.config.engine.jobs
            } else {
                num_cpus::get()
            };
            match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => pool.install(|| files.par_iter().filter_map(run).collect()),
                Err(e) => {
                    log::warn!("Could not start thread pool ({}), linting sequentially", e);
                    files.iter().filter_map(run).collect()
                }
            }
        } else {
            files.iter().filter_map(run).collect()
        };

        let mut combined = LintResult::default();
        for result in results {
            combined.merge(result);
        }
        combined.sort();

        log::info!(
            "Linted {} files, {} diagnostics",
            combined.files_processed,
            combined.diagnostics.len()
        );
        combined
    }

    /// Lint a single file
    pub fn lint_file(&self, path: &Path) -> LintResult {
        let Some(dialect) = self.dialect_for(path) else {
            log::debug!("Skipping {}: no dialect for this extension", path.display());
            return LintResult::default();
        };

        match std::fs::read_to_string(path) {
            Ok(text) => self.lint_source(&SourceFile::new(path, text, dialect)),
            Err(e) => {
                log::error!("Failed to read {}: {}", path.display(), e);
                let diag = Diagnostic::new(
                    FILE_READ_ERROR,
                    Severity::Error,
                    &format!("Failed to read file: {}", e),
                    Location::new(path.to_path_buf(), 0, 0),
                );
                LintResult {
                    diagnostics: vec![diag],
                    files_unlinted: 1,
                    fatal: Some(format!("failed to read {}: {}", path.display(), e)),
                    ..LintResult::default()
                }
            }
        }
    }

    /// Lint source text that is already in memory
    pub fn lint_source(&self, source: &SourceFile) -> LintResult {
        let mut result = LintResult {
            files_processed: 1,
            ..LintResult::default()
        };

        let Some(plugin) = self.plugins.get(&source.dialect()) else {
            log::warn!("No plugin for {} files", source.dialect());
            return result;
        };

        match plugin.parse(source) {
            Ok(document) => {
                result.diagnostics = self.evaluate(&document);
            }
            Err(e) => {
                log::info!("{} not linted: {}", source.path().display(), e);
                let position = e.position();
                let location = Location {
                    file: source.path().to_path_buf(),
                    line: position.line,
                    column: position.column,
                    offset: position.offset,
                    length: 1,
                };
                let mut diag = Diagnostic::new(e.rule_id(), Severity::Error, &e.to_string(), location);
                if let Some(line) = source.line(position.line) {
                    diag = diag.with_source_line(line);
                }
                result.diagnostics.push(diag);
                result.files_unlinted = 1;
            }
        }

        result
    }

    /// Run every active rule over a parsed document
    fn evaluate(&self, document: &Document) -> Vec<Diagnostic> {
        let path = document.path();
        let rules: Vec<&RuleEntry> = self
            .rules
            .active_for(document.dialect())
            .filter(|e| !self.per_file.should_ignore_rule_for_file(e.rule.id(), path))
            .collect();

        let mut evaluation = Evaluation {
            document,
            classifier: &self.classifier,
            faults: vec![0; rules.len()],
            rules,
            diagnostics: Vec::new(),
        };
        let mut ancestors = Vec::new();
        evaluation.visit(std::slice::from_ref(document.root()), &mut ancestors, 0);
        evaluation.finish()
    }
}

/// State of one traversal over a document
struct Evaluation<'e> {
    document: &'e Document,
    classifier: &'e SelectorClassifier,
    rules: Vec<&'e RuleEntry>,
    /// Faulted node count per rule, indexed like `rules`
    faults: Vec<usize>,
    diagnostics: Vec<Diagnostic>,
}

impl<'e> Evaluation<'e> {
    /// Depth-first, in source order
    fn visit(&mut self, siblings: &'e [Node], ancestors: &mut Vec<&'e Node>, depth: usize) {
        let document = self.document;
        for (index, node) in siblings.iter().enumerate() {
            let bem_depth = self.bem_depth(node, depth);
            let ctx = Context {
                file: document.path(),
                dialect: document.dialect(),
                ancestors: ancestors.as_slice(),
                siblings,
                index,
                bem_depth,
            };
            self.check_node(node, &ctx);

            if !node.children.is_empty() {
                ancestors.push(node);
                self.visit(&node.children, ancestors, bem_depth);
                ancestors.pop();
            }
        }
    }

    /// `&__` elements add a level, a class selector starts a new block,
    /// anything else (tags, modifiers, states) keeps the current depth
    fn bem_depth(&self, node: &Node, inherited: usize) -> usize {
        if !node.kind.is_selector_rule() {
            return inherited;
        }
        match self.classifier.classify(&node.name) {
            SelectorClass::BemElement => inherited + 1,
            SelectorClass::Block => 0,
            _ => inherited,
        }
    }

    fn check_node(&mut self, node: &Node, ctx: &Context<'_>) {
        for (slot, entry) in self.rules.iter().enumerate() {
            let meta = entry.meta();
            let outcome = run_rule_check(|| entry.rule.check(node, ctx));
            let violations = match outcome {
                Ok(outcome) => outcome.into_violations(),
                Err(_) => {
                    self.faults[slot] += 1;
                    continue;
                }
            };

            for violation in violations {
                let line = violation.span.start.line;
                if self.document.is_rule_disabled(meta.id, line) {
                    continue;
                }

                let message = format_message(meta.message, node, &violation.detail);
                let location = Location::from_span(self.document.path(), violation.span);
                let mut diag = Diagnostic::new(meta.id, entry.severity, &message, location);
                if let Some(source_line) = self.document.get_source_line(line) {
                    diag = diag.with_source_line(source_line);
                }
                self.diagnostics.push(diag.with_help(meta.description));
            }
        }
    }

    /// Append one `rule-fault` per rule that panicked
    fn finish(mut self) -> Vec<Diagnostic> {
        let path = self.document.path();
        for (entry, &count) in self.rules.iter().zip(&self.faults) {
            if count == 0 {
                continue;
            }
            log::warn!("Rule {} faulted on {} nodes in {}", entry.rule.id(), count, path.display());
            let message = format!(
                "rule '{}' failed on {} node(s) in {}; other rules were still applied",
                entry.rule.id(),
                count,
                path.display()
            );
            self.diagnostics.push(Diagnostic::new(
                RULE_FAULT,
                Severity::Error,
                &message,
                Location::new(path.to_path_buf(), 1, 1),
            ));
        }
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{Outcome, Rule, RuleMeta};
    use std::fs;
    use tempfile::TempDir;

    static PANICKY: RuleMeta = RuleMeta {
        id: "panicky",
        description: "Fails on declarations",
        rationale: "",
        example_bad: "",
        example_good: "",
        message: "{detail}",
        dialects: &[Dialect::Stylesheet],
        severity: Severity::Warning,
    };

    struct Panicky;

    impl Rule for Panicky {
        fn meta(&self) -> &'static RuleMeta {
            &PANICKY
        }

        fn check(&self, node: &Node, _ctx: &Context<'_>) -> Outcome {
            if node.is(crate::tree::NodeKind::Declaration) {
                panic!("cannot handle {}", node.name);
            }
            Outcome::Pass
        }
    }

    fn scss(text: &str) -> SourceFile {
        SourceFile::new("a.scss", text, Dialect::Stylesheet)
    }

    #[test]
    fn test_parse_failure_reports_once() {
        let engine = Engine::new(Config::default()).unwrap();
        let result = engine.lint_source(&scss(".a {\n  color: red;\n"));

        assert_eq!(result.files_unlinted, 1);
        assert_eq!(result.diagnostics.len(), 1);
        let diag = &result.diagnostics[0];
        assert_eq!(diag.rule_id, "parse-error");
        assert_eq!(diag.severity, Severity::Error);
        assert!(diag.message.contains("closing the block opened at 1:4"));
    }

    #[test]
    fn test_lex_failure_reports_once() {
        let engine = Engine::new(Config::default()).unwrap();
        let result = engine.lint_source(&scss(".a { content: 'open; }\n"));
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].rule_id, "lex-error");
    }

    #[test]
    fn test_rule_fault_is_isolated() {
        let rules = RuleSet::new(vec![
            Box::new(Panicky),
            Box::new(crate::rules::NumericLiteral),
        ]);
        let engine = Engine::with_rules(Config::default(), rules).unwrap();
        let result = engine.lint_source(&scss(".a {\n  color: red;\n  margin: .5em;\n}\n"));

        let ids: Vec<&str> = result.diagnostics.iter().map(|d| d.rule_id.as_str()).collect();
        assert_eq!(ids, vec!["numeric-literal", RULE_FAULT]);
        assert!(result.diagnostics[1].message.contains("'panicky' failed on 2 node(s)"));
    }

    #[test]
    fn test_rule_panic_is_kept_off_the_default_hook() {
        install_panic_hook();
        let outcome = run_rule_check(|| -> usize { panic!("bad node") });
        assert!(outcome.is_err());
        assert!(!IN_RULE_CHECK.with(Cell::get));
        assert_eq!(run_rule_check(|| 7).ok(), Some(7));
    }

    #[test]
    fn test_inline_suppression() {
        let engine = Engine::new(Config::default()).unwrap();
        let src = ".a {\n  // trellis-disable-next-line numeric-literal\n  margin: .5em;\n  padding: .5em;\n}\n";
        let result = engine.lint_source(&scss(src));
        let lines: Vec<usize> = result.diagnostics.iter().map(|d| d.location.line).collect();
        assert_eq!(lines, vec![4]);
    }

    #[test]
    fn test_per_file_ignores() {
        let mut config = Config::default();
        config
            .per_file
            .insert("legacy/**".to_string(), vec!["numeric-literal".to_string()]);
        let engine = Engine::new(config).unwrap();

        let legacy = SourceFile::new("legacy/a.scss", ".a { margin: .5em; }\n", Dialect::Stylesheet);
        assert!(engine.lint_source(&legacy).diagnostics.is_empty());

        let current = SourceFile::new("src/a.scss", ".a { margin: .5em; }\n", Dialect::Stylesheet);
        assert_eq!(engine.lint_source(&current).diagnostics.len(), 1);
    }

    #[test]
    fn test_diagnostic_carries_source_and_help() {
        let engine = Engine::new(Config::default()).unwrap();
        let result = engine.lint_source(&scss(".a {\n  margin: 0px;\n}\n"));
        let diag = &result.diagnostics[0];
        assert_eq!(diag.source_line.as_deref(), Some("  margin: 0px;"));
        assert_eq!((diag.location.line, diag.location.column, diag.location.length), (2, 11, 3));
        assert!(diag.help.is_some());
    }

    #[test]
    fn test_dialect_override() {
        let engine = Engine::new(Config::default())
            .unwrap()
            .with_dialect(Some(Dialect::Script));
        assert_eq!(engine.dialect_for(Path::new("notes.txt")), Some(Dialect::Script));

        let engine = Engine::new(Config::default()).unwrap();
        assert_eq!(engine.dialect_for(Path::new("notes.txt")), None);
        assert_eq!(engine.dialect_for(Path::new("a.htm")), Some(Dialect::Markup));
    }

    #[test]
    fn test_lint_paths_sequential_and_parallel_agree() {
        let dir = TempDir::new().unwrap();
        let mut files = Vec::new();
        for i in 0..6 {
            let path = dir.path().join(format!("f{}.scss", i));
            fs::write(&path, ".a {\n  margin: .5em;\n  color: \"red\";\n}\n").unwrap();
            files.push(path);
        }

        let parallel = Engine::new(Config::default()).unwrap().lint_paths(&files);
        let mut config = Config::default();
        config.engine.parallel = false;
        let sequential = Engine::new(config).unwrap().lint_paths(&files);

        assert_eq!(parallel.files_processed, 6);
        assert_eq!(parallel.diagnostics.len(), 12);
        let key = |r: &LintResult| {
            r.diagnostics
                .iter()
                .map(|d| (d.location.file.clone(), d.location.offset, d.rule_id.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(key(&parallel), key(&sequential));
    }

    #[test]
    fn test_unreadable_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.scss");
        fs::write(&good, ".a { margin: 0px; }\n").unwrap();
        let missing = dir.path().join("missing.scss");

        let mut config = Config::default();
        config.engine.parallel = false;
        let engine = Engine::new(config).unwrap();
        let result = engine.lint_paths(&[good, missing]);

        assert!(result.fatal.is_some());
        assert_eq!(result.exit_code(), 2);
        let ids: Vec<&str> = result.diagnostics.iter().map(|d| d.rule_id.as_str()).collect();
        assert!(ids.contains(&"numeric-literal"));
        assert!(ids.contains(&FILE_READ_ERROR));
    }

    #[test]
    fn test_invalid_selector_pattern_is_config_error() {
        let mut config = Config::default();
        config.selectors.state.push("[".to_string());
        assert!(matches!(Engine::new(config), Err(ConfigError::Pattern(_))));
    }
}
