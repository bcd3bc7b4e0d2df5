//! Trellis CLI - Style-guide linter for HTML, SCSS and JavaScript

use anyhow::{bail, Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use trellis::config::{ColorMode, Config, OutputFormat, CONFIG_FILE_NAMES};
use trellis::discovery::FileDiscovery;
use trellis::engine::Engine;
use trellis::output::formatter_for;
use trellis::rule::{RuleEntry, RuleSet};
use trellis::{Dialect, Severity};

#[derive(Parser)]
#[command(
    name = "trellis",
    version,
    about = "Style-guide linter for HTML, SCSS and JavaScript",
    long_about = "Checks markup, nested stylesheets and scripts against a fixed set of \
                  structural conventions: attribute order, BEM depth, declaration order, \
                  quoting, numeric literals, whitespace, declaration grouping and chain layout."
)]
struct Cli {
    /// Files, directories or glob patterns to lint
    paths: Vec<String>,

    /// Configuration file path (YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dialect to lint inputs as (auto = from the file extension)
    #[arg(long, value_enum, default_value = "auto")]
    dialect: DialectArg,

    /// Minimum severity to report
    #[arg(long, value_enum, default_value = "info")]
    severity_threshold: Threshold,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<Format>,

    /// Maximum number of nested `&__` element selectors
    #[arg(long)]
    bem_depth: Option<usize>,

    /// Not supported: trellis only reports violations
    #[arg(long)]
    fix: bool,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Disable specific rules (comma-separated)
    #[arg(long, value_delimiter = ',')]
    disable: Option<Vec<String>>,

    /// List available rules and exit
    #[arg(long)]
    list_rules: bool,

    /// Show per-rule counts after the summary
    #[arg(long)]
    stats: bool,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show detailed information about a rule
    Explain {
        /// Rule ID to explain
        rule_id: String,
    },
    /// Write the default configuration to .trellisrc.yaml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DialectArg {
    Auto,
    Markup,
    Stylesheet,
    Script,
}

impl From<DialectArg> for Option<Dialect> {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Auto => None,
            DialectArg::Markup => Some(Dialect::Markup),
            DialectArg::Stylesheet => Some(Dialect::Stylesheet),
            DialectArg::Script => Some(Dialect::Script),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Threshold {
    Error,
    Warning,
    Info,
}

impl From<Threshold> for Severity {
    fn from(t: Threshold) -> Self {
        match t {
            Threshold::Error => Severity::Error,
            Threshold::Warning => Severity::Warning,
            Threshold::Info => Severity::Info,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    #[value(alias = "json")]
    Structured,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Text => OutputFormat::Text,
            Format::Structured => OutputFormat::Structured,
        }
    }
}

fn severity_label(severity: Severity) -> colored::ColoredString {
    match severity {
        Severity::Error => "error".red(),
        Severity::Warning => "warning".yellow(),
        Severity::Info => "info".blue(),
    }
}

/// Print a rule in the catalogue listing
fn print_rule(entry: &RuleEntry) {
    let meta = entry.meta();
    let dialects: Vec<String> = meta.dialects.iter().map(|d| d.to_string()).collect();
    let state = if entry.enabled { "".normal() } else { " [disabled]".dimmed() };

    println!(
        "    {} [{}] ({}){}",
        meta.id.cyan(),
        severity_label(entry.severity),
        dialects.join(", "),
        state
    );
    println!("      {}", meta.description);
}

/// Print detailed rule explanation
fn explain_rule(entry: &RuleEntry) {
    let meta = entry.meta();
    println!("{}", "Rule Details".bold());
    println!();
    println!("  {}: {}", "ID".bold(), meta.id.cyan());
    println!("  {}: {}", "Severity".bold(), severity_label(meta.severity));

    let dialects: Vec<String> = meta.dialects.iter().map(|d| d.to_string()).collect();
    println!("  {}: {}", "Dialects".bold(), dialects.join(", "));

    println!();
    println!("  {}", "Description".bold());
    println!("  {}", meta.description);

    println!();
    println!("  {}", "Rationale".bold());
    println!("  {}", meta.rationale);

    println!();
    println!("  {} {}", "Example".bold(), "(incorrect)".red());
    for line in meta.example_bad.lines() {
        println!("    {}", line);
    }

    println!();
    println!("  {} {}", "Example".bold(), "(correct)".green());
    for line in meta.example_good.lines() {
        println!("    {}", line);
    }
}

fn handle_explain(rule_id: &str) -> Result<i32> {
    let rules = RuleSet::builtin();
    match rules.get(rule_id) {
        Some(entry) => {
            explain_rule(entry);
            Ok(0)
        }
        None => bail!("Rule '{}' not found (use --list-rules to see all rules)", rule_id),
    }
}

fn handle_init(force: bool) -> Result<i32> {
    let filename = Path::new(CONFIG_FILE_NAMES[0]);
    if filename.exists() && !force {
        bail!(
            "{} already exists. Remove it or pass --force to reinitialize.",
            filename.display()
        );
    }

    let yaml = Config::default().to_yaml()?;
    let content = format!("# Trellis configuration\n# Generated with: trellis init\n\n{}", yaml);
    std::fs::write(filename, content)
        .with_context(|| format!("Failed to write {}", filename.display()))?;

    println!("{} Created {}", "success".green().bold(), filename.display());
    println!();
    println!("Next steps:");
    println!("  1. Review and customize the configuration");
    println!("  2. Run {} to lint your files", "trellis src/".cyan());
    Ok(0)
}

fn handle_list_rules(config: &Config) -> Result<i32> {
    let rules = RuleSet::from_config(config)?;
    println!("{}", "Available rules:".bold());
    println!();
    for dialect in Dialect::ALL {
        println!("  {}:", dialect.to_string().cyan());
        for entry in rules.iter().filter(|e| e.meta().applies_to(dialect)) {
            print_rule(entry);
        }
        println!();
    }
    Ok(0)
}

fn use_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => std::io::stdout().is_terminal(),
    }
}

fn run(cli: Cli) -> Result<i32> {
    if cli.fix {
        bail!("--fix is not supported: trellis reports violations but never rewrites files");
    }

    if let Some(cmd) = &cli.command {
        return match cmd {
            Commands::Explain { rule_id } => handle_explain(rule_id),
            Commands::Init { force } => handle_init(*force),
        };
    }

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::load_default().context("Failed to load config")?,
    };
    config.merge_cli(
        cli.format.map(Into::into),
        cli.jobs,
        cli.disable.clone(),
        cli.bem_depth,
        cli.no_color,
    );

    let colored = use_color(config.output.color);
    colored::control::set_override(colored);

    if cli.list_rules {
        return handle_list_rules(&config);
    }

    if cli.paths.is_empty() {
        bail!("No paths specified\n\nUsage: trellis [OPTIONS] <PATHS>...\n\nFor more information, try '--help'");
    }

    let engine = Engine::new(config.clone())?.with_dialect(cli.dialect.into());
    let files = FileDiscovery::new(&config.files)?.discover(&cli.paths)?;
    if files.is_empty() {
        bail!("No files found to lint");
    }
    log::info!("Linting {} files", files.len());

    let mut result = engine.lint_paths(&files);
    result.filter_threshold(cli.severity_threshold.into());
    if result.is_clean() {
        log::info!("No issues found");
    }

    let formatter = formatter_for(
        config.output.format,
        colored,
        cli.stats || config.output.statistics,
    );
    print!("{}", formatter.format(&result));

    if let Some(fatal) = &result.fatal {
        eprintln!("{}: {}", "error".red().bold(), fatal);
    }
    Ok(result.exit_code())
}

fn main() {
    let cli = Cli::parse();

    // Initialize logger; RUST_LOG still takes precedence
    let default_filter = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            2
        }
    };
    std::process::exit(code);
}
