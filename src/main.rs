use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use depsentry::{
    catalog::{load_known_bad, KnownBad},
    classifier::Classifier,
    config::Config,
    model::{ProjectReport, ScanReport, Severity},
    output::{format_report_to_string, print_report, OutputFormat},
    scanner::{discover, load_files, scan_projects},
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
    pub const HIGH_FINDING: u8 = 2;
    pub const MEDIUM_FINDING: u8 = 3;
}

#[derive(Parser)]
#[command(name = "depsentry")]
#[command(
    author,
    version,
    about = "Find npm dependencies that resolve to known-bad package versions"
)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan every project below a directory
    Scan {
        /// Directory (or package.json) to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        #[command(flatten)]
        common: CommonArgs,

        /// Disable concurrent scanning (scan projects sequentially)
        #[arg(long)]
        no_parallel: bool,
    },

    /// Classify one explicit manifest and lock file set
    Check {
        /// Path to package.json
        #[arg(short, long)]
        manifest: PathBuf,

        /// Lock file (repeatable; format inferred from the file name)
        #[arg(short, long = "lock")]
        locks: Vec<PathBuf>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[derive(clap::Args)]
struct CommonArgs {
    /// Known-bad version list (CSV); falls back to `known_bad_path` in the config
    #[arg(short, long)]
    known_bad: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(short, long)]
    format: Option<String>,

    /// Write JSON output to file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Exit with error if findings at or above this severity are present
    #[arg(long, value_enum)]
    fail_on: Option<FailLevel>,
}

#[derive(Clone, Copy, ValueEnum)]
enum FailLevel {
    High,
    Medium,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "depsentry=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<u8> {
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "ignoring unreadable config file");
        Config::default()
    });

    match cli.command {
        Commands::Scan {
            path,
            common,
            no_parallel,
        } => run_scan(&path, common, !no_parallel, &config).await,
        Commands::Check {
            manifest,
            locks,
            common,
        } => run_check(&manifest, &locks, common, &config).await,
        Commands::Config { init, path } => {
            handle_config(init, path)?;
            Ok(exit_codes::SUCCESS)
        }
    }
}

async fn run_scan(root: &Path, args: CommonArgs, parallel: bool, config: &Config) -> Result<u8> {
    let format = output_format(&args, config)?;
    let classifier = build_classifier(&args, config)?;
    let is_interactive = format == OutputFormat::Table && args.output.is_none();

    let progress = is_interactive.then(|| spinner("Scanning projects..."));

    let manifests = discover(root, &config.skip_dirs);
    let projects = scan_projects(&manifests, &classifier, parallel).await;

    if let Some(pb) = progress {
        pb.finish_with_message(format!("Scanned {} projects", projects.len()));
    }

    emit(&ScanReport::new(projects), format, args.output.as_deref(), args.fail_on)
}

async fn run_check(
    manifest: &Path,
    locks: &[PathBuf],
    args: CommonArgs,
    config: &Config,
) -> Result<u8> {
    let format = output_format(&args, config)?;
    let classifier = build_classifier(&args, config)?;

    let project = load_files(manifest, locks).await?;
    let classification = classifier
        .classify(&project.manifest_text, &project.locks)
        .with_context(|| format!("failed to evaluate {}", manifest.display()))?;

    let report = ProjectReport::new(project.manifest_path, classification)
        .with_lock_files(project.lock_paths);
    let report = ScanReport::new(vec![report]);

    emit(&report, format, args.output.as_deref(), args.fail_on)
}

fn output_format(args: &CommonArgs, config: &Config) -> Result<OutputFormat> {
    let format = args.format.as_deref().unwrap_or(&config.default_format);
    OutputFormat::from_str(format).map_err(|e| anyhow::anyhow!(e))
}

fn build_classifier(args: &CommonArgs, config: &Config) -> Result<Classifier> {
    let path = args
        .known_bad
        .as_ref()
        .or(config.known_bad_path.as_ref())
        .context("no known-bad list given; pass --known-bad or set known_bad_path in the config")?;

    let entries = config.ignore.filter_known_bad(load_known_bad(path)?);
    let known_bad = KnownBad::from_entries(&entries);
    tracing::debug!(packages = known_bad.package_count(), "known-bad list ready");

    Ok(Classifier::new(known_bad).with_optional(config.include_optional))
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message);
    pb
}

fn emit(
    report: &ScanReport,
    format: OutputFormat,
    output_file: Option<&Path>,
    fail_on: Option<FailLevel>,
) -> Result<u8> {
    if let Some(path) = output_file {
        let content = format_report_to_string(report, format)?;
        std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        if format == OutputFormat::Table {
            println!("Results written to: {}", path.display());
        }
    } else {
        print_report(report, format)?;
    }

    Ok(determine_exit_code(report.highest_severity(), fail_on))
}

/// Determine the exit code based on findings and the --fail-on setting
fn determine_exit_code(highest: Option<Severity>, fail_on: Option<FailLevel>) -> u8 {
    match (fail_on, highest) {
        (None, _) | (_, None) => exit_codes::SUCCESS,
        (Some(_), Some(Severity::High)) => exit_codes::HIGH_FINDING,
        (Some(FailLevel::Medium), Some(Severity::Medium)) => exit_codes::MEDIUM_FINDING,
        (Some(FailLevel::High), Some(Severity::Medium)) => exit_codes::SUCCESS,
    }
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        Config::default().save()?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'depsentry config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_without_fail_on() {
        assert_eq!(
            determine_exit_code(Some(Severity::High), None),
            exit_codes::SUCCESS
        );
    }

    #[test]
    fn test_exit_code_thresholds() {
        assert_eq!(
            determine_exit_code(Some(Severity::High), Some(FailLevel::High)),
            exit_codes::HIGH_FINDING
        );
        assert_eq!(
            determine_exit_code(Some(Severity::High), Some(FailLevel::Medium)),
            exit_codes::HIGH_FINDING
        );
        assert_eq!(
            determine_exit_code(Some(Severity::Medium), Some(FailLevel::High)),
            exit_codes::SUCCESS
        );
        assert_eq!(
            determine_exit_code(Some(Severity::Medium), Some(FailLevel::Medium)),
            exit_codes::MEDIUM_FINDING
        );
        assert_eq!(
            determine_exit_code(None, Some(FailLevel::Medium)),
            exit_codes::SUCCESS
        );
    }

    #[test]
    fn test_cli_parses_check() {
        let cli = Cli::try_parse_from([
            "depsentry",
            "check",
            "--manifest",
            "package.json",
            "--lock",
            "yarn.lock",
            "--lock",
            "pnpm-lock.yaml",
            "--known-bad",
            "bad.csv",
            "--fail-on",
            "medium",
        ])
        .unwrap();
        match cli.command {
            Commands::Check { locks, common, .. } => {
                assert_eq!(locks.len(), 2);
                assert!(matches!(common.fail_on, Some(FailLevel::Medium)));
            }
            _ => panic!("expected check"),
        }
    }
}
