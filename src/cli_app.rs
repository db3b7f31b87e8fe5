//! Top-level CLI definition and dispatch.

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde_json::Value;
use thiserror::Error;

use submission_fanout::core::config::Config;
use submission_fanout::core::errors::SfoError;
use submission_fanout::core::paths;
use submission_fanout::fanout::builder::{FanoutBuilder, FanoutPlan, FanoutReport};
use submission_fanout::logger::jsonl::{EventType, JsonlWriter, LogEntry, Severity};
use submission_fanout::scanner::walker::{ExtensionFilter, TreeWalker, WalkerConfig};

/// Submission fan-out — per-author reorganization of bulk submission exports.
#[derive(Debug, Parser)]
#[command(
    name = "sfo",
    author,
    version,
    about = "Submission Fan-out - reorganizes bulk submission exports by author",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Increase verbosity.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Quiet mode (errors only).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Fan submissions out into one directory per author.
    Organize(OrganizeArgs),
    /// Decode a single raw submission filename.
    Decode(DecodeArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args, Default)]
struct OrganizeArgs {
    /// Submission root directory. Defaults to the current working directory.
    #[arg(value_name = "ROOT")]
    root: Option<PathBuf>,
    /// Traversal depth below the root; -1 means unbounded.
    #[arg(
        value_name = "DEPTH",
        allow_hyphen_values = true,
        value_parser = clap::value_parser!(i64).range(-1..)
    )]
    depth: Option<i64>,
    /// Output folder name (not a path), created next to ROOT.
    #[arg(value_name = "OUT_NAME")]
    out_name: Option<String>,
    /// Extension filter, e.g. `java`, `java,txt`, or `*.{java,txt}`.
    #[arg(long, value_name = "PATTERN")]
    extensions: Option<String>,
    /// Append a UTC timestamp to the output folder name.
    #[arg(long)]
    stamp: bool,
    /// Print the plan without creating directories or copying files.
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Clone, Args)]
struct DecodeArgs {
    /// Raw encoded filename, e.g. `alice_20230101_120000_Essay1.java`.
    #[arg(value_name = "RAW_NAME")]
    name: String,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, value_name = "SHELL")]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input at runtime.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Json(_) => 3,
        }
    }
}

impl From<SfoError> for CliError {
    fn from(err: SfoError) -> Self {
        match err {
            SfoError::InvalidConfig { .. }
            | SfoError::MissingConfig { .. }
            | SfoError::ConfigParse { .. }
            | SfoError::MissingTarget { .. }
            | SfoError::MalformedName { .. }
            | SfoError::OutputExists { .. } => Self::User(err.to_string()),
            SfoError::Serialization { .. } | SfoError::Io { .. } | SfoError::Runtime { .. } => {
                Self::Runtime(err.to_string())
            }
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::Organize(args) => run_organize(cli, args),
        Command::Decode(args) => run_decode(cli, args),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

fn run_organize(cli: &Cli, args: &OrganizeArgs) -> Result<(), CliError> {
    let config = Config::load(cli.config.as_deref())?;

    let filter = match &args.extensions {
        Some(pattern) => ExtensionFilter::parse(pattern)?,
        None => ExtensionFilter::new(&config.walker.extensions),
    };
    let max_depth = args
        .depth
        .map_or_else(|| config.depth_limit(), |d| usize::try_from(d).ok());

    let scan_root =
        paths::normalize_scan_root(args.root.as_deref().unwrap_or(std::path::Path::new(".")))?;
    let mut folder_name = args
        .out_name
        .clone()
        .unwrap_or_else(|| config.fanout.output_folder_name.clone());
    if args.stamp || config.fanout.stamp_output {
        folder_name = paths::stamped_folder_name(&folder_name);
    }
    let output_root = paths::output_root_for(&scan_root, &folder_name)?;

    let mut log = if args.dry_run {
        JsonlWriter::disabled()
    } else {
        config
            .log
            .jsonl_path
            .as_deref()
            .map_or_else(JsonlWriter::disabled, JsonlWriter::open)
    };
    log.write_entry(
        &LogEntry::new(EventType::RunStart, Severity::Info).with_path(&scan_root),
    );

    let walker = TreeWalker::new(WalkerConfig {
        max_depth,
        follow_symlinks: config.walker.follow_symlinks,
        filter,
    });
    let files = match walker.walk(&scan_root) {
        Ok(files) => files,
        Err(err) => {
            log_error(&mut log, &err);
            return Err(err.into());
        }
    };
    log.write_entry(
        &LogEntry::new(EventType::ScanComplete, Severity::Info)
            .with_path(&scan_root)
            .with_details(format!("{} candidate files", files.len())),
    );

    let builder = FanoutBuilder::new(config.decode.rules());
    let plan = builder.plan(&files, &output_root);

    if args.dry_run {
        match output_mode(cli) {
            OutputMode::Human => print_plan_human(&plan, cli.quiet),
            OutputMode::Json => write_json_line(&serde_json::to_value(&plan)?)?,
        }
        return Ok(());
    }

    let report = match builder.execute(&plan, &mut log) {
        Ok(report) => report,
        Err(err) => {
            log_error(&mut log, &err);
            return Err(err.into());
        }
    };
    log.write_entry(
        &LogEntry::new(EventType::RunComplete, Severity::Info)
            .with_path(&report.output_root)
            .with_details(format!(
                "{} files copied for {} authors, {} skipped",
                report.copied,
                report.authors,
                report.skipped.len()
            )),
    );

    match output_mode(cli) {
        OutputMode::Human => print_report_human(&report, cli.verbose, cli.quiet, &plan),
        OutputMode::Json => write_json_line(&serde_json::to_value(&report)?)?,
    }
    Ok(())
}

fn run_decode(cli: &Cli, args: &DecodeArgs) -> Result<(), CliError> {
    let config = Config::load(cli.config.as_deref())?;
    let identity = config.decode.rules().decode(&args.name)?;

    match output_mode(cli) {
        OutputMode::Human => {
            println!("{:<10} {}", "author:".bold(), identity.author_key);
            println!("{:<10} {}", "stem:".bold(), identity.original_stem);
            println!("{:<10} {}", "extension:".bold(), identity.extension);
            println!("{:<10} {}", "restored:".bold(), identity.destination_name());
        }
        OutputMode::Json => write_json_line(&serde_json::to_value(&identity)?)?,
    }
    Ok(())
}

fn log_error(log: &mut JsonlWriter, err: &SfoError) {
    let mut entry = LogEntry::new(EventType::Error, Severity::Critical);
    entry.error_code = Some(err.code().to_string());
    entry.details = Some(err.to_string());
    log.write_entry(&entry);
}

fn print_plan_human(plan: &FanoutPlan, quiet: bool) {
    if quiet {
        return;
    }
    println!(
        "{} {} ({} authors, {} copies, {} skipped)",
        "plan:".bold(),
        plan.output_root.display(),
        plan.author_dirs.len(),
        plan.copies.len(),
        plan.skipped.len()
    );
    for (author, dir) in &plan.author_dirs {
        println!("  {} {} -> {}", "mkdir".cyan(), author, dir.display());
    }
    for copy in &plan.copies {
        println!(
            "  {} {} -> {}",
            "copy".green(),
            copy.source.display(),
            copy.dest.display()
        );
    }
    for skip in &plan.skipped {
        println!(
            "  {} {} ({})",
            "skip".yellow(),
            skip.path.display(),
            skip.reason
        );
    }
}

fn print_report_human(report: &FanoutReport, verbose: bool, quiet: bool, plan: &FanoutPlan) {
    if quiet {
        return;
    }
    if verbose {
        for copy in &plan.copies {
            println!(
                "  {} {} -> {}",
                "copied".green(),
                copy.source.display(),
                copy.dest.display()
            );
        }
    }
    for skip in &report.skipped {
        println!(
            "  {} {} ({})",
            "skipped".yellow(),
            skip.path.display(),
            skip.reason
        );
    }
    println!(
        "{} {} files ({} bytes) for {} authors into {}{}",
        "copied".green().bold(),
        report.copied,
        report.bytes_copied,
        report.authors,
        report.output_root.display(),
        if report.skipped.is_empty() {
            String::new()
        } else {
            format!(", {} skipped", report.skipped.len())
        }
    );
}

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    println!("{payload}");
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("SFO_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }
    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        _ => {
            // Pipelines get machine-readable output by default.
            if stdout_is_tty {
                OutputMode::Human
            } else {
                OutputMode::Json
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_positional_surface() {
        let cli = Cli::try_parse_from(["sfo", "organize", "/tmp/subs", "2", "Out"]).unwrap();
        let Command::Organize(args) = &cli.command else {
            panic!("expected organize");
        };
        assert_eq!(args.root.as_deref(), Some(std::path::Path::new("/tmp/subs")));
        assert_eq!(args.depth, Some(2));
        assert_eq!(args.out_name.as_deref(), Some("Out"));
    }

    #[test]
    fn trailing_arguments_are_optional() {
        let cli = Cli::try_parse_from(["sfo", "organize"]).unwrap();
        let Command::Organize(args) = &cli.command else {
            panic!("expected organize");
        };
        assert!(args.root.is_none());
        assert!(args.depth.is_none());
        assert!(args.out_name.is_none());
    }

    #[test]
    fn unbounded_depth_sentinel_is_accepted() {
        let cli = Cli::try_parse_from(["sfo", "organize", ".", "-1"]).unwrap();
        let Command::Organize(args) = &cli.command else {
            panic!("expected organize");
        };
        assert_eq!(args.depth, Some(-1));
    }

    #[test]
    fn malformed_depth_is_a_usage_error() {
        assert!(Cli::try_parse_from(["sfo", "organize", ".", "two"]).is_err());
        assert!(Cli::try_parse_from(["sfo", "organize", ".", "-2"]).is_err());
    }

    #[test]
    fn more_than_three_positionals_is_a_usage_error() {
        assert!(Cli::try_parse_from(["sfo", "organize", ".", "1", "Out", "extra"]).is_err());
    }

    #[test]
    fn output_mode_resolution_honors_precedence() {
        assert_eq!(resolve_output_mode(true, Some("human"), true), OutputMode::Json);
        assert_eq!(resolve_output_mode(false, Some("json"), true), OutputMode::Json);
        assert_eq!(resolve_output_mode(false, Some("human"), false), OutputMode::Human);
        assert_eq!(resolve_output_mode(false, None, true), OutputMode::Human);
        assert_eq!(resolve_output_mode(false, None, false), OutputMode::Json);
    }

    #[test]
    fn exit_codes_are_stable() {
        assert_eq!(CliError::User(String::new()).exit_code(), 1);
        assert_eq!(CliError::Runtime(String::new()).exit_code(), 2);
    }
}
