//! safety-gate - Rule-based safety gate for editor tool calls
//!
//! # Usage
//!
//! ```bash
//! # As a PreToolUse hook (reads JSON from stdin)
//! echo '{"tool":{"name":"Bash","params":{"command":"rm -rf /"}}}' | safety-gate
//!
//! # Only gate Bash and Write
//! safety-gate --only bash --only write
//!
//! # Check a patterns file
//! safety-gate validate ~/.claude/hooks/patterns.toml
//! ```

use std::io;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use safety_gate::{
    audit::{AuditSink, JsonlAuditLog, NoopAudit},
    config::{self, PatternStore, RuleConfig},
    input::OperationKind,
    output::{HookOutput, EXIT_ERROR, EXIT_OK},
    paths, SafetyGate,
};

/// Environment variable holding the diagnostic log filter
const LOG_ENV: &str = "SAFETY_GATE_LOG";

#[derive(Debug, Parser)]
#[command(name = "safety-gate", version, about = "Rule-based safety gate for editor tool calls")]
struct Cli {
    /// Path to the patterns file (TOML or YAML)
    #[arg(short, long, global = true, value_name = "PATH")]
    patterns: Option<PathBuf>,

    /// Audit log location, overriding safetySettings.logFile
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Do not write an audit log at all; this also drops the block and ask
    /// records that `enableLogging = false` would keep
    #[arg(long)]
    no_audit: bool,

    /// Only gate these tools; others pass through (repeatable)
    #[arg(long = "only", value_enum, value_name = "TOOL")]
    only: Vec<ToolFilter>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load a patterns file strictly and report what it contains
    Validate {
        /// File to check (defaults to the discovered patterns file)
        path: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ToolFilter {
    Bash,
    Edit,
    Write,
    Read,
}

impl From<ToolFilter> for OperationKind {
    fn from(filter: ToolFilter) -> Self {
        match filter {
            ToolFilter::Bash => OperationKind::Shell,
            ToolFilter::Edit => OperationKind::Edit,
            ToolFilter::Write => OperationKind::Write,
            ToolFilter::Read => OperationKind::Read,
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .with_target(false)
        .try_init();
}

/// Strict load of one patterns file; exit code for the result
fn validate(path: Option<PathBuf>, fallback: Option<PathBuf>) -> i32 {
    let Some(path) = path.or(fallback).or_else(|| config::locate(None)) else {
        eprintln!("No patterns file found");
        return EXIT_ERROR;
    };

    match RuleConfig::load_from(&path) {
        Ok(config) => {
            println!(
                "{}: {} zero-access, {} read-only, {} no-delete, {} command patterns, {} content patterns",
                path.display(),
                config.zero_access_paths.len(),
                config.read_only_paths.len(),
                config.no_delete_paths.len(),
                config.command_patterns.len(),
                config.content_patterns.len(),
            );
            EXIT_OK
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_ERROR
        }
    }
}

fn audit_sink(cli: &Cli, config: &RuleConfig) -> Box<dyn AuditSink> {
    if cli.no_audit {
        return Box::new(NoopAudit);
    }
    let path = match &cli.log_file {
        Some(path) => Some(PathBuf::from(paths::expand(&path.to_string_lossy()))),
        None => config.log_path(),
    };
    match path {
        Some(path) => Box::new(JsonlAuditLog::new(path)),
        None => Box::new(NoopAudit),
    }
}

/// Hook mode: one envelope on stdin, verdict via exit code
fn run_hook(cli: Cli) -> i32 {
    let store = PatternStore::open(cli.patterns.clone());
    let audit = audit_sink(&cli, &store.snapshot());
    let tools = cli.only.iter().copied().map(OperationKind::from).collect();
    let gate = SafetyGate::new(store, audit).with_tools(tools);

    let output = match io::read_to_string(io::stdin().lock()) {
        Ok(input) => gate
            .handle_json(&input)
            .unwrap_or_else(|e| HookOutput::Error(format!("Error: {}", e))),
        Err(e) => HookOutput::Error(format!("Error: failed to read stdin: {}", e)),
    };

    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    if output.emit(&mut stdout, &mut stderr).is_err() {
        return EXIT_ERROR;
    }
    output.exit_code()
}

fn main() {
    init_tracing();
    let mut cli = Cli::parse();

    let code = match cli.command.take() {
        Some(Command::Validate { path }) => validate(path, cli.patterns),
        None => run_hook(cli),
    };
    process::exit(code);
}
