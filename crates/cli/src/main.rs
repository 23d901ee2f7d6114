mod commands;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use rulebook_interchange::Rulebook;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Rulebook formula compiler.
#[derive(Parser)]
#[command(name = "rulebook", version, about = "Rulebook formula compiler")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the evaluation levels of every entity's calculated fields
    Levels {
        /// Path to the rulebook JSON document
        rulebook: PathBuf,
    },

    /// Generate code from a rulebook
    Generate {
        #[command(subcommand)]
        command: GenerateCommands,
    },

    /// Emit the explain spec (evaluation order and formula templates)
    Explain {
        /// Path to the rulebook JSON document
        rulebook: PathBuf,
    },

    /// Show the provenance graph of a single formula
    Graph {
        /// Formula text, e.g. "={{A}} + 1"
        formula: String,
        /// Name of the calculated field the formula belongs to
        #[arg(long, default_value = "Result")]
        field: String,
    },

    /// Compute the calculated fields of an entity's records
    Eval {
        /// Path to the rulebook JSON document
        rulebook: PathBuf,
        /// Entity whose records are evaluated
        #[arg(long)]
        entity: String,
        /// JSON array of records (default: the entity's own data rows)
        #[arg(long)]
        records: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub(crate) enum GenerateCommands {
    /// Generate a Python module with one function per calculated field
    Python {
        /// Path to the rulebook JSON document
        rulebook: PathBuf,
        /// Output file (default: stdout)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Leave out the compute_all_calculated_fields dispatcher
        #[arg(long)]
        no_dispatcher: bool,
    },
}

fn init_tracing(quiet: bool) {
    let level = if quiet {
        tracing::Level::ERROR
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    match cli.command {
        Commands::Levels { rulebook } => {
            commands::levels::cmd_levels(&rulebook, cli.output, cli.quiet);
        }
        Commands::Generate { command } => {
            commands::generate::cmd_generate(command, cli.output, cli.quiet);
        }
        Commands::Explain { rulebook } => {
            commands::explain::cmd_explain(&rulebook, cli.output, cli.quiet);
        }
        Commands::Graph { formula, field } => {
            commands::graph::cmd_graph(&formula, &field, cli.output, cli.quiet);
        }
        Commands::Eval {
            rulebook,
            entity,
            records,
        } => {
            commands::eval::cmd_eval(
                &rulebook,
                &entity,
                records.as_deref(),
                cli.output,
                cli.quiet,
            );
        }
    }
}

/// Load a rulebook or exit with status 1.
pub(crate) fn load_or_exit(path: &Path, output: OutputFormat, quiet: bool) -> Rulebook {
    match rulebook_interchange::load_rulebook(path) {
        Ok(rulebook) => rulebook,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    }
}

/// Print a JSON value to stdout, pretty.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) {
    let pretty = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"serialization error: {}\"}}", e));
    println!("{}", pretty);
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
