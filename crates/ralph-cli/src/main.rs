mod cmd;
mod output;
mod root;

use anyhow::Context;
use clap::{Parser, Subcommand};
use ralph_core::{config::Config, paths};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ralph",
    about = "Convert CHANGE-*.md documents into prd.json context and user stories",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .ralph/ or .git/)
    #[arg(long, global = true, env = "RALPH_ROOT")]
    root: Option<PathBuf>,

    /// Directory holding CHANGE-*.md documents (default: PRDs/Pending)
    #[arg(long, global = true)]
    prds: Option<PathBuf>,

    /// prd.json store to update (default: scripts/ralph/prd.json)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Log extraction details to stderr
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge every pending document into the store (the default)
    Convert {
        /// Extract and report without writing the store
        #[arg(long)]
        dry_run: bool,
    },

    /// Show what a single document would produce, without writing
    Inspect {
        /// Path to a CHANGE-<slug>.md document
        file: PathBuf,
    },

    /// Summarize the store
    Status,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = Config::load(&root)
        .with_context(|| format!("failed to read {}", paths::config_path(&root).display()))
        .and_then(|config| {
            let run_paths = config.resolve(&root, cli.prds.as_deref(), cli.store.as_deref());
            tracing::debug!(
                root = %root.display(),
                prds = %run_paths.prds_dir.display(),
                store = %run_paths.store.display(),
                "resolved paths"
            );
            match cli.command.unwrap_or(Commands::Convert { dry_run: false }) {
                Commands::Convert { dry_run } => cmd::convert::run(&run_paths, dry_run, cli.json),
                Commands::Inspect { file } => cmd::inspect::run(&run_paths, &file, cli.json),
                Commands::Status => cmd::status::run(&run_paths, cli.json),
            }
        });

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
