mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "specmerge",
    about = "Parse, validate and merge requirement specs and their change deltas",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from specmerge.yaml, specs/ or .git/)
    #[arg(long, global = true, env = "SPECMERGE_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the specs/ and changes/ layout and a default specmerge.yaml
    Init,

    /// Validate a spec or delta file, or every baseline spec with --all
    Validate {
        /// File to validate
        path: Option<PathBuf>,

        /// Treat the file as a delta document
        #[arg(long)]
        delta: bool,

        /// Validate every baseline spec and check for cross-spec duplicates
        #[arg(long, conflicts_with = "path")]
        all: bool,

        /// Fail on warnings as well as errors
        #[arg(long)]
        strict: bool,
    },

    /// Show the parsed structure of a spec or delta file
    Show {
        path: PathBuf,

        /// Parse the file as a delta document
        #[arg(long)]
        delta: bool,
    },

    /// Print a spec in canonical form
    Fmt {
        path: PathBuf,

        /// Rewrite the file in place
        #[arg(long)]
        write: bool,
    },

    /// Merge one delta file into one baseline file
    Apply {
        baseline: PathBuf,
        delta: PathBuf,

        /// Write the merged spec back to BASELINE
        #[arg(long)]
        write: bool,
    },

    /// Merge a change into the baseline specs and move it to the archive
    Archive {
        change: String,

        /// Move the change without updating baseline specs
        #[arg(long)]
        skip_specs: bool,

        /// Show what would be merged without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// List capabilities and pending changes
    List,

    /// Inspect and validate specmerge.yaml
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Validate {
            path,
            delta,
            all,
            strict,
        } => cmd::validate::run(&root, path.as_deref(), delta, all, strict, cli.json),
        Commands::Show { path, delta } => cmd::show::run(&path, delta, cli.json),
        Commands::Fmt { path, write } => cmd::fmt::run(&path, write),
        Commands::Apply {
            baseline,
            delta,
            write,
        } => cmd::apply::run(&baseline, &delta, write, cli.json),
        Commands::Archive {
            change,
            skip_specs,
            dry_run,
        } => cmd::archive::run(&root, &change, skip_specs, dry_run, cli.json),
        Commands::List => cmd::list::run(&root, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
