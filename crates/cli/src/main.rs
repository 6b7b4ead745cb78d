use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod flags;

use flags::ModeFlag;

#[derive(Parser)]
#[command(name = "contextrie")]
#[command(about = "Hierarchical section metadata for AI context", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ./contextrie.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the raw section tree of a markdown file
    Parse(ParseArgs),

    /// Annotate every section of a markdown file with metadata
    Annotate(AnnotateArgs),

    /// Ingest .md, .txt and .csv files into sources
    Ingest(IngestArgs),
}

#[derive(Args)]
pub(crate) struct ParseArgs {
    /// Markdown file
    pub(crate) file: PathBuf,
}

#[derive(Args)]
pub(crate) struct EngineArgs {
    /// Traversal mode (overrides config)
    #[arg(long, value_enum)]
    pub(crate) mode: Option<ModeFlag>,

    /// Chunk leaves whose content exceeds this many characters
    #[arg(long)]
    pub(crate) max_leaf_size: Option<usize>,

    /// Maximum metadata calls in flight
    #[arg(long)]
    pub(crate) concurrency: Option<usize>,
}

#[derive(Args)]
pub(crate) struct AnnotateArgs {
    /// Markdown file
    pub(crate) file: PathBuf,

    #[command(flatten)]
    pub(crate) engine: EngineArgs,
}

#[derive(Args)]
pub(crate) struct IngestArgs {
    /// Files to ingest
    #[arg(required = true, num_args = 1..)]
    pub(crate) files: Vec<PathBuf>,

    /// Write one <id>.json per source into this directory
    #[arg(long)]
    pub(crate) output_dir: Option<PathBuf>,

    /// Write sources into the configured output_dir
    #[arg(long)]
    pub(crate) write: bool,

    /// Files ingested at the same time (overrides config)
    #[arg(long)]
    pub(crate) parallel: Option<usize>,

    #[command(flatten)]
    pub(crate) engine: EngineArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = context_ingest::IngestConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Parse(args) => commands::run_parse(&args)?,
        Commands::Annotate(args) => commands::run_annotate(args, config).await?,
        Commands::Ingest(args) => commands::run_ingest(args, config).await?,
    }

    Ok(())
}
