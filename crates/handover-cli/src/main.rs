mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, flag::FlagSubcommand, record::RecordSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "handover",
    about = "Bot-to-bot handover: host the orchestration hook and inspect its state",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .handover/)
    #[arg(long, global = true, env = "HANDOVER_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .handover/ with a default config
    Init {
        /// Name of the primary bot (default: directory name)
        #[arg(long)]
        bot: Option<String>,
    },

    /// Run the HTTP hosting service
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8088")]
        port: u16,
    },

    /// Inspect or close orchestration records
    Record {
        #[command(subcommand)]
        subcommand: RecordSubcommand,
    },

    /// Read and write session flags
    Flag {
        #[command(subcommand)]
        subcommand: FlagSubcommand,
    },

    /// Show or validate the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init { bot } => cmd::init::run(&root, bot.as_deref()),
        Commands::Serve { port } => cmd::serve::run(&root, port),
        Commands::Record { subcommand } => cmd::record::run(&root, subcommand, cli.json),
        Commands::Flag { subcommand } => cmd::flag::run(&root, subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
