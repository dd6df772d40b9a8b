use clap::{ArgAction, Parser, Subcommand};
use commands::{config, fetch, search};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "steamreviews")]
#[command(about = "Fetch Steam user reviews and export them as text, CSV, XLSX, DOCX or JSON")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Write logs to a daily rotated file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch reviews for a game and write them to a file
    #[command(long_about = "Fetch the most recent reviews for a game, resolve author names and export the result. The game is given by name (looked up in the local game catalog) or directly by Steam app id. Defaults come from config.toml.")]
    Fetch(fetch::FetchArgs),

    /// Search the local game catalog by name
    #[command(long_about = "Case-insensitive substring search over the game catalog (steam_games.json). Prints at most 50 matches with their app ids.")]
    Search {
        /// Part of the game name
        query: String,

        /// Maximum number of matches to show
        #[arg(long, default_value_t = steam_reviews_sources::catalog::DEFAULT_SEARCH_LIMIT)]
        limit: usize,
    },

    /// Manage configuration and the Steam API key
    #[command(long_about = "View or modify settings. The Steam Web API key is only needed to show author names; without it authors are shown by their Steam id.")]
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigCommands {
    /// Show current configuration (masks the API key)
    Show {
        /// Show the API key unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },

    /// Store the Steam Web API key
    #[command(long_about = "Store the Steam Web API key in credentials.toml. The STEAM_API_KEY environment variable takes precedence over the stored key.")]
    SetKey {
        /// API key (if not provided, will prompt)
        #[arg(long)]
        key: Option<String>,
    },

    /// Write a config.toml with default values
    Init {
        /// Overwrite an existing config file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    logging::init_logging_with_file(cli.verbose, cli.quiet, cli.log_file)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Fetch(args) => fetch::run_fetch(args, &output).await,
        Commands::Search { query, limit } => search::run_search(&query, limit, &output),
        Commands::Config { cmd } => config::run_config(cmd, &output),
    }
}
