use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;

use timbre_etl::Config;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "timbre", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the raw catalog (default: ~/.local/share/timbre/catalog.json)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Fetch track features from the provider into the catalog
    ///
    /// Reads one track identifier per line (bare ids, spotify:track: URIs
    /// and open.spotify.com links are accepted; blank lines and lines
    /// starting with '#' are skipped). For each identifier the provider is
    /// asked for audio features, track popularity and the primary artist's
    /// popularity and genres. Artists without genres are stored with the
    /// genre "unknown".
    ///
    /// Identifiers the provider does not know are listed at the end and
    /// skipped. If the provider rejects the configured credentials the
    /// whole run stops and nothing is written.
    ///
    /// Credentials come from the [provider] section of the config file
    /// (see 'timbre config init').
    Ingest {
        /// File with one track identifier per line
        ids_file: PathBuf,

        /// Write to this file instead of the configured catalog
        #[arg(long)]
        out: Option<PathBuf>,

        /// Keep rows already in the output file and add the new ones
        #[arg(long)]
        append: bool,
    },
    /// Recommend catalog tracks similar to a playlist
    ///
    /// The playlist is summarised as the sum of its tracks' feature
    /// vectors (audio attributes, popularity and genre columns). Every
    /// other catalog track is scored by cosine similarity to that vector
    /// and the best matches are printed, most similar first.
    Recommend {
        /// Playlist track identifiers
        ids: Vec<String>,

        /// Read additional playlist identifiers from a file, one per line
        #[arg(long)]
        playlist_file: Option<PathBuf>,

        /// Number of recommendations (default: top_k from config, 40)
        #[arg(short, long)]
        k: Option<usize>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show catalog statistics
    Status,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Create a config file with defaults if none exists
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.catalog {
        Some(path) => Config::load_with_catalog_path(path)?,
        None => Config::load()?,
    };

    twyg::setup(config.logging.clone())
        .map_err(|e| anyhow!("Failed to set up logging: {e}"))?;

    match cli.command {
        Commands::Ingest {
            ids_file,
            out,
            append,
        } => {
            commands::run_ingest(&config, &ids_file, out, append).await?;
        }
        Commands::Recommend {
            ids,
            playlist_file,
            k,
            json,
        } => {
            let k = k.unwrap_or(config.top_k);
            commands::run_recommend(&config, ids, playlist_file.as_deref(), k, json)?;
        }
        Commands::Status => {
            commands::show_status(&config)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show_config(&config),
            ConfigAction::Init => commands::config::init_config()?,
        },
    }

    Ok(())
}
