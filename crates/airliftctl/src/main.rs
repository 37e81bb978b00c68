//! Airlift Control - CLI for driving a bundle store from the command line.
//!
//! Useful for operating a store outside a host application: trigger an
//! update, print the bundle a host would load, prune old versions.

use airlift::{Updater, UpdaterConfig};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser)]
#[command(name = "airliftctl")]
#[command(about = "Airlift - over-the-air bundle updates", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a TOML config file (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the data directory from the config
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and install the latest compatible bundle version
    Update {
        /// Project API key (sent as a request header)
        #[arg(long)]
        api_key: String,

        /// Project identifier
        #[arg(long)]
        project: String,

        /// Restart this process once the update is installed
        #[arg(long)]
        restart: bool,
    },

    /// Print the bundle path a host application would load right now
    Latest,

    /// Delete version directories beyond the retention limit
    Prune,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => UpdaterConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => UpdaterConfig::default(),
    };
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    let updater = Updater::new(config);

    match cli.command {
        Commands::Update {
            api_key,
            project,
            restart,
        } => {
            match updater.update(&api_key, &project).await {
                Ok(outcome) => {
                    println!("{}", outcome.path.display());
                    if restart {
                        updater.restart();
                    }
                }
                Err(e) => bail!("Update failed [{}]: {}", e.kind(), e),
            }
        }

        Commands::Latest => match updater.latest_bundle_path() {
            Some(path) => println!("{}", path.display()),
            None => {
                eprintln!("No bundle installed");
                std::process::exit(1);
            }
        },

        Commands::Prune => {
            let outcome = updater.prune().await;
            println!(
                "Removed {} version(s), {} failure(s)",
                outcome.removed.len(),
                outcome.failed.len()
            );
        }
    }

    Ok(())
}
