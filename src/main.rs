use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, info};

use gravityforms::api::{ApiClient, EntryService};

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before parsing so env-backed flags can see it
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.connection.debug {
        logger.filter_module("gravityforms", LevelFilter::Debug);
    }
    logger.init();

    info!("Starting gravityforms-cli");

    let config = cli.connection.to_config()?;
    let service = EntryService::new(ApiClient::new(config)?);

    match cli.command {
        Commands::Import(import_args) => {
            cli::commands::handle_import_command(import_args, &service).await?;
        }
        Commands::Entries(entries_args) => {
            cli::commands::handle_entries_command(entries_args, &service).await?;
        }
    }

    Ok(())
}
