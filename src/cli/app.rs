use super::commands::entries::EntriesCommands;
use super::commands::import::ImportCommands;
use clap::{ArgAction, Args, Parser, Subcommand};
use gravityforms::api::ClientConfig;
use gravityforms::api::constants::DEFAULT_TIMEOUT_SECS;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "gravityforms-cli", version)]
#[command(about = "A CLI tool for importing and managing Gravity Forms entries")]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection settings shared by every command
#[derive(Args)]
pub struct ConnectionArgs {
    /// Gravity Forms REST base URL
    #[arg(long, env = "GF_API_URL", help = "REST base URL, e.g. https://your.domain/wp-json/gf/v2")]
    pub api_url: String,

    /// Gravity Forms API key
    #[arg(long, env = "GF_API_KEY", help = "Gravity Forms API key")]
    pub api_key: String,

    /// Gravity Forms API secret
    #[arg(long, env = "GF_API_SECRET", hide_env_values = true, help = "Gravity Forms API secret")]
    pub api_secret: String,

    /// Request timeout in seconds
    #[arg(long, env = "GF_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS, help = "Request timeout in seconds")]
    pub timeout: u64,

    /// Trace every API request and response
    #[arg(long, env = "GF_DEBUG", default_value_t = true, action = ArgAction::Set, help = "Trace API requests (true/false)")]
    pub debug: bool,
}

impl ConnectionArgs {
    pub fn to_config(&self) -> anyhow::Result<ClientConfig> {
        ClientConfig::builder()
            .base_url(&self.api_url)
            .credentials(&self.api_key, &self.api_secret)
            .timeout(Duration::from_secs(self.timeout))
            .debug(self.debug)
            .build()
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import entries from a CSV file
    Import(ImportCommands),
    /// Inspect and manage entries
    Entries(EntriesCommands),
}
