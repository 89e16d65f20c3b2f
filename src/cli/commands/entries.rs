use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::*;
use gravityforms::api::EntryService;

#[derive(Args)]
pub struct EntriesCommands {
    #[command(subcommand)]
    pub command: EntriesSubcommands,
}

#[derive(Subcommand)]
pub enum EntriesSubcommands {
    /// List every entry of a form
    List {
        /// Form id (0 lists entries of all forms)
        #[arg(long, default_value_t = 0)]
        form_id: u64,
    },
    /// Show a single entry
    Get {
        /// Entry id
        id: u64,
    },
    /// Delete an entry
    Delete {
        /// Entry id
        id: u64,
    },
}

/// Handle the entries command
pub async fn handle_entries_command(args: EntriesCommands, service: &EntryService) -> Result<()> {
    match args.command {
        EntriesSubcommands::List { form_id } => {
            let entries = service.list_entries(form_id).await?;
            let output = serde_json::to_string_pretty(&entries).context("Failed to render entries")?;
            println!("{}", output);
            eprintln!("{} entries", entries.len().to_string().bright_green().bold());
        }
        EntriesSubcommands::Get { id } => {
            let entry = service.get_entry(id).await?;
            let output = serde_json::to_string_pretty(&entry).context("Failed to render entry")?;
            println!("{}", output);
        }
        EntriesSubcommands::Delete { id } => {
            service.delete_entry(id).await?;
            println!("{} entry {}", "Deleted".bright_red().bold(), id);
        }
    }

    Ok(())
}
