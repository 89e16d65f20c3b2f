//! CSV import command

use anyhow::Result;
use clap::Args;
use colored::*;
use gravityforms::api::EntryService;
use gravityforms::importer;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Args)]
pub struct ImportCommands {
    /// Input CSV; the header row holds field ids or entry attribute names
    #[arg(long, env = "GF_CSV_FILE", help = "Path to the CSV file to import")]
    pub csv_file: PathBuf,

    /// Form receiving the entries
    #[arg(long, env = "GF_FORM_ID", help = "Target Gravity Forms form id")]
    pub form_id: u64,
}

/// Handle the import command
pub async fn handle_import_command(args: ImportCommands, service: &EntryService) -> Result<()> {
    if args.form_id == 0 {
        anyhow::bail!("Missing form id");
    }

    println!(
        "Importing {} into form {}",
        args.csv_file.display().to_string().cyan(),
        args.form_id.to_string().bright_green().bold()
    );

    let start = Instant::now();
    let summary = importer::import_file(service, args.form_id, &args.csv_file).await?;

    println!();
    println!(
        "{} {} of {} rows in {:.1}s",
        "Created".bright_green().bold(),
        summary.created.len(),
        summary.rows,
        start.elapsed().as_secs_f64()
    );

    if !summary.is_clean() {
        println!(
            "{} {} rows:",
            "Failed".bright_red().bold(),
            summary.failures.len()
        );
        for failure in &summary.failures {
            println!("  line {}: {}", failure.line.to_string().yellow(), failure.error);
        }
    }

    Ok(())
}
