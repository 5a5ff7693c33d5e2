use std::sync::Arc;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use tracing::info;

use drive_organizer::{logging, AppConfig, DriveStore, DryRunStore, FileStore, Folder, Organizer};

#[derive(Parser)]
#[command(name = "drive-organizer", version, about = "Sort, dedupe and prefix files in Google Drive")]
struct Cli {
    /// Log intended moves and renames without applying them
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Move loose files into the destination folder their name prefix points at
    AutoSort,
    /// Keep one canonically named copy of each duplicate and set the rest aside
    FindDuplicates {
        /// Only check this folder instead of every destination folder
        #[arg(long, requires = "folder_name")]
        folder_id: Option<String>,
        #[arg(long, requires = "folder_id")]
        folder_name: Option<String>,
    },
    /// Prefix file names with the name of their folder
    PrefixFilenames,
    /// Show the loaded configuration
    PrintConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    logging::init_logger();

    let args = Cli::parse();
    let config = AppConfig::read()?;

    if matches!(args.command, Commands::PrintConfig) {
        print_config(&config);
        return Ok(());
    }
    config.validate()?;

    let drive = DriveStore::new(config.access_token.clone())
        .with_base_url(&config.api_base_url)
        .with_page_size(config.page_size);
    let store: Arc<dyn FileStore> = if args.dry_run || config.dry_run {
        Arc::new(DryRunStore::new(drive))
    } else {
        Arc::new(drive)
    };
    let organizer = Organizer::new(store, config.source_root(), config.destination_parent());

    let report = match args.command {
        Commands::AutoSort => organizer.auto_sort_by_prefix().await?,
        Commands::FindDuplicates {
            folder_id: Some(id),
            folder_name: Some(name),
        } => organizer.find_duplicates_in_folder(&Folder::new(id, name)).await?,
        Commands::FindDuplicates { .. } => organizer.find_duplicates().await?,
        Commands::PrefixFilenames => organizer.prefix_filenames().await?,
        Commands::PrintConfig => return Ok(()),
    };

    info!(
        "Done: {} applied, {} not confirmed by the store",
        report.applied.len(),
        report.failed.len()
    );
    Ok(())
}

fn print_config(config: &AppConfig) {
    println!("Source folder:      {} ({})", config.source_folder_name, config.source_folder_id);
    println!(
        "Destination parent: {} ({})",
        config.target_parent_folder_name, config.target_parent_folder_id
    );
    println!("API base URL:       {}", config.api_base_url);
    println!("Page size:          {}", config.page_size);
    println!("Dry run:            {}", config.dry_run);
    println!("Access token set:   {}", !config.access_token.trim().is_empty());
    if let Err(e) = config.validate() {
        println!("Invalid:            {}", e);
    }
}
