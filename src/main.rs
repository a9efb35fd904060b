use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use tiktok_im_extractor::config::AppConfig;
use tiktok_im_extractor::db::CaseDatabase;
use tiktok_im_extractor::discovery::ImageDirectoryLocator;
use tiktok_im_extractor::export::{self, ExportFormat};
use tiktok_im_extractor::logging::{init_logging, LogFormat, OperationTimer};
use tiktok_im_extractor::TiktokAnalyzer;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Write JSON logs to this file as well
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract TikTok contacts and messages from a device image into the case
    Extract {
        /// Root directory of the extracted device image
        #[arg(short, long)]
        image: PathBuf,

        /// Case database file (defaults to the configured path)
        #[arg(short, long)]
        case_db: Option<PathBuf>,
    },
    /// Export the case's contacts and messages
    Export {
        /// Case database file (defaults to the configured path)
        #[arg(short, long)]
        case_db: Option<PathBuf>,

        /// Output format (csv or json)
        #[arg(short, long)]
        format: Option<String>,

        /// Output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Print the effective configuration as YAML
    ShowConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging; the guard flushes the file log on exit
    let log_file = cli
        .log_file
        .clone()
        .or_else(|| config.logging.file_path.as_ref().map(PathBuf::from));
    let log_format: LogFormat = config.logging.format.parse()?;
    let _guard = init_logging(&config.get_log_level(), log_format, log_file.as_deref())?;

    info!("Starting tiktok-im-extractor");

    match &cli.command {
        Commands::Extract { image, case_db } => extract(&config, image, case_db.as_deref())?,
        Commands::Export {
            case_db,
            format,
            output_dir,
        } => export_case(&config, case_db.as_deref(), format.as_deref(), output_dir.as_deref())?,
        Commands::ShowConfig => show_config(&config)?,
    }

    Ok(())
}

fn open_case(config: &AppConfig, case_db: Option<&Path>) -> Result<CaseDatabase> {
    let path = case_db.map_or_else(|| PathBuf::from(config.get_case_db_path()), Path::to_path_buf);
    info!("Using case database at: {}", path.display());

    CaseDatabase::new(&path, config.case_db.pool_size)
        .with_context(|| format!("Failed to open case database {}", path.display()))
}

/// Run one extraction against an image directory
fn extract(config: &AppConfig, image: &Path, case_db: Option<&Path>) -> Result<()> {
    let timer = OperationTimer::new("extract");
    let case = open_case(config, case_db)?;

    let locator = ImageDirectoryLocator::new(image);
    let analyzer = TiktokAnalyzer::new(&case, config.parser.clone())?;
    let report = analyzer.analyze(&locator, &case)?;

    if report.databases_failed > 0 || report.rows_skipped > 0 {
        warn!(
            "{} database(s) failed and {} row(s) were skipped; see log for details",
            report.databases_failed, report.rows_skipped
        );
    }

    let counts = case.counts()?;
    info!(
        "Case now holds {} contacts ({} attributes) and {} messages",
        counts.contacts, counts.attributes, counts.messages
    );
    timer.finish();
    Ok(())
}

/// Export contacts and messages from the case database
fn export_case(
    config: &AppConfig, case_db: Option<&Path>, format: Option<&str>, output_dir: Option<&Path>,
) -> Result<()> {
    let format: ExportFormat = format.unwrap_or(config.export.default_format.as_str()).parse()?;
    let output_dir = output_dir.map_or_else(|| PathBuf::from(&config.export.output_directory), Path::to_path_buf);

    // Create output directory if it doesn't exist
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    let case = open_case(config, case_db)?;

    let contacts = case.contacts()?;
    let path = export::write_contacts(&contacts, format, &output_dir)?;
    info!("Exported {} contacts to {}", contacts.len(), path.display());

    let messages = case.messages()?;
    let path = export::write_messages(&messages, format, &output_dir)?;
    info!("Exported {} messages to {}", messages.len(), path.display());

    Ok(())
}

#[allow(clippy::print_stdout)]
fn show_config(config: &AppConfig) -> Result<()> {
    let rendered = serde_yaml::to_string(config).context("Failed to render configuration")?;
    println!("{rendered}");
    Ok(())
}
