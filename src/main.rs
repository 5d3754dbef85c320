mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use screenmem::config::{DataPaths, ScreenMemConfig};
use screenmem::records::{CaptureTrigger, TextSource};

#[derive(Parser)]
#[command(name = "screenmem", version, about = "Local memory of the text on your screen")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show record count, last capture, database size and permissions
    Status,
    /// Check database integrity, permissions and capture tooling
    Doctor,
    /// Capture the current screen text once
    CaptureOnce,
    /// Capture on timers until interrupted
    Daemon,
    /// Serve the read-only query API
    Serve,
    /// Store a capture supplied on the command line
    Ingest {
        #[arg(long)]
        text: String,
        #[arg(long, default_value = "Manual")]
        app: String,
        #[arg(long)]
        window: Option<String>,
        #[arg(long)]
        bundle_id: Option<String>,
        #[arg(long, default_value = "synthetic")]
        source: TextSource,
        #[arg(long, default_value = "manual")]
        trigger: CaptureTrigger,
        #[arg(long)]
        display_id: Option<String>,
    },
    /// Full-text search over captured text
    Search {
        query: String,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        app: Option<String>,
    },
    /// Delete captures older than a number of days
    Purge {
        /// Age such as `14d`
        #[arg(long)]
        older_than: String,
    },
    /// Inspect the frame buffer
    Frames {
        #[command(subcommand)]
        action: FramesAction,
    },
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum FramesAction {
    /// List recent frames, newest first
    List {
        /// Only frames from the last N seconds
        #[arg(long, default_value_t = 120)]
        within: u64,
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// OCR recent frames and search their text
    Search {
        query: String,
        #[arg(long, default_value_t = 120)]
        within: u64,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Show,
    /// Set one option, e.g. `retention_days 30`
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = DataPaths::resolve();
    let config = ScreenMemConfig::load(&paths)?;

    // Log to stderr so stdout stays clean for command output.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Status => cli::status::status(&paths, &config)?,
        Command::Doctor => cli::doctor::doctor(&paths, &config)?,
        Command::CaptureOnce => cli::capture::capture_once(&paths, &config)?,
        Command::Daemon => cli::capture::daemon(&paths, &config).await?,
        Command::Serve => cli::serve::serve(&paths, &config).await?,
        Command::Ingest {
            text,
            app,
            window,
            bundle_id,
            source,
            trigger,
            display_id,
        } => cli::ingest::ingest(
            &paths,
            &config,
            cli::ingest::IngestArgs {
                text,
                app,
                window,
                bundle_id,
                source,
                trigger,
                display_id,
            },
        )?,
        Command::Search { query, limit, app } => {
            cli::search::search(&paths, &query, limit, app.as_deref())?
        }
        Command::Purge { older_than } => cli::purge::purge(&paths, &older_than)?,
        Command::Frames { action } => match action {
            FramesAction::List { within, limit } => cli::frames::list(&paths, &config, within, limit)?,
            FramesAction::Search { query, within, limit } => {
                cli::frames::search(&paths, &config, &query, within, limit)?
            }
        },
        Command::Config { action } => match action {
            ConfigAction::Show => cli::config::show(&config)?,
            ConfigAction::Set { key, value } => cli::config::set(&paths, &key, &value)?,
        },
    }

    Ok(())
}
