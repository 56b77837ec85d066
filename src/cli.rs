//! Command-line surface.

use crate::capture::{CaptureProvider, DesktopHost, ExtensionCapture, RenderRoot, ScreenRasterizer};
use crate::config::Config;
use crate::environment::{EnvironmentCapabilities, ExtensionHost};
use crate::history::{FileKeyValueStore, HistoryStore};
use crate::upload::{SupabaseStore, UploadClient, UploadSettings};
use crate::workflow::{expiry_notice, CaptureWorkflow};
use clap::{Parser, Subcommand, ValueEnum};
use std::error::Error;
use std::sync::{Arc, Mutex};

#[derive(Debug, Parser)]
#[command(name = "snapshare", version, about = "Capture, upload, and share screenshots in seconds")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Capture a screenshot, upload it, and print the share link
    Capture {
        /// What to capture
        #[arg(long, value_enum, default_value_t = Source::Auto)]
        source: Source,
        /// Monitor to capture with `--source screen` (defaults to the primary one)
        #[arg(long)]
        monitor: Option<String>,
    },
    /// Show or edit the list of recent links
    History {
        #[command(subcommand)]
        action: Option<HistoryAction>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Source {
    /// Focused window when it can be captured, otherwise the screen
    Auto,
    /// Focused window only
    Window,
    /// Whole monitor
    Screen,
}

#[derive(Debug, Subcommand)]
pub enum HistoryAction {
    List,
    /// Remove one entry by id
    Remove { id: String },
    /// Remove every entry
    Clear,
}

pub async fn execute(cli: Cli, config: Config) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Command::Capture { source, monitor } => capture(&config, source, monitor).await,
        Command::History { action } => history(&config, action.unwrap_or(HistoryAction::List)),
    }
}

fn open_history(config: &Config) -> HistoryStore {
    HistoryStore::open(Arc::new(FileKeyValueStore::new(&config.data_dir)))
}

fn select_provider(source: Source, monitor: Option<String>) -> CaptureProvider {
    let root = monitor.map(RenderRoot::Monitor).unwrap_or_default();
    let host: Option<Arc<dyn ExtensionHost>> = match source {
        Source::Screen => None,
        Source::Auto | Source::Window => Some(Arc::new(DesktopHost::detect())),
    };

    if source == Source::Window {
        return CaptureProvider::Extension(ExtensionCapture::new(host));
    }
    EnvironmentCapabilities::resolve(host, Arc::new(ScreenRasterizer), root).capture_provider()
}

async fn capture(config: &Config, source: Source, monitor: Option<String>) -> Result<(), Box<dyn Error>> {
    let (url, key) = config.backend()?;
    let store = SupabaseStore::new(url, key, &config.bucket)?;
    let settings = UploadSettings {
        links_table: config.links_table.clone(),
        ..UploadSettings::default()
    };

    let workflow = CaptureWorkflow::new(
        select_provider(source, monitor),
        UploadClient::new(Arc::new(store), settings),
        Arc::new(Mutex::new(open_history(config))),
        &config.preview_dir,
    );

    match workflow.capture().await {
        Ok(shared) => {
            let preview = workflow.keep_preview().unwrap_or(shared.preview_path);
            println!("Screenshot captured! Your screenshot is ready to share.");
            println!("Preview: {}", preview.display());
            println!("Link:    {}", shared.shareable_url);
            println!("{}", expiry_notice());
            Ok(())
        }
        Err(e) => {
            if let Some(notice) = e.notice() {
                eprintln!("{}: {}", notice.title, notice.description);
            }
            Err(e.into())
        }
    }
}

fn history(config: &Config, action: HistoryAction) -> Result<(), Box<dyn Error>> {
    let mut store = open_history(config);
    match action {
        HistoryAction::List => {
            if store.list().is_empty() {
                println!("No screenshots in history");
            }
            for entry in store.list() {
                println!("{}  {}  {}", entry.id, entry.created_at, entry.url);
            }
        }
        HistoryAction::Remove { id } => store.remove(&id)?,
        HistoryAction::Clear => {
            store.clear()?;
            println!("History cleared");
        }
    }
    Ok(())
}
