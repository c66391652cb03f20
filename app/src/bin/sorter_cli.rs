use api_client::{ApiClient, CollectionId, GalleryBackend, MediaId};
use clap::{Parser, Subcommand};
use scan::{ScanCoordinator, ScanEvent, ScanSettings, ScanStop};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[allow(dead_code)]
#[path = "../config.rs"]
mod config;
#[path = "../logging.rs"]
mod logging;

#[derive(Parser)]
#[command(
    name = "sorter_cli",
    author,
    version,
    about = "Cloud Sorter command-line client"
)]
struct Cli {
    /// Override log level (e.g. info, debug)
    #[arg(long)]
    log_level: Option<String>,
    /// Override the backend base URL
    #[arg(long)]
    api_base_url: Option<String>,
    /// Override the scan poll interval in milliseconds
    #[arg(long)]
    poll_interval_ms: Option<u64>,
    /// Override the overall scan timeout in seconds
    #[arg(long)]
    scan_timeout_secs: Option<u64>,
    /// Consecutive failed polls before a scan is aborted
    #[arg(long)]
    max_poll_failures: Option<u32>,
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Enable tokio console for debugging
    #[arg(long)]
    debug_console: bool,
    /// Enable tracing spans instrumentation
    #[arg(long)]
    trace_spans: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Trigger a backend scan and follow it until it settles
    Scan {
        /// Cancel polling after this many seconds
        #[arg(long)]
        cancel_after_secs: Option<u64>,
    },
    /// List media items known to the backend
    ListMedia {
        /// Show at most this many items
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print a single media item as JSON
    ShowItem { id: MediaId },
    /// List all collections
    ListCollections,
    /// Create a collection, optionally assigning a file to it
    CreateCollection {
        name: String,
        /// File to assign to the new collection
        #[arg(long)]
        assign: Option<MediaId>,
    },
    /// Add a file to a collection
    Assign {
        file_id: MediaId,
        collection_id: CollectionId,
    },
    /// Upload a collection's members to cloud storage
    SyncCollection { id: CollectionId },
    /// Print the thumbnail URL of a media item
    ThumbnailUrl { id: MediaId },
    /// Print the stream URL of a media item
    StreamUrl { id: MediaId },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let overrides = config::AppConfigOverrides {
        log_level: cli.log_level.clone(),
        api_base_url: cli.api_base_url.clone(),
        poll_interval_ms: cli.poll_interval_ms,
        scan_timeout_secs: cli.scan_timeout_secs,
        max_poll_failures: cli.max_poll_failures,
        debug_console: cli.debug_console,
        trace_spans: cli.trace_spans,
        ..Default::default()
    };
    let cfg = config::AppConfig::load_from(cli.config.clone()).apply_overrides(&overrides);
    let _guard = logging::init(&cfg)?;

    let client = ApiClient::new(&cfg.api_base_url)?;

    match cli.command {
        Commands::Scan { cancel_after_secs } => {
            let settings = ScanSettings {
                poll_interval: cfg.poll_interval(),
                scan_timeout: cfg.scan_timeout(),
                max_consecutive_failures: cfg.max_poll_failures,
            };
            run_scan(client, settings, cancel_after_secs).await?;
        }
        Commands::ListMedia { limit } => {
            let items = client.list_media().await?;
            for item in items.iter().take(limit.unwrap_or(usize::MAX)) {
                let names: Vec<&str> = item.collections.iter().map(|c| c.name.as_str()).collect();
                if names.is_empty() {
                    println!("{} - {}", item.id, item.file_name);
                } else {
                    println!("{} - {} [{}]", item.id, item.file_name, names.join(", "));
                }
            }
            println!("Media items: {}", items.len());
        }
        Commands::ShowItem { id } => {
            let items = client.list_media().await?;
            if let Some(item) = items.iter().find(|i| i.id == id) {
                println!("{}", serde_json::to_string_pretty(item)?);
            } else {
                println!("Item not found: {}", id);
            }
        }
        Commands::ListCollections => {
            for collection in client.list_collections().await? {
                println!("{} (id: {})", collection.name, collection.id);
            }
        }
        Commands::CreateCollection { name, assign } => {
            let name = name.trim();
            if name.is_empty() {
                return Err("Collection name must not be empty".into());
            }
            let collection = client.create_collection(name).await?;
            println!("Collection created: {} (id: {})", collection.name, collection.id);
            if let Some(file_id) = assign {
                client.assign(file_id, collection.id).await?;
                println!("Assigned {} to {}", file_id, collection.name);
            }
        }
        Commands::Assign {
            file_id,
            collection_id,
        } => {
            let ack = client.assign(file_id, collection_id).await?;
            println!(
                "Assigned {} to collection {}: {}",
                file_id,
                collection_id,
                ack.message.unwrap_or_else(|| "ok".into())
            );
        }
        Commands::SyncCollection { id } => {
            let summary = client.sync_collection(id).await?;
            println!(
                "Synced collection {}: {} uploaded, {} shortcuts, {} errors",
                id, summary.uploaded, summary.shortcuts, summary.errors
            );
        }
        Commands::ThumbnailUrl { id } => {
            let items = client.list_media().await?;
            match items.iter().find(|i| i.id == id) {
                Some(item) => println!("{}", client.thumbnail_url(&item.file_hash)),
                None => println!("Item not found: {}", id),
            }
        }
        Commands::StreamUrl { id } => {
            println!("{}", client.stream_url(id));
        }
    }

    Ok(())
}

async fn run_scan(
    client: ApiClient,
    settings: ScanSettings,
    cancel_after_secs: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let backend: Arc<dyn GalleryBackend> = Arc::new(client);
    let coordinator = ScanCoordinator::new(backend, settings);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let handle = match coordinator.start(tx).await {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("❌ {}", e);
            return Err(e.into());
        }
    };
    if let Some(secs) = cancel_after_secs {
        let canceller = handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            canceller.cancel();
        });
    }

    let mut discovered = 0;
    while let Some(event) = rx.recv().await {
        match event {
            ScanEvent::Triggered(ack) => println!(
                "Scan started: {}",
                ack.message.unwrap_or_else(|| "ok".into())
            ),
            ScanEvent::Polled { items, .. } => {
                discovered = items.len();
                println!("Discovered {} items...", discovered);
            }
            ScanEvent::PollFailed { consecutive, error } => {
                eprintln!("Poll failed ({} in a row): {}", consecutive, error)
            }
            ScanEvent::Finished(stop) => {
                match stop {
                    ScanStop::TimedOut => println!("Scan finished: {} items", discovered),
                    ScanStop::Cancelled => println!("Scan cancelled: {} items", discovered),
                    ScanStop::Aborted { failures } => {
                        return Err(format!("Scan aborted after {} failed polls", failures).into());
                    }
                }
                break;
            }
        }
    }
    drop(handle);
    Ok(())
}
