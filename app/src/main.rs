//! Desktop entry point for Cloud Sorter.

#[allow(dead_code)]
mod config;
mod logging;

use api_client::{ApiClient, GalleryBackend};
use clap::Parser;
use config::{AppConfig, AppConfigOverrides};
use scan::ScanSettings;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "cloudsorter", author, version, about = "Cloud Sorter media gallery")]
struct Args {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override log level (e.g. info, debug)
    #[arg(long)]
    log_level: Option<String>,
    /// Override the backend base URL
    #[arg(long)]
    api_base_url: Option<String>,
    /// Enable tokio console for debugging
    #[arg(long)]
    debug_console: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let overrides = AppConfigOverrides {
        log_level: args.log_level,
        api_base_url: args.api_base_url,
        debug_console: args.debug_console,
        ..Default::default()
    };
    let cfg = AppConfig::load_from(args.config.clone()).apply_overrides(&overrides);
    let _guard = logging::init(&cfg)?;

    println!("🚀 Starting Cloud Sorter");
    println!("📁 Cache directory: {:?}", cfg.cache_path);
    println!("🔗 Backend: {}", cfg.api_base_url);

    let client = match ApiClient::new(&cfg.api_base_url) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("❌ {}", e);
            eprintln!("💡 Set api_base_url in {:?} or CLOUDSORTER_API_BASE_URL.", AppConfig::default_path());
            return Err(e.into());
        }
    };
    let backend: Arc<dyn GalleryBackend> = Arc::new(client);

    let flags = ui::UiFlags {
        backend,
        api_base_url: cfg.api_base_url.clone(),
        scan_settings: ScanSettings {
            poll_interval: cfg.poll_interval(),
            scan_timeout: cfg.scan_timeout(),
            max_consecutive_failures: cfg.max_poll_failures,
        },
        preload: cfg.thumbnails_preload,
        preload_threads: cfg.preload_threads,
        cache_dir: cfg.cache_path.clone(),
        player: ui::video::default_player,
    };
    tracing::info!(base_url = %cfg.api_base_url, "Launching UI");
    ui::run(flags)?;
    Ok(())
}
