mod app;
mod cli;
mod data;
mod error;
mod report;
mod resolver;
mod tasks;
mod tui;
mod viewport;

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use crate::app::{AppState, Settings};
use crate::cli::Args;
use crate::data::{default_cache_dir, DataService, DataSources, DownloadCache};
use crate::error::{CircuitMapError, Result};
use crate::resolver::Dataset;
use crate::tasks::{Channels, Loader, LoaderEvent};
use crate::tui::TuiApp;

const LOG_FILE: &str = "circuitmap.log";

/// Where log lines go; never the terminal the TUI is drawing on
enum LogTarget {
    Stderr,
    File(File),
    Off,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let cache_dir = args.cache_dir.clone().unwrap_or_else(default_cache_dir);

    // Initialize tracing (to file if TUI is enabled)
    let log_target = if args.is_one_shot() {
        LogTarget::Stderr
    } else {
        match open_log_file(&cache_dir) {
            Ok(file) => LogTarget::File(file),
            Err(e) => {
                // Stderr is still the plain terminal here; the TUI has not started
                eprintln!(
                    "circuitmap: logging disabled, cannot open {}: {}",
                    cache_dir.join(LOG_FILE).display(),
                    e
                );
                LogTarget::Off
            }
        }
    };
    init_tracing(args.verbose, log_target);

    info!("circuitmap v{} starting", env!("CARGO_PKG_VERSION"));

    if args.timeout_secs == 0 {
        return Err(CircuitMapError::Config("--timeout-secs must be at least 1".into()));
    }

    let sources = DataSources::new(&args.data, &args.country_names)?;
    let cache = (!args.no_cache).then(|| DownloadCache::new(Some(cache_dir)));
    let data = DataService::new(sources, Duration::from_secs(args.timeout_secs), cache)?;
    let settings = Settings::from_args(&args);

    let outcome = match args.region.as_deref() {
        Some(region) => run_once(data, settings, region, args.json).await,
        None => run(data, settings).await,
    };

    // Run the application
    if let Err(e) = outcome {
        error!("Application error: {}", e);
        return Err(e);
    }

    info!("circuitmap shutdown complete");
    Ok(())
}

/// Append-mode log file inside `dir`, creating the directory if needed
fn open_log_file(dir: &Path) -> std::io::Result<File> {
    std::fs::create_dir_all(dir)?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE))
}

/// Initialize tracing subscriber
fn init_tracing(verbose: bool, target: LogTarget) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .compact();

    match target {
        LogTarget::Stderr => builder.with_writer(std::io::stderr).init(),
        LogTarget::File(file) => builder.with_writer(Mutex::new(file)).with_ansi(false).init(),
        LogTarget::Off => builder.with_writer(std::io::sink).init(),
    }
}

/// Load once, resolve a single region, print it
async fn run_once(data: DataService, settings: Settings, region: &str, json: bool) -> Result<()> {
    info!(region, year = settings.current_year, "Resolving region");

    let dataset = Dataset::new(data.load().await?);
    let info = dataset.resolve_region(region, settings.current_year, settings.winner_rule);

    if json {
        println!("{}", serde_json::to_string_pretty(&report::to_json(&info))?);
    } else {
        print!("{}", report::to_text(&info));
    }

    Ok(())
}

/// Main application loop
async fn run(data: DataService, settings: Settings) -> Result<()> {
    info!(
        year = settings.current_year,
        winner_rule = ?settings.winner_rule,
        hosts_only = settings.hosts_only,
        "Starting session"
    );

    let state = AppState::new(settings);

    // Set up graceful shutdown
    let shutdown_state = Arc::clone(&state);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            return;
        }
        info!("Received Ctrl-C, shutting down...");
        shutdown_state.quit();
    });

    // Set up channels for task communication
    let (cmd_tx, cmd_rx, event_tx, mut event_rx) = Channels::new().split();

    // Start loader task
    let loader = Loader::new(data, Arc::clone(&state), cmd_rx, event_tx);
    tokio::spawn(async move {
        loader.run().await;
    });

    // Initialize TUI
    let mut tui = TuiApp::new(Arc::clone(&state), cmd_tx)?;

    info!("TUI started - press 'q' to quit");

    // Main event loop
    loop {
        // Handle TUI input
        let should_quit = tui.handle_input().await?;
        if should_quit || state.is_quitting() {
            break;
        }

        // Process loader events
        while let Ok(event) = event_rx.try_recv() {
            match event {
                LoaderEvent::Loading => tui.set_loading(),
                LoaderEvent::Ready(dataset) => tui.set_dataset(dataset).await,
                LoaderEvent::Error {
                    message,
                    recoverable,
                } => tui.set_error(message, recoverable),
                LoaderEvent::Shutdown => {
                    info!("Loader shutdown");
                    break;
                }
            }
        }

        // Draw TUI
        let settings = state.settings.read().await.clone();
        tui.draw(&settings)?;

        // Small delay to prevent busy loop
        tokio::time::sleep(Duration::from_millis(16)).await; // ~60 FPS
    }

    // Clean shutdown
    tui.cleanup();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_created_in_cache_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().join("nested");

        open_log_file(&cache_dir).unwrap();
        assert!(cache_dir.join(LOG_FILE).is_file());
    }

    #[test]
    fn test_log_file_error_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        assert!(open_log_file(&blocker).is_err());
    }
}
