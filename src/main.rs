mod config;
mod control;
mod telemetry;
mod ui;

use anyhow::Context;
use env_logger::Builder;
use log::{LevelFilter, info};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::control::{BackendClient, TelemetryBackend};
use crate::telemetry::{Clock, SystemClock};
use crate::ui::{AppState, UIRefreshQueue};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

fn main() -> anyhow::Result<()> {
    // Logging setup
    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter(Some("cpeodesic"), LevelFilter::Debug)
        .parse_default_env()
        .init();

    info!("Starting up");

    let config_path = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = AppConfig::load_or_default(&config_path)?;
    info!("Loaded {} device(s) from {}", config.devices.len(), config_path.display());

    let client = BackendClient::new(&config.base_url, config.timeout()).context("Failed to build backend client")?;
    info!("Backend client ready for {} (timeout {:?})", client.base_url(), config.timeout());
    let backend: Arc<dyn TelemetryBackend> = Arc::new(client);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());

    let ui_refresh_queue: &'static UIRefreshQueue = Box::leak(Box::new(UIRefreshQueue::new()));
    let ui_refresh_tx = ui_refresh_queue.sender();
    let ui_refresh_rx = ui_refresh_queue.receiver();

    // Start the GUI on the main thread (required on macOS)
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1000.0, 760.0]).with_title("CPEodesic"),
        ..Default::default()
    };
    eframe::run_native(
        "CPEodesic",
        native_options,
        Box::new(move |cc| Ok(Box::new(AppState::new(&config, backend, clock, ui_refresh_tx, ui_refresh_rx, cc.storage)))),
    )
    .map_err(|e| anyhow::anyhow!("GUI exited with error: {}", e))
}
