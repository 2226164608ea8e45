mod app;
mod classifier;
mod db;
mod error;
mod history;
mod models;
mod notify;
mod sensing;
mod settings;
mod utils;

#[cfg(test)]
mod testing;

pub use crate::app::{CoreServices, CoreStatus, SnitchCore};
pub use crate::classifier::{Classifier, OllamaClient, VisionService};
pub use crate::db::{ActivityLog, ActivityLogEntry, DailySummary, Database};
pub use crate::error::{Result, SnitchError};
pub use crate::history::{ActivityHistory, DayPeriod, PatternReport};
pub use crate::models::{
    ActivityLabel, Buddy, NotificationCategory, NotificationContext, NotificationRecord, Sample,
    TaskEntry,
};
pub use crate::notify::{
    ChannelSink, CoreEvent, DesktopSink, Escalator, LogSink, MessageGateway, NotificationSink,
    Notifier, TwilioGateway, UnconfiguredGateway,
};
pub use crate::sensing::{Capturer, CommandCapturer, ImageSample, Scheduler};
pub use crate::settings::{AppSettings, SettingsStore};

use anyhow::{Context, Result as AnyResult};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;

const DATA_DIR_ENV: &str = "SNITCH_DATA_DIR";
const DEBUG_ENV: &str = "SNITCH_DEBUG";

/// `SNITCH_DATA_DIR`, else `~/.snitch`.
pub fn data_dir() -> AnyResult<PathBuf> {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|dir| !dir.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".snitch"))
        .context("could not determine home directory; set SNITCH_DATA_DIR")
}

/// Headless entry point: monitor until Ctrl-C.
pub async fn run() -> AnyResult<()> {
    let level = if std::env::var_os(DEBUG_ENV).is_some() {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    // Initialize logging (RUST_LOG still overrides per module)
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .parse_default_env()
        .init();

    info!("snitch starting up...");

    let data_dir = data_dir()?;
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    let settings = Arc::new(SettingsStore::new(data_dir.join("settings.json"))?);
    let database = Database::new(data_dir.join("snitch.sqlite3"))?;
    let snapshot = settings.snapshot();

    let vision = OllamaClient::new(&snapshot.ollama_url, &snapshot.ollama_model)?;
    let gateway: Arc<dyn MessageGateway> = match TwilioGateway::from_env()? {
        Some(gateway) => Arc::new(gateway),
        None => {
            if snapshot.snitch_mode_enabled {
                warn!("snitch mode is on but Twilio is not configured; alerts will fail");
            }
            Arc::new(UnconfiguredGateway)
        }
    };

    let services = CoreServices {
        capturer: Arc::new(CommandCapturer::platform_default(
            data_dir.join("capture.png"),
        )),
        vision: Arc::new(vision),
        gateway,
        activity_log: Arc::new(database),
        sink: Arc::new(DesktopSink::new(Arc::new(LogSink))),
    };
    let core = SnitchCore::new(settings, services, data_dir.join("screenshots"));

    let task = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if task.trim().is_empty() {
        info!("no task given; pass one as arguments, e.g. `snitch write the report`");
    } else {
        core.set_task(&task);
    }

    core.start_monitoring().await;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("Ctrl-C received, stopping");

    core.stop_monitoring().await;

    match core.daily_summary().await {
        Ok(summary) => {
            let productivity = summary
                .productivity()
                .map(|ratio| format!("{:.0}%", ratio * 100.0))
                .unwrap_or_else(|| "n/a".to_string());
            info!(
                "today: {} productive, {} distracting, {} unknown, {} errors ({productivity} productive)",
                summary.productive, summary.distracting, summary.unknown, summary.errors
            );
        }
        Err(err) => warn!("could not summarize today's activity: {err}"),
    }

    Ok(())
}
