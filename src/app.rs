use chrono::{Local, NaiveDate, Timelike};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::classifier::{Classifier, VisionService};
use crate::db::{ActivityLog, DailySummary};
use crate::error::{Result, SnitchError};
use crate::history::{ActivityHistory, PatternReport};
use crate::models::{Buddy, NotificationRecord, TaskEntry, TaskTracker};
use crate::notify::{Escalator, MessageGateway, MessageGenerator, NotificationSink, Notifier};
use crate::sensing::{Capturer, LoopComponents, LoopConfig, Scheduler};
use crate::settings::SettingsStore;

const STATUS_RATIO_WINDOW: Duration = Duration::from_secs(60 * 60);
const STATUS_RECENT_NOTIFICATIONS: usize = 5;

/// Production or fake implementations of every external seam.
pub struct CoreServices {
    pub capturer: Arc<dyn Capturer>,
    pub vision: Arc<dyn VisionService>,
    pub gateway: Arc<dyn MessageGateway>,
    pub activity_log: Arc<dyn ActivityLog>,
    pub sink: Arc<dyn NotificationSink>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreStatus {
    pub monitoring: bool,
    pub current_task: Option<String>,
    pub productivity_last_hour: f64,
    pub in_focused_hours: bool,
    pub snitch_mode_enabled: bool,
    pub patterns: PatternReport,
    pub recent_notifications: Vec<NotificationRecord>,
}

/// Everything the front end talks to.
pub struct SnitchCore {
    settings: Arc<SettingsStore>,
    tasks: Arc<TaskTracker>,
    history: Arc<ActivityHistory>,
    notifier: Arc<Notifier>,
    escalator: Arc<Escalator>,
    activity_log: Arc<dyn ActivityLog>,
    sink: Arc<dyn NotificationSink>,
    scheduler: Scheduler,
    screenshot_dir: PathBuf,
}

impl SnitchCore {
    pub fn new(settings: Arc<SettingsStore>, services: CoreServices, screenshot_dir: PathBuf) -> Self {
        let tasks = Arc::new(TaskTracker::new());
        let history = Arc::new(ActivityHistory::default());
        let notifier = Arc::new(Notifier::new(
            MessageGenerator::new(Arc::clone(&services.vision)),
            Arc::clone(&services.sink),
        ));
        let escalator = Arc::new(Escalator::new(services.gateway, Arc::clone(&settings)));

        let components = Arc::new(LoopComponents {
            capturer: services.capturer,
            classifier: Arc::new(Classifier::new(services.vision)),
            history: Arc::clone(&history),
            notifier: Arc::clone(&notifier),
            escalator: Arc::clone(&escalator),
            activity_log: Arc::clone(&services.activity_log),
            tasks: Arc::clone(&tasks),
            sink: Arc::clone(&services.sink),
        });

        let core = Self {
            settings,
            tasks,
            history,
            notifier,
            escalator,
            activity_log: services.activity_log,
            sink: services.sink,
            scheduler: Scheduler::new(components, LoopConfig::default()),
            screenshot_dir,
        };
        core.scheduler.set_config(core.loop_config());
        core
    }

    fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            monitoring_interval: self.settings.monitoring_interval(),
            notification_interval: self.settings.notification_interval(),
            screenshot_dir: self
                .settings
                .snapshot()
                .save_screenshots
                .then(|| self.screenshot_dir.clone()),
        }
    }

    pub fn settings(&self) -> &Arc<SettingsStore> {
        &self.settings
    }

    pub fn history(&self) -> &Arc<ActivityHistory> {
        &self.history
    }

    pub fn set_task(&self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        self.tasks.set_task(name);
        self.sink.on_status(&format!("Currently working on: {name}"));
    }

    pub fn current_task(&self) -> Option<String> {
        self.tasks.current_task()
    }

    pub fn task_history(&self) -> Vec<TaskEntry> {
        self.tasks.history()
    }

    pub fn add_productive_app(&self, name: &str) -> Result<bool> {
        self.settings
            .add_productive_app(name)
            .map_err(|err| SnitchError::PersistenceWrite(format!("{err:#}")))
    }

    pub fn add_distracting_app(&self, name: &str) -> Result<bool> {
        self.settings
            .add_distracting_app(name)
            .map_err(|err| SnitchError::PersistenceWrite(format!("{err:#}")))
    }

    pub async fn add_buddy(&self, name: &str, contact: &str) -> Result<()> {
        self.escalator.add_buddy(Buddy::new(name.trim(), contact.trim())).await
    }

    pub async fn remove_buddy(&self, contact: &str) -> Result<Buddy> {
        self.escalator.remove_buddy(contact).await
    }

    pub async fn toggle_buddy(&self, contact: &str) -> Result<bool> {
        self.escalator.toggle_buddy(contact).await
    }

    pub async fn buddies(&self) -> Vec<Buddy> {
        self.escalator.buddies().await
    }

    pub async fn set_snitch_mode(&self, enabled: bool) -> Result<()> {
        self.escalator.set_enabled(enabled).await?;
        let state = if enabled { "enabled" } else { "disabled" };
        self.sink.on_status(&format!("Snitch mode {state}"));
        Ok(())
    }

    /// Picks up the current interval settings, then starts the loop.
    /// Returns false if it was already running.
    pub async fn start_monitoring(&self) -> bool {
        self.scheduler.set_config(self.loop_config());
        let started = self.scheduler.start().await;
        if started {
            self.sink.on_status("Monitoring started");
        }
        started
    }

    pub async fn stop_monitoring(&self) -> bool {
        let stopped = self.scheduler.stop().await;
        if stopped {
            self.sink.on_status("Monitoring stopped");
        }
        stopped
    }

    pub async fn is_monitoring(&self) -> bool {
        self.scheduler.is_running().await
    }

    pub async fn notifications(&self) -> Vec<NotificationRecord> {
        self.notifier.history().await
    }

    pub async fn status(&self) -> CoreStatus {
        let notifications = self.notifier.history().await;
        let skip = notifications.len().saturating_sub(STATUS_RECENT_NOTIFICATIONS);
        let settings = self.settings.snapshot();

        CoreStatus {
            monitoring: self.is_monitoring().await,
            current_task: self.current_task(),
            productivity_last_hour: self.history.productivity_ratio(STATUS_RATIO_WINDOW),
            in_focused_hours: settings.focused_hours.contains(Local::now().hour()),
            snitch_mode_enabled: self.escalator.is_enabled().await,
            patterns: self.history.patterns(),
            recent_notifications: notifications.into_iter().skip(skip).collect(),
        }
    }

    pub async fn daily_summary(&self) -> Result<DailySummary> {
        self.summary_for(Local::now().date_naive()).await
    }

    pub async fn summary_for(&self, day: NaiveDate) -> Result<DailySummary> {
        self.activity_log.daily_summary(day).await
    }
}
