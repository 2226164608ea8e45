use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::classifier::Classifier;
use crate::db::ActivityLog;
use crate::error::{Result, SnitchError};
use crate::history::ActivityHistory;
use crate::models::{NotificationCategory, NotificationContext, TaskTracker};
use crate::notify::{Escalator, NotificationSink, Notifier};

use super::capture::{archive_screenshot, Capturer};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

// Import the logging macros (exported at crate root)
use crate::{log_debug, log_error, log_info, log_warn};

const CAPTURE_TIMEOUT_SECS: u64 = 10;

/// Everything one sampling cycle touches.
pub struct LoopComponents {
    pub capturer: Arc<dyn Capturer>,
    pub classifier: Arc<Classifier>,
    pub history: Arc<ActivityHistory>,
    pub notifier: Arc<Notifier>,
    pub escalator: Arc<Escalator>,
    pub activity_log: Arc<dyn ActivityLog>,
    pub tasks: Arc<TaskTracker>,
    pub sink: Arc<dyn NotificationSink>,
}

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub monitoring_interval: Duration,
    pub notification_interval: Duration,
    /// Archive every capture here when set.
    pub screenshot_dir: Option<PathBuf>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            monitoring_interval: Duration::from_secs(5),
            notification_interval: Duration::from_secs(15),
            screenshot_dir: None,
        }
    }
}

/// When the last distraction notification fired. Owned by the scheduler so
/// the interval holds across loop restarts.
#[derive(Debug, Clone, Default)]
pub struct NotifyGate(Arc<StdMutex<Option<Instant>>>);

impl NotifyGate {
    fn last(&self) -> Option<Instant> {
        match self.0.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn is_due(&self, interval: Duration) -> bool {
        self.last().map_or(true, |at| at.elapsed() >= interval)
    }

    fn mark(&self) {
        match self.0.lock() {
            Ok(mut guard) => *guard = Some(Instant::now()),
            Err(poisoned) => *poisoned.into_inner() = Some(Instant::now()),
        }
    }
}

pub async fn sensing_loop(
    components: Arc<LoopComponents>,
    config: LoopConfig,
    last_notified: NotifyGate,
    cancel_token: CancellationToken,
) {
    if components.classifier.ensure_started().await {
        log_info!("classification service ready");
    } else {
        log_warn!("classification service unavailable; samples will be recorded as errors");
    }

    loop {
        if cancel_token.is_cancelled() {
            break;
        }

        if let Err(err) = run_cycle(&components, &config, &last_notified).await {
            log_error!("sampling cycle failed: {err}");
        }

        tokio::select! {
            _ = tokio::time::sleep(config.monitoring_interval) => {}
            _ = cancel_token.cancelled() => break,
        }
    }

    log_info!("sampling loop shutting down");
}

async fn run_cycle(
    components: &LoopComponents,
    config: &LoopConfig,
    last_notified: &NotifyGate,
) -> Result<()> {
    let cycle_start = Instant::now();

    let image = match tokio::time::timeout(
        Duration::from_secs(CAPTURE_TIMEOUT_SECS),
        components.capturer.capture(),
    )
    .await
    {
        Ok(result) => result?,
        Err(_) => {
            return Err(SnitchError::CaptureUnavailable(format!(
                "capture timed out after {CAPTURE_TIMEOUT_SECS}s"
            )))
        }
    };

    if let Some(dir) = &config.screenshot_dir {
        if let Err(err) = archive_screenshot(dir, &image).await {
            log_warn!("failed to archive screenshot: {err:#}");
        }
    }

    let sample = components.classifier.classify(&image).await;
    let task = components.tasks.current_task();

    // History may move the timestamp forward; persist what it kept.
    let sample = components.history.record(sample);
    if let Err(err) = components.activity_log.append(&sample, task.as_deref()).await {
        log_warn!("activity log write failed: {err}");
    }

    // Reset only when a distraction notification actually fires.
    if !sample.is_productive() && last_notified.is_due(config.notification_interval) {
        let context = NotificationContext::new(task, sample.description.clone());
        if components
            .notifier
            .notify(NotificationCategory::Distracted, context.clone())
            .await
        {
            last_notified.mark();
            if components.escalator.maybe_escalate(&context).await {
                log_info!("accountability alert delivered");
            }
        }
    }

    components
        .sink
        .on_activity(&format!("{}: {}", sample.label, sample.description));

    log_debug!(
        "cycle finished in {}ms ({})",
        cycle_start.elapsed().as_millis(),
        sample.label
    );
    Ok(())
}
