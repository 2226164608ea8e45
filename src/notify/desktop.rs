use std::sync::Arc;
use tokio::process::Command;

use crate::models::NotificationCategory;

use super::sink::NotificationSink;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

pub const NOTIFICATION_TITLE: &str = "Snitch Productivity Monitor";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesktopPlatform {
    MacOs,
    FreeDesktop,
}

impl DesktopPlatform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::FreeDesktop
        }
    }
}

/// Program and arguments that show one desktop notification.
pub fn notification_command(
    platform: DesktopPlatform,
    title: &str,
    body: &str,
) -> (&'static str, Vec<String>) {
    match platform {
        DesktopPlatform::MacOs => (
            "osascript",
            vec![
                "-e".to_string(),
                format!(
                    "display notification \"{}\" with title \"{}\" sound name \"Ping\"",
                    applescript_escape(body),
                    applescript_escape(title)
                ),
            ],
        ),
        DesktopPlatform::FreeDesktop => (
            "notify-send",
            vec![
                "--app-name=snitch".to_string(),
                "--".to_string(),
                title.to_string(),
                body.to_string(),
            ],
        ),
    }
}

fn applescript_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' | '\r' => escaped.push(' '),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Pops an OS notification for every nudge and forwards all events to
/// `inner`. The notifier process runs in the background; failures are
/// logged and otherwise ignored.
pub struct DesktopSink {
    platform: DesktopPlatform,
    inner: Arc<dyn NotificationSink>,
}

impl DesktopSink {
    pub fn new(inner: Arc<dyn NotificationSink>) -> Self {
        Self {
            platform: DesktopPlatform::current(),
            inner,
        }
    }

    fn show(&self, body: &str) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            log_debug!("no runtime; skipping desktop notification");
            return;
        };

        let (program, args) = notification_command(self.platform, NOTIFICATION_TITLE, body);
        runtime.spawn(async move {
            match Command::new(program).args(&args).output().await {
                Ok(output) if output.status.success() => {}
                Ok(output) => log_warn!(
                    "{program} exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
                Err(err) => log_warn!("failed to run {program}: {err}"),
            }
        });
    }
}

impl NotificationSink for DesktopSink {
    fn on_notification(&self, message: &str, category: NotificationCategory) {
        self.inner.on_notification(message, category);
        self.show(message);
    }

    fn on_status(&self, text: &str) {
        self.inner.on_status(text);
    }

    fn on_activity(&self, text: &str) {
        self.inner.on_activity(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingSink;

    #[test]
    fn macos_command_escapes_quotes_and_backslashes() {
        let (program, args) = notification_command(
            DesktopPlatform::MacOs,
            NOTIFICATION_TITLE,
            "Stop \"researching\" C:\\games\nnow",
        );
        assert_eq!(program, "osascript");
        assert_eq!(args[0], "-e");
        assert_eq!(
            args[1],
            "display notification \"Stop \\\"researching\\\" C:\\\\games now\" \
             with title \"Snitch Productivity Monitor\" sound name \"Ping\""
        );
    }

    #[test]
    fn freedesktop_command_passes_text_verbatim() {
        let (program, args) = notification_command(
            DesktopPlatform::FreeDesktop,
            "Snitch",
            "--urgency=critical \"quoted\"",
        );
        assert_eq!(program, "notify-send");
        assert_eq!(
            args,
            vec!["--app-name=snitch", "--", "Snitch", "--urgency=critical \"quoted\""]
        );
    }

    #[test]
    fn forwards_every_event_without_a_runtime() {
        let inner = Arc::new(RecordingSink::default());
        let sink = DesktopSink::new(inner.clone());

        sink.on_status("Currently working on: thesis");
        sink.on_notification("Back to the thesis", NotificationCategory::Distracted);
        sink.on_activity("distracting: video site");

        assert_eq!(inner.notification_count(), 1);
        assert_eq!(inner.statuses.lock().unwrap().len(), 1);
        assert_eq!(inner.activities.lock().unwrap().len(), 1);
    }
}
