use log::info;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::models::NotificationCategory;

/// Presentation hook. Called synchronously from the notifier and the
/// sampling loop, so implementations must not block.
pub trait NotificationSink: Send + Sync {
    fn on_notification(&self, message: &str, category: NotificationCategory);

    fn on_status(&self, _text: &str) {}

    fn on_activity(&self, _text: &str) {}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CoreEvent {
    Notification {
        message: String,
        category: NotificationCategory,
    },
    Status {
        text: String,
    },
    Activity {
        text: String,
    },
}

/// Forwards every event to an unbounded channel for a UI task to drain.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<CoreEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<CoreEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn emit(&self, event: CoreEvent) {
        // Receiver gone means nobody is watching; dropping the event is fine.
        let _ = self.tx.send(event);
    }
}

impl NotificationSink for ChannelSink {
    fn on_notification(&self, message: &str, category: NotificationCategory) {
        self.emit(CoreEvent::Notification {
            message: message.to_string(),
            category,
        });
    }

    fn on_status(&self, text: &str) {
        self.emit(CoreEvent::Status {
            text: text.to_string(),
        });
    }

    fn on_activity(&self, text: &str) {
        self.emit(CoreEvent::Activity {
            text: text.to_string(),
        });
    }
}

/// Headless sink: writes everything to the log.
pub struct LogSink;

impl NotificationSink for LogSink {
    fn on_notification(&self, message: &str, category: NotificationCategory) {
        info!("[{category}] {message}");
    }

    fn on_status(&self, text: &str) {
        info!("status: {text}");
    }

    fn on_activity(&self, text: &str) {
        info!("activity: {text}");
    }
}
