use chrono::Local;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

use crate::models::{NotificationCategory, NotificationContext, NotificationRecord};

use super::messages::MessageGenerator;
use super::sink::NotificationSink;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(6);
pub const MAX_RECORDS: usize = 500;

struct NotifierState {
    min_interval: Duration,
    last_fired: HashMap<NotificationCategory, Instant>,
    records: VecDeque<NotificationRecord>,
}

/// Rate-limited user notifications, one cooldown bucket per category.
pub struct Notifier {
    state: Mutex<NotifierState>,
    messages: MessageGenerator,
    sink: Arc<dyn NotificationSink>,
}

impl Notifier {
    pub fn new(messages: MessageGenerator, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            state: Mutex::new(NotifierState {
                min_interval: DEFAULT_MIN_INTERVAL,
                last_fired: HashMap::new(),
                records: VecDeque::new(),
            }),
            messages,
            sink,
        }
    }

    pub async fn set_min_interval(&self, interval: Duration) {
        self.state.lock().await.min_interval = interval;
    }

    pub async fn min_interval(&self) -> Duration {
        self.state.lock().await.min_interval
    }

    /// Fire a notification unless `category` fired within the minimum
    /// interval. Returns whether it fired. Suppression is silent.
    pub async fn notify(&self, category: NotificationCategory, context: NotificationContext) -> bool {
        // Claim the cooldown slot; the lock is not held during generation.
        {
            let mut state = self.state.lock().await;
            if let Some(last) = state.last_fired.get(&category) {
                if last.elapsed() < state.min_interval {
                    log_debug!("{category} notification suppressed by cooldown");
                    return false;
                }
            }
            state.last_fired.insert(category, Instant::now());
        }

        let message = self.messages.generate(category, &context).await;

        {
            let mut state = self.state.lock().await;
            state.records.push_back(NotificationRecord {
                id: Uuid::new_v4(),
                timestamp: Local::now(),
                category,
                message: message.clone(),
                context,
            });
            while state.records.len() > MAX_RECORDS {
                state.records.pop_front();
            }
        }

        log_info!("{category} notification: {message}");
        self.sink.on_notification(&message, category);
        true
    }

    /// Fired notifications, oldest first.
    pub async fn history(&self) -> Vec<NotificationRecord> {
        self.state.lock().await.records.iter().cloned().collect()
    }
}
