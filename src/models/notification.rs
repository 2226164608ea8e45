use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Selects message wording and an independent rate-limit bucket.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NotificationCategory {
    Distracted,
    Productive,
    Reminder,
}

impl NotificationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::Distracted => "distracted",
            NotificationCategory::Productive => "productive",
            NotificationCategory::Reminder => "reminder",
        }
    }
}

impl std::fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationContext {
    pub task: Option<String>,
    pub activity: String,
}

impl NotificationContext {
    pub fn new(task: Option<String>, activity: impl Into<String>) -> Self {
        Self {
            task,
            activity: activity.into(),
        }
    }

    pub fn task_or_default(&self) -> &str {
        self.task.as_deref().unwrap_or("your task")
    }

    pub fn activity_or_default(&self) -> &str {
        if self.activity.trim().is_empty() {
            "something"
        } else {
            &self.activity
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Local>,
    pub category: NotificationCategory,
    pub message: String,
    pub context: NotificationContext,
}
