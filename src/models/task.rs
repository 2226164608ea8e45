use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskEntry {
    pub name: String,
    pub started_at: DateTime<Local>,
    /// `None` only for the active task.
    pub ended_at: Option<DateTime<Local>>,
}

/// The task the user says they are working on, plus every earlier one.
#[derive(Debug, Default)]
pub struct TaskTracker {
    entries: Mutex<Vec<TaskEntry>>,
}

impl TaskTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<TaskEntry>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn set_task(&self, name: impl Into<String>) {
        self.set_task_at(name, Local::now());
    }

    pub fn set_task_at(&self, name: impl Into<String>, now: DateTime<Local>) {
        let mut entries = self.lock();
        if let Some(active) = entries.last_mut().filter(|e| e.ended_at.is_none()) {
            active.ended_at = Some(now);
        }
        entries.push(TaskEntry {
            name: name.into(),
            started_at: now,
            ended_at: None,
        });
    }

    pub fn current_task(&self) -> Option<String> {
        self.lock()
            .last()
            .filter(|e| e.ended_at.is_none())
            .map(|e| e.name.clone())
    }

    pub fn history(&self) -> Vec<TaskEntry> {
        self.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn new_task_closes_previous_entry() {
        let tracker = TaskTracker::new();
        assert_eq!(tracker.current_task(), None);

        let t0 = Local::now();
        let t1 = t0 + Duration::minutes(25);
        tracker.set_task_at("write report", t0);
        tracker.set_task_at("review PRs", t1);

        assert_eq!(tracker.current_task().as_deref(), Some("review PRs"));
        let history = tracker.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].name, "write report");
        assert_eq!(history[0].ended_at, Some(t1));
        assert_eq!(history[1].ended_at, None);
        assert_eq!(history.iter().filter(|e| e.ended_at.is_none()).count(), 1);
    }
}
