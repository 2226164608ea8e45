use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{ActivityLabel, Sample};

/// A persisted sample plus the task that was active when it was taken.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogEntry {
    pub sample: Sample,
    pub task: Option<String>,
}

/// Per-label sample counts for one local calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub day: NaiveDate,
    pub productive: usize,
    pub distracting: usize,
    pub unknown: usize,
    pub errors: usize,
}

impl DailySummary {
    pub fn empty(day: NaiveDate) -> Self {
        Self {
            day,
            productive: 0,
            distracting: 0,
            unknown: 0,
            errors: 0,
        }
    }

    pub fn count(&mut self, label: ActivityLabel) {
        self.add(label, 1);
    }

    pub fn add(&mut self, label: ActivityLabel, n: usize) {
        match label {
            ActivityLabel::Productive => self.productive += n,
            ActivityLabel::Distracting => self.distracting += n,
            ActivityLabel::Unknown => self.unknown += n,
            ActivityLabel::Error => self.errors += n,
        }
    }

    pub fn total(&self) -> usize {
        self.productive + self.distracting + self.unknown + self.errors
    }

    /// Productive share of classified samples; `error` rows are excluded.
    /// `None` when nothing was classified.
    pub fn productivity(&self) -> Option<f64> {
        let classified = self.productive + self.distracting + self.unknown;
        (classified > 0).then(|| self.productive as f64 / classified as f64)
    }
}
