use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLabel {
    Productive,
    Distracting,
    Unknown,
    Error,
}

impl ActivityLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLabel::Productive => "productive",
            ActivityLabel::Distracting => "distracting",
            ActivityLabel::Unknown => "unknown",
            ActivityLabel::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "productive" => Some(ActivityLabel::Productive),
            "distracting" => Some(ActivityLabel::Distracting),
            "unknown" => Some(ActivityLabel::Unknown),
            "error" => Some(ActivityLabel::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActivityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classification of one screen capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    pub id: Uuid,
    /// Local wall-clock time; the time-of-day patterns bucket on its hour.
    pub timestamp: DateTime<Local>,
    pub label: ActivityLabel,
    pub description: String,
    /// Advisory only, see `classifier::CLASSIFIED_CONFIDENCE`.
    pub confidence: f64,
    pub reasoning: String,
}

impl Sample {
    pub fn new(
        label: ActivityLabel,
        description: impl Into<String>,
        confidence: f64,
        reasoning: impl Into<String>,
    ) -> Self {
        Self::at(Local::now(), label, description, confidence, reasoning)
    }

    pub fn at(
        timestamp: DateTime<Local>,
        label: ActivityLabel,
        description: impl Into<String>,
        confidence: f64,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            label,
            description: description.into(),
            confidence: confidence.clamp(0.0, 1.0),
            reasoning: reasoning.into(),
        }
    }

    pub fn is_productive(&self) -> bool {
        self.label == ActivityLabel::Productive
    }
}
