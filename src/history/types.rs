use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DayPeriod {
    Morning,
    Afternoon,
    Evening,
}

impl DayPeriod {
    /// Iteration order; ties between periods resolve to the earlier entry.
    pub const ALL: [DayPeriod; 3] = [DayPeriod::Morning, DayPeriod::Afternoon, DayPeriod::Evening];

    /// Morning `[5,12)`, afternoon `[12,18)`, evening everything else.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => DayPeriod::Morning,
            12..=17 => DayPeriod::Afternoon,
            _ => DayPeriod::Evening,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DayPeriod::Morning => "morning",
            DayPeriod::Afternoon => "afternoon",
            DayPeriod::Evening => "evening",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            DayPeriod::Morning => 0,
            DayPeriod::Afternoon => 1,
            DayPeriod::Evening => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeriodCounts {
    pub productive: usize,
    pub distracting: usize,
}

impl PeriodCounts {
    /// Productive share; an empty bucket yields 0.0 rather than NaN.
    pub fn ratio(&self) -> f64 {
        let total = (self.productive + self.distracting).max(1);
        self.productive as f64 / total as f64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PeriodBreakdown {
    pub period: DayPeriod,
    pub counts: PeriodCounts,
    pub ratio: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatternReport {
    /// Samples that contributed to the buckets (error samples excluded).
    pub sample_count: usize,
    pub overall_productivity: f64,
    pub most_productive_period: DayPeriod,
    pub least_productive_period: DayPeriod,
    pub periods: Vec<PeriodBreakdown>,
}
