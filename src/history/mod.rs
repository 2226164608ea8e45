mod types;

pub use types::{DayPeriod, PatternReport, PeriodBreakdown, PeriodCounts};

use chrono::{DateTime, Local, Timelike};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::models::{ActivityLabel, Sample};

pub const DEFAULT_CAPACITY: usize = 100;

/// Returned when there is nothing to compute a ratio from. Distinct from a
/// measured 50/50 split only by the caller knowing the history was empty.
pub const NEUTRAL_RATIO: f64 = 0.5;

/// Bounded, time-ordered record of classified samples.
///
/// `error` samples are kept (they are real cycles) but never enter a ratio:
/// they are neither productive nor distracting. `unknown` samples count as
/// not productive.
pub struct ActivityHistory {
    capacity: usize,
    samples: Mutex<VecDeque<Sample>>,
}

impl Default for ActivityHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ActivityHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Sample>> {
        match self.samples.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Append `sample` and return it as stored. A timestamp older than the
    /// newest retained sample is moved forward to it.
    pub fn record(&self, mut sample: Sample) -> Sample {
        let mut samples = self.lock();

        // Wall-clock can step backwards (NTP, DST); keep the order invariant.
        if let Some(newest) = samples.back() {
            if sample.timestamp < newest.timestamp {
                sample.timestamp = newest.timestamp;
            }
        }

        samples.push_back(sample.clone());
        while samples.len() > self.capacity {
            samples.pop_front();
        }
        sample
    }

    /// Most recent `count` samples, oldest first.
    pub fn recent(&self, count: usize) -> Vec<Sample> {
        let samples = self.lock();
        let skip = samples.len().saturating_sub(count);
        samples.iter().skip(skip).cloned().collect()
    }

    pub fn productivity_ratio(&self, window: Duration) -> f64 {
        self.productivity_ratio_at(window, Local::now())
    }

    pub fn productivity_ratio_at(&self, window: Duration, now: DateTime<Local>) -> f64 {
        let cutoff = chrono::Duration::from_std(window)
            .ok()
            .and_then(|window| now.checked_sub_signed(window));

        let samples = self.lock();
        let mut productive = 0usize;
        let mut counted = 0usize;
        for sample in samples.iter() {
            if sample.label == ActivityLabel::Error {
                continue;
            }
            if cutoff.is_some_and(|cutoff| sample.timestamp <= cutoff) {
                continue;
            }
            counted += 1;
            if sample.is_productive() {
                productive += 1;
            }
        }

        if counted == 0 {
            return NEUTRAL_RATIO;
        }
        productive as f64 / counted as f64
    }

    pub fn patterns(&self) -> PatternReport {
        let mut buckets = [PeriodCounts::default(); 3];
        let mut sample_count = 0usize;
        let mut productive_total = 0usize;

        for sample in self.lock().iter() {
            let counts = &mut buckets[DayPeriod::from_hour(sample.timestamp.hour()).index()];
            match sample.label {
                ActivityLabel::Error => continue,
                ActivityLabel::Productive => {
                    counts.productive += 1;
                    productive_total += 1;
                }
                ActivityLabel::Distracting | ActivityLabel::Unknown => counts.distracting += 1,
            }
            sample_count += 1;
        }

        let mut most = DayPeriod::Morning;
        let mut least = DayPeriod::Morning;
        for period in DayPeriod::ALL {
            let ratio = buckets[period.index()].ratio();
            if ratio > buckets[most.index()].ratio() {
                most = period;
            }
            if ratio < buckets[least.index()].ratio() {
                least = period;
            }
        }

        let overall_productivity = if sample_count == 0 {
            NEUTRAL_RATIO
        } else {
            productive_total as f64 / sample_count as f64
        };

        PatternReport {
            sample_count,
            overall_productivity,
            most_productive_period: most,
            least_productive_period: least,
            periods: DayPeriod::ALL
                .iter()
                .map(|period| {
                    let counts = buckets[period.index()];
                    PeriodBreakdown {
                        period: *period,
                        counts,
                        ratio: counts.ratio(),
                    }
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn local(hour: u32, minute: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2026, 3, 10, hour, minute, 0)
            .earliest()
            .unwrap()
    }

    fn sample_at(ts: DateTime<Local>, label: ActivityLabel) -> Sample {
        Sample::at(ts, label, "test", 0.8, "")
    }

    #[test]
    fn evicts_oldest_beyond_capacity() {
        let history = ActivityHistory::new(5);
        let base = local(9, 0);
        for i in 0..12 {
            let mut sample = sample_at(base + chrono::Duration::minutes(i), ActivityLabel::Productive);
            sample.description = format!("sample {i}");
            history.record(sample);
        }

        assert_eq!(history.len(), 5);
        let kept: Vec<String> = history.recent(100).into_iter().map(|s| s.description).collect();
        assert_eq!(kept, vec!["sample 7", "sample 8", "sample 9", "sample 10", "sample 11"]);
    }

    #[test]
    fn neutral_ratio_when_empty_or_outside_window() {
        let history = ActivityHistory::default();
        assert_eq!(history.productivity_ratio(Duration::from_secs(3600)), 0.5);

        let now = local(15, 0);
        history.record(sample_at(local(9, 0), ActivityLabel::Productive));
        assert_eq!(
            history.productivity_ratio_at(Duration::from_secs(3600), now),
            0.5
        );
    }

    #[test]
    fn three_of_four_productive_is_three_quarters() {
        let history = ActivityHistory::default();
        let now = local(10, 0);
        history.record(sample_at(local(9, 50), ActivityLabel::Productive));
        history.record(sample_at(local(9, 52), ActivityLabel::Distracting));
        history.record(sample_at(local(9, 54), ActivityLabel::Productive));
        history.record(sample_at(local(9, 56), ActivityLabel::Productive));

        assert_eq!(history.productivity_ratio_at(Duration::from_secs(3600), now), 0.75);
    }

    #[test]
    fn ratio_only_counts_samples_inside_window() {
        let history = ActivityHistory::default();
        let now = local(12, 0);
        history.record(sample_at(local(10, 0), ActivityLabel::Distracting));
        history.record(sample_at(local(11, 45), ActivityLabel::Productive));

        assert_eq!(history.productivity_ratio_at(Duration::from_secs(1800), now), 1.0);
        assert_eq!(history.productivity_ratio_at(Duration::from_secs(4 * 3600), now), 0.5);
    }

    #[test]
    fn error_samples_stay_out_of_the_ratio() {
        let history = ActivityHistory::default();
        let now = local(10, 0);
        history.record(sample_at(local(9, 58), ActivityLabel::Error));
        assert_eq!(history.productivity_ratio_at(Duration::from_secs(600), now), 0.5);

        history.record(sample_at(local(9, 59), ActivityLabel::Productive));
        history.record(sample_at(local(9, 59), ActivityLabel::Unknown));
        assert_eq!(history.productivity_ratio_at(Duration::from_secs(600), now), 0.5);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn backwards_timestamps_are_clamped() {
        let history = ActivityHistory::default();
        history.record(sample_at(local(10, 0), ActivityLabel::Productive));
        let stored = history.record(sample_at(local(9, 0), ActivityLabel::Productive));

        let samples = history.recent(2);
        assert!(samples[0].timestamp <= samples[1].timestamp);
        // The caller gets the clamped copy, so other stores can match it.
        assert_eq!(stored.timestamp, local(10, 0));
        assert_eq!(stored.id, samples[1].id);
    }

    #[test]
    fn patterns_bucket_by_local_hour() {
        let history = ActivityHistory::default();
        history.record(sample_at(local(2, 0), ActivityLabel::Distracting));
        history.record(sample_at(local(6, 0), ActivityLabel::Productive));
        history.record(sample_at(local(7, 0), ActivityLabel::Productive));
        history.record(sample_at(local(13, 0), ActivityLabel::Productive));
        history.record(sample_at(local(14, 0), ActivityLabel::Distracting));
        history.record(sample_at(local(20, 0), ActivityLabel::Distracting));

        let report = history.patterns();
        assert_eq!(report.sample_count, 6);
        assert_eq!(report.most_productive_period, DayPeriod::Morning);
        assert_eq!(report.least_productive_period, DayPeriod::Evening);
        assert_eq!(report.periods[1].counts, PeriodCounts { productive: 1, distracting: 1 });
        assert_eq!(report.periods[2].counts.distracting, 2);
        assert_eq!(report.overall_productivity, 0.5);
    }

    #[test]
    fn pattern_ties_resolve_to_earliest_period() {
        let history = ActivityHistory::default();
        let report = history.patterns();
        assert_eq!(report.most_productive_period, DayPeriod::Morning);
        assert_eq!(report.least_productive_period, DayPeriod::Morning);
        assert!(report.periods.iter().all(|p| p.ratio == 0.0));

        history.record(sample_at(local(13, 0), ActivityLabel::Productive));
        history.record(sample_at(local(19, 0), ActivityLabel::Productive));
        let report = history.patterns();
        assert_eq!(report.most_productive_period, DayPeriod::Afternoon);
        assert_eq!(report.least_productive_period, DayPeriod::Morning);
    }
}
