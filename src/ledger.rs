use chrono::NaiveDate;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

pub const GOAL: u64 = 100;

/// Floors `value` and clamps it at zero. NaN counts as zero.
pub fn clamp_count(value: f64) -> u64 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    // float-to-int `as` saturates at u64::MAX
    value.floor() as u64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountChange {
    pub date: NaiveDate,
    pub previous: u64,
    pub current: u64,
}

impl CountChange {
    pub fn crossed_goal(&self) -> bool {
        self.previous < GOAL && self.current >= GOAL
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DailyLog {
    counts: BTreeMap<NaiveDate, u64>,
}

impl DailyLog {
    /// Rebuilds a log from a persisted document, skipping anything unusable.
    pub fn from_value(value: Option<Value>) -> Self {
        let mut log = Self::default();
        let entries = match value {
            None | Some(Value::Null) => return log,
            Some(Value::Object(entries)) => entries,
            Some(other) => {
                warn!("ignoring daily log document of unexpected shape: {other}");
                return log;
            }
        };

        for (key, raw) in entries {
            let Ok(date) = NaiveDate::parse_from_str(&key, "%Y-%m-%d") else {
                warn!("dropping daily log entry with invalid date {key:?}");
                continue;
            };
            let Some(number) = raw.as_f64() else {
                warn!("dropping non-numeric daily log entry for {key}: {raw}");
                continue;
            };
            let count = clamp_count(number);
            if count > 0 {
                log.counts.insert(date, count);
            }
        }
        log
    }

    pub fn to_value(&self) -> Value {
        let entries = self
            .counts
            .iter()
            .map(|(date, count)| (date.format("%Y-%m-%d").to_string(), Value::from(*count)))
            .collect();
        Value::Object(entries)
    }

    pub fn get_count(&self, date: NaiveDate) -> u64 {
        self.counts.get(&date).copied().unwrap_or(0)
    }

    pub fn set_count(&mut self, date: NaiveDate, value: f64) -> CountChange {
        let previous = self.get_count(date);
        let current = clamp_count(value);
        if current == 0 {
            self.counts.remove(&date);
        } else {
            self.counts.insert(date, current);
        }
        CountChange {
            date,
            previous,
            current,
        }
    }

    pub fn add_count(&mut self, date: NaiveDate, delta: f64) -> CountChange {
        let current = self.get_count(date) as f64;
        self.set_count(date, current + delta)
    }

    /// Consecutive days at or above the goal, walking back from `today`.
    ///
    /// `today` adds one when it already meets the goal; an unfinished today
    /// does not break a run that ended yesterday.
    pub fn streak(&self, today: NaiveDate) -> u32 {
        let mut streak = 0;
        if self.get_count(today) >= GOAL {
            streak += 1;
        }

        let mut cursor = today.pred_opt();
        while let Some(date) = cursor {
            if self.get_count(date) < GOAL {
                break;
            }
            streak += 1;
            cursor = date.pred_opt();
        }
        streak
    }

    pub fn total(&self) -> u64 {
        self.counts
            .values()
            .fold(0u64, |acc, count| acc.saturating_add(*count))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
