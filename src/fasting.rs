use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

pub const HISTORY_LIMIT: usize = 20;
pub const DEFAULT_GOAL_HOURS: u32 = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FastError {
    #[error("start time cannot be in the future")]
    StartInFuture {
        start: DateTime<Utc>,
        now: DateTime<Utc>,
    },
    #[error("a fast is already in progress since {since}")]
    AlreadyFasting { since: DateTime<Utc> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FastPhase {
    Idle,
    Fasting,
}

impl FastPhase {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "No active fast",
            Self::Fasting => "Fasting",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveFast {
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FastRecord {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(rename = "duration")]
    pub duration_ms: i64,
}

impl FastRecord {
    pub fn duration(&self) -> TimeDelta {
        TimeDelta::milliseconds(self.duration_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FastingState {
    #[serde(default)]
    active_fast: Option<ActiveFast>,
    #[serde(default)]
    history: Vec<FastRecord>,
}

impl FastingState {
    /// Rebuilds state from a persisted document; anything unreadable means idle
    /// with no history.
    pub fn from_value(value: Option<Value>) -> Self {
        let Some(value) = value.filter(|value| !value.is_null()) else {
            return Self::default();
        };
        match serde_json::from_value::<FastingState>(value) {
            Ok(mut state) => {
                state.history.truncate(HISTORY_LIMIT);
                state
            }
            Err(err) => {
                warn!("failed to parse fasting document, starting idle: {err}");
                Self::default()
            }
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn phase(&self) -> FastPhase {
        if self.active_fast.is_some() {
            FastPhase::Fasting
        } else {
            FastPhase::Idle
        }
    }

    pub fn active(&self) -> Option<&ActiveFast> {
        self.active_fast.as_ref()
    }

    pub fn history(&self) -> &[FastRecord] {
        &self.history
    }

    pub fn recent(&self, limit: usize) -> &[FastRecord] {
        &self.history[..self.history.len().min(limit)]
    }

    /// Begins a fast at `start`, which may be backdated but never ahead of `now`.
    pub fn start_fast(&mut self, start: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), FastError> {
        if start > now {
            return Err(FastError::StartInFuture { start, now });
        }
        if let Some(active) = &self.active_fast {
            return Err(FastError::AlreadyFasting {
                since: active.start_time,
            });
        }
        self.active_fast = Some(ActiveFast { start_time: start });
        Ok(())
    }

    /// Closes the active fast into a history record. Idle state is left alone.
    pub fn end_fast(&mut self, now: DateTime<Utc>) -> Option<FastRecord> {
        let active = self.active_fast.take()?;
        let duration = (now - active.start_time).max(TimeDelta::zero());
        let record = FastRecord {
            start_time: active.start_time,
            end_time: now,
            duration_ms: duration.num_milliseconds(),
        };
        self.history.insert(0, record.clone());
        self.history.truncate(HISTORY_LIMIT);
        Some(record)
    }

    pub fn elapsed(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        self.active_fast
            .map(|active| (now - active.start_time).max(TimeDelta::zero()))
    }
}

/// Share of the goal covered by `elapsed`, in `[0, 1]`.
pub fn progress_fraction(elapsed: TimeDelta, goal_hours: u32) -> f64 {
    let goal_ms = f64::from(goal_hours) * 3_600_000.0;
    if goal_ms <= 0.0 {
        return 1.0;
    }
    (elapsed.num_milliseconds() as f64 / goal_ms).clamp(0.0, 1.0)
}

pub fn format_elapsed(elapsed: TimeDelta) -> String {
    let total_seconds = elapsed.num_seconds().max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours}:{minutes:02}:{seconds:02}")
}

pub fn format_duration_short(duration: TimeDelta) -> String {
    let total_minutes = duration.num_minutes().max(0);
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    if hours == 0 {
        format!("{minutes}m")
    } else {
        format!("{hours}h {minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;
    use serde_json::json;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, hour, minute, 0).unwrap()
    }

    #[test]
    fn start_then_end_records_the_duration() {
        let mut state = FastingState::default();
        state.start_fast(at(8, 0), at(8, 0)).unwrap();
        assert_eq!(state.phase(), FastPhase::Fasting);

        let record = state.end_fast(at(20, 30)).expect("record");
        assert_eq!(record.duration(), TimeDelta::minutes(12 * 60 + 30));
        assert_eq!(record.start_time, at(8, 0));
        assert_eq!(record.end_time, at(20, 30));
        assert_eq!(state.phase(), FastPhase::Idle);
        assert_eq!(state.history(), &[record]);
    }

    #[test]
    fn backdated_start_is_accepted() {
        let mut state = FastingState::default();
        state.start_fast(at(6, 0), at(9, 0)).unwrap();
        assert_eq!(state.elapsed(at(9, 0)), Some(TimeDelta::hours(3)));
    }

    #[test]
    fn future_start_is_rejected_without_touching_state() {
        let mut state = FastingState::default();
        let err = state.start_fast(at(9, 1), at(9, 0)).unwrap_err();
        assert!(matches!(err, FastError::StartInFuture { .. }));
        assert_eq!(state, FastingState::default());

        state.start_fast(at(7, 0), at(9, 0)).unwrap();
        let before = state.clone();
        assert!(state.start_fast(at(10, 0), at(9, 0)).is_err());
        assert_eq!(state, before);
    }

    #[test]
    fn second_start_is_rejected_while_fasting() {
        let mut state = FastingState::default();
        state.start_fast(at(7, 0), at(7, 0)).unwrap();
        let err = state.start_fast(at(8, 0), at(8, 0)).unwrap_err();
        assert_eq!(err, FastError::AlreadyFasting { since: at(7, 0) });
        assert_eq!(state.active().unwrap().start_time, at(7, 0));
    }

    #[test]
    fn ending_while_idle_is_a_no_op() {
        let mut state = FastingState::default();
        assert!(state.end_fast(at(12, 0)).is_none());
        assert!(state.history().is_empty());
        assert!(state.elapsed(at(12, 0)).is_none());
    }

    #[test]
    fn history_is_capped_and_newest_first() {
        let mut state = FastingState::default();
        for i in 0..25 {
            let start = at(0, 0) + TimeDelta::days(i);
            state.start_fast(start, start).unwrap();
            state.end_fast(start + TimeDelta::hours(16)).unwrap();
        }
        assert_eq!(state.history().len(), HISTORY_LIMIT);
        assert_eq!(state.history()[0].start_time, at(0, 0) + TimeDelta::days(24));
        assert_eq!(
            state.history()[HISTORY_LIMIT - 1].start_time,
            at(0, 0) + TimeDelta::days(5)
        );
        assert_eq!(state.recent(5).len(), 5);
        assert_eq!(state.recent(5)[0], state.history()[0]);
    }

    #[test]
    fn reads_the_browser_document_layout() {
        let state = FastingState::from_value(Some(json!({
            "activeFast": { "startTime": "2024-03-10T08:00:00.000Z" },
            "history": [{
                "startTime": "2024-03-08T20:00:00.000Z",
                "endTime": "2024-03-09T12:00:00.000Z",
                "duration": 57_600_000
            }]
        })));
        assert_eq!(state.active().unwrap().start_time, at(8, 0));
        assert_eq!(state.history()[0].duration(), TimeDelta::hours(16));

        let value = state.to_value();
        assert_eq!(value["history"][0]["duration"], json!(57_600_000));
        assert!(value["activeFast"]["startTime"].is_string());
    }

    #[test]
    fn malformed_document_falls_back_to_idle() {
        for raw in [
            json!("nonsense"),
            json!({ "activeFast": { "startTime": "yesterday" } }),
            json!({ "history": 7 }),
        ] {
            assert_eq!(FastingState::from_value(Some(raw)), FastingState::default());
        }
        assert_eq!(FastingState::from_value(Some(Value::Null)), FastingState::default());
        assert_eq!(
            FastingState::from_value(Some(json!({ "activeFast": null }))),
            FastingState::default()
        );
    }

    #[test]
    fn oversized_history_is_truncated_on_load() {
        let record = json!({
            "startTime": "2024-03-08T20:00:00Z",
            "endTime": "2024-03-09T12:00:00Z",
            "duration": 57_600_000
        });
        let history: Vec<Value> = std::iter::repeat_n(record, 30).collect();
        let state = FastingState::from_value(Some(json!({ "history": history })));
        assert_eq!(state.history().len(), HISTORY_LIMIT);
    }

    #[rstest]
    #[case(TimeDelta::zero(), 0.0)]
    #[case(TimeDelta::hours(4), 0.25)]
    #[case(TimeDelta::hours(16), 1.0)]
    #[case(TimeDelta::hours(30), 1.0)]
    #[case(TimeDelta::hours(-2), 0.0)]
    fn progress_is_bounded(#[case] elapsed: TimeDelta, #[case] expected: f64) {
        assert!((progress_fraction(elapsed, DEFAULT_GOAL_HOURS) - expected).abs() < 1e-9);
    }

    #[rstest]
    #[case(TimeDelta::zero(), "0:00:00")]
    #[case(TimeDelta::seconds(59), "0:00:59")]
    #[case(TimeDelta::seconds(3 * 3600 + 7 * 60 + 5), "3:07:05")]
    #[case(TimeDelta::hours(27), "27:00:00")]
    #[case(TimeDelta::seconds(-4), "0:00:00")]
    fn elapsed_label(#[case] elapsed: TimeDelta, #[case] expected: &str) {
        assert_eq!(format_elapsed(elapsed), expected);
    }

    #[rstest]
    #[case(TimeDelta::seconds(59), "0m")]
    #[case(TimeDelta::minutes(45), "45m")]
    #[case(TimeDelta::minutes(16 * 60 + 5), "16h 5m")]
    fn short_duration_label(#[case] duration: TimeDelta, #[case] expected: &str) {
        assert_eq!(format_duration_short(duration), expected);
    }
}
