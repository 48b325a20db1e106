use crate::calendar::MonthCursor;
use crate::fasting::{ActiveFast, FastError, FastRecord, FastingState};
use crate::ledger::DailyLog;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

pub const UNDO_STEP: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountOutcome {
    Updated,
    /// The selected day just went from below the goal to at or above it.
    GoalReached,
    Ignored,
}

impl CountOutcome {
    pub fn changed(&self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

#[derive(Debug, Clone)]
pub struct Tracker {
    log: DailyLog,
    fasting: FastingState,
    selected_date: NaiveDate,
    month: MonthCursor,
}

impl Tracker {
    pub fn new(log: DailyLog, fasting: FastingState, today: NaiveDate) -> Self {
        Self {
            log,
            fasting,
            selected_date: today,
            month: MonthCursor::containing(today),
        }
    }

    pub fn log(&self) -> &DailyLog {
        &self.log
    }

    pub fn fasting(&self) -> &FastingState {
        &self.fasting
    }

    pub fn selected_date(&self) -> NaiveDate {
        self.selected_date
    }

    pub fn month(&self) -> MonthCursor {
        self.month
    }

    pub fn select_date(&mut self, date: NaiveDate) {
        self.selected_date = date;
    }

    pub fn return_to_today(&mut self, today: NaiveDate) {
        self.selected_date = today;
        self.month = MonthCursor::containing(today);
    }

    pub fn shift_month(&mut self, delta: i32) {
        self.month = self.month.shift(delta);
    }

    pub fn set_count(&mut self, date: NaiveDate, value: f64) -> CountOutcome {
        let change = self.log.set_count(date, value);
        if change.crossed_goal() && date == self.selected_date {
            CountOutcome::GoalReached
        } else {
            CountOutcome::Updated
        }
    }

    /// Adds a user-entered amount to the selected day. Missing, non-positive
    /// or non-finite amounts and future days are ignored.
    pub fn add_to_selected(&mut self, amount: Option<f64>, today: NaiveDate) -> CountOutcome {
        let Some(amount) = amount.filter(|a| a.is_finite() && *a > 0.0) else {
            return CountOutcome::Ignored;
        };
        if self.selected_date > today {
            return CountOutcome::Ignored;
        }
        let current = self.log.get_count(self.selected_date) as f64;
        self.set_count(self.selected_date, current + amount)
    }

    pub fn undo(&mut self, today: NaiveDate) -> CountOutcome {
        let current = self.log.get_count(self.selected_date);
        if self.selected_date > today || current == 0 {
            return CountOutcome::Ignored;
        }
        self.set_count(self.selected_date, current as f64 - UNDO_STEP)
    }

    pub fn start_fast(&mut self, start: DateTime<Utc>, now: DateTime<Utc>) -> Result<ActiveFast, FastError> {
        self.fasting.start_fast(start, now)?;
        Ok(ActiveFast { start_time: start })
    }

    pub fn end_fast(&mut self, now: DateTime<Utc>) -> Option<FastRecord> {
        self.fasting.end_fast(now)
    }
}
