use crate::ledger::{DailyLog, GOAL};
use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

pub const WEEKDAY_NAMES: [&str; 7] = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    Empty,
    Active,
    Done,
}

impl DayStatus {
    pub fn for_count(count: u64) -> Self {
        if count >= GOAL {
            Self::Done
        } else if count > 0 {
            Self::Active
        } else {
            Self::Empty
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub day: u32,
    pub count: u64,
    pub status: DayStatus,
    pub is_selected: bool,
    pub is_today: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CalendarCell {
    Blank,
    Day(DayCell),
}

/// A calendar month; always refers to a real month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonthCursor {
    first: NaiveDate,
}

impl MonthCursor {
    /// `month` is 1-based.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first| Self { first })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            first: date.with_day(1).unwrap_or(date),
        }
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    /// Moves by `delta` months; stays put at the edge of the representable range.
    pub fn shift(&self, delta: i32) -> Self {
        let months = Months::new(delta.unsigned_abs());
        let moved = if delta >= 0 {
            self.first.checked_add_months(months)
        } else {
            self.first.checked_sub_months(months)
        };
        moved.map(|first| Self { first }).unwrap_or(*self)
    }

    pub fn days_in_month(&self) -> u32 {
        self.first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .map(|last| last.day())
            .unwrap_or(31)
    }

    /// Blank cells before day 1, with Sunday as the first column.
    pub fn leading_blanks(&self) -> u32 {
        self.first.weekday().num_days_from_sunday()
    }

    pub fn label(&self) -> String {
        self.first.format("%B %Y").to_string()
    }
}

/// Month grid for `year`/`month` (1-based). An invalid month gives no cells.
pub fn build_month(
    year: i32,
    month: u32,
    log: &DailyLog,
    selected: NaiveDate,
    today: NaiveDate,
) -> Vec<CalendarCell> {
    let Some(cursor) = MonthCursor::new(year, month) else {
        return Vec::new();
    };

    let offset = cursor.leading_blanks();
    let days = cursor.days_in_month();
    let mut cells = Vec::with_capacity((offset + days) as usize);
    cells.extend((0..offset).map(|_| CalendarCell::Blank));

    for date in cursor.first_day().iter_days().take(days as usize) {
        let count = log.get_count(date);
        cells.push(CalendarCell::Day(DayCell {
            date,
            day: date.day(),
            count,
            status: DayStatus::for_count(count),
            is_selected: date == selected,
            is_today: date == today,
        }));
    }
    cells
}
