use crate::calendar::CalendarCell;
use crate::fasting::FastPhase;
use crate::tracker::CountOutcome;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
pub struct AddRequest {
    /// Raw form input; anything that is not a positive number is ignored.
    #[serde(default)]
    pub amount: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct SetCountRequest {
    pub count: f64,
}

#[derive(Debug, Deserialize)]
pub struct SelectDateRequest {
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct MonthRequest {
    pub delta: i32,
}

#[derive(Debug, Default, Deserialize)]
pub struct StartFastRequest {
    /// RFC 3339, or local `YYYY-MM-DDTHH:MM[:SS]`. Absent means now.
    #[serde(default)]
    pub start_time: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub weekdays: [&'static str; 7],
    pub cells: Vec<CalendarCell>,
}

#[derive(Debug, Serialize)]
pub struct LogView {
    pub date: NaiveDate,
    pub date_label: String,
    pub is_today: bool,
    pub is_future: bool,
    pub count: u64,
    pub goal: u64,
    pub progress: f64,
    pub remaining: u64,
    pub message: String,
    pub streak: u32,
    pub total: u64,
    pub can_undo: bool,
    pub controls_enabled: bool,
    pub calendar: MonthView,
}

#[derive(Debug, Serialize)]
pub struct LogUpdate {
    pub outcome: CountOutcome,
    pub view: LogView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_ms: i64,
    pub date_label: String,
    pub duration_label: String,
}

#[derive(Debug, Serialize)]
pub struct FastingView {
    pub status: FastPhase,
    pub status_label: &'static str,
    pub goal_hours: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub started_label: Option<String>,
    pub elapsed_ms: Option<i64>,
    pub elapsed: Option<String>,
    pub progress: f64,
    pub goal_reached: bool,
    pub history: Vec<HistoryEntry>,
    pub history_total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FastingTick {
    pub elapsed_ms: i64,
    pub elapsed: String,
    pub progress: f64,
    pub goal_reached: bool,
}
