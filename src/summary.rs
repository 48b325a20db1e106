use crate::calendar::{WEEKDAY_NAMES, build_month};
use crate::fasting::{
    FastRecord, FastingState, format_duration_short, format_elapsed, progress_fraction,
};
use crate::ledger::GOAL;
use crate::models::{FastingTick, FastingView, HistoryEntry, LogView, MonthView};
use crate::tracker::Tracker;
use chrono::{DateTime, Local, NaiveDate, TimeDelta, Utc};

pub fn build_log_view(tracker: &Tracker, today: NaiveDate) -> LogView {
    let log = tracker.log();
    let selected = tracker.selected_date();
    let count = log.get_count(selected);
    let is_today = selected == today;
    let is_future = selected > today;

    let message = if is_future {
        "Future date".to_string()
    } else if count >= GOAL {
        "Goal complete!".to_string()
    } else {
        format!("{} more to go", GOAL - count)
    };

    let month = tracker.month();
    LogView {
        date: selected,
        date_label: if is_today {
            "Today's Progress".to_string()
        } else {
            date_label(selected)
        },
        is_today,
        is_future,
        count,
        goal: GOAL,
        progress: (count as f64 / GOAL as f64).min(1.0),
        remaining: GOAL.saturating_sub(count),
        message,
        streak: log.streak(today),
        total: log.total(),
        can_undo: !is_future && count > 0,
        controls_enabled: !is_future,
        calendar: MonthView {
            year: month.year(),
            month: month.month(),
            label: month.label(),
            weekdays: WEEKDAY_NAMES,
            cells: build_month(month.year(), month.month(), log, selected, today),
        },
    }
}

pub fn build_fasting_view(
    fasting: &FastingState,
    now: DateTime<Utc>,
    goal_hours: u32,
    history_shown: usize,
) -> FastingView {
    let active = fasting.active();
    let tick = active.map(|active| build_tick(active.start_time, now, goal_hours));

    FastingView {
        status: fasting.phase(),
        status_label: fasting.phase().label(),
        goal_hours,
        started_at: active.map(|active| active.start_time),
        started_label: active.map(|active| fast_date_label(active.start_time)),
        elapsed_ms: tick.as_ref().map(|tick| tick.elapsed_ms),
        progress: tick.as_ref().map_or(0.0, |tick| tick.progress),
        goal_reached: tick.as_ref().is_some_and(|tick| tick.goal_reached),
        elapsed: tick.map(|tick| tick.elapsed),
        history: fasting.recent(history_shown).iter().map(history_entry).collect(),
        history_total: fasting.history().len(),
    }
}

pub fn build_tick(started_at: DateTime<Utc>, now: DateTime<Utc>, goal_hours: u32) -> FastingTick {
    let elapsed = (now - started_at).max(TimeDelta::zero());
    let progress = progress_fraction(elapsed, goal_hours);
    FastingTick {
        elapsed_ms: elapsed.num_milliseconds(),
        elapsed: format_elapsed(elapsed),
        progress,
        goal_reached: progress >= 1.0,
    }
}

/// `Mon, Oct 19`
pub fn date_label(date: NaiveDate) -> String {
    date.format("%a, %b %-d").to_string()
}

fn fast_date_label(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local)
        .format("%a, %b %-d, %-I:%M %p")
        .to_string()
}

fn history_entry(record: &FastRecord) -> HistoryEntry {
    HistoryEntry {
        start_time: record.start_time,
        end_time: record.end_time,
        duration_ms: record.duration_ms,
        date_label: fast_date_label(record.start_time),
        duration_label: format_duration_short(record.duration()),
    }
}
