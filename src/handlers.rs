use crate::errors::AppError;
use crate::models::{
    AddRequest, FastingView, LogUpdate, LogView, MonthRequest, SelectDateRequest, SetCountRequest,
    StartFastRequest,
};
use crate::state::AppState;
use crate::storage::{save_fasting, save_log};
use crate::summary::{build_fasting_view, build_log_view};
use crate::tracker::{CountOutcome, Tracker};
use crate::ui::render_index;
use axum::{
    extract::{Path, State},
    response::{
        Html,
        sse::{Event, KeepAlive, Sse},
    },
    Json,
};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use futures::{Stream, stream};
use serde_json::Value;
use tracing::{debug, info};

pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_index(state.config.fast_goal_hours))
}

pub async fn get_log(State(state): State<AppState>) -> Json<LogView> {
    let tracker = state.tracker.lock().await;
    Json(build_log_view(&tracker, state.clock.today()))
}

pub async fn add_reps(
    State(state): State<AppState>,
    Json(payload): Json<AddRequest>,
) -> Result<Json<LogUpdate>, AppError> {
    let amount = payload.amount.as_ref().and_then(parse_amount);
    let today = state.clock.today();
    let mut tracker = state.tracker.lock().await;
    let before = tracker.clone();
    let date = tracker.selected_date();
    let outcome = tracker.add_to_selected(amount, today);
    if !outcome.changed() {
        debug!("ignored add of {:?} on {date}", payload.amount);
    }
    commit_log(&state, &mut tracker, before, date, outcome).await
}

pub async fn undo(State(state): State<AppState>) -> Result<Json<LogUpdate>, AppError> {
    let today = state.clock.today();
    let mut tracker = state.tracker.lock().await;
    let before = tracker.clone();
    let date = tracker.selected_date();
    let outcome = tracker.undo(today);
    commit_log(&state, &mut tracker, before, date, outcome).await
}

pub async fn set_day_count(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
    Json(payload): Json<SetCountRequest>,
) -> Result<Json<LogUpdate>, AppError> {
    let mut tracker = state.tracker.lock().await;
    let before = tracker.clone();
    let outcome = tracker.set_count(date, payload.count);
    commit_log(&state, &mut tracker, before, date, outcome).await
}

pub async fn select_date(
    State(state): State<AppState>,
    Json(payload): Json<SelectDateRequest>,
) -> Json<LogView> {
    let mut tracker = state.tracker.lock().await;
    tracker.select_date(payload.date);
    Json(build_log_view(&tracker, state.clock.today()))
}

pub async fn return_to_today(State(state): State<AppState>) -> Json<LogView> {
    let today = state.clock.today();
    let mut tracker = state.tracker.lock().await;
    tracker.return_to_today(today);
    Json(build_log_view(&tracker, today))
}

pub async fn shift_month(
    State(state): State<AppState>,
    Json(payload): Json<MonthRequest>,
) -> Json<LogView> {
    let mut tracker = state.tracker.lock().await;
    tracker.shift_month(payload.delta);
    Json(build_log_view(&tracker, state.clock.today()))
}

pub async fn get_fasting(State(state): State<AppState>) -> Json<FastingView> {
    let tracker = state.tracker.lock().await;
    Json(fasting_view(&state, &tracker))
}

pub async fn start_fast(
    State(state): State<AppState>,
    Json(payload): Json<StartFastRequest>,
) -> Result<Json<FastingView>, AppError> {
    let now = state.clock.now_utc();
    let start = match payload.start_time.as_deref() {
        None => now,
        Some(raw) => parse_start_time(raw)?,
    };

    let mut tracker = state.tracker.lock().await;
    let before = tracker.clone();
    let active = tracker.start_fast(start, now)?;
    if let Err(err) = save_fasting(state.store.as_ref(), tracker.fasting()).await {
        *tracker = before;
        return Err(err.into());
    }
    state.ticker.start(active.start_time);
    info!("fast started at {}", active.start_time);

    Ok(Json(fasting_view(&state, &tracker)))
}

pub async fn end_fast(State(state): State<AppState>) -> Result<Json<FastingView>, AppError> {
    let now = state.clock.now_utc();
    let mut tracker = state.tracker.lock().await;
    let before = tracker.clone();
    if let Some(record) = tracker.end_fast(now) {
        if let Err(err) = save_fasting(state.store.as_ref(), tracker.fasting()).await {
            *tracker = before;
            return Err(err.into());
        }
        state.ticker.stop();
        info!("fast ended after {} ms", record.duration_ms);
    } else {
        debug!("end requested with no active fast");
    }
    Ok(Json(fasting_view(&state, &tracker)))
}

/// Server-sent `tick` events while fasting, `idle` otherwise. The current
/// value is sent immediately on connect.
pub async fn fasting_ticks(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let receiver = state.ticker.subscribe();
    let events = stream::unfold((receiver, true), |(mut receiver, first)| async move {
        if !first && receiver.changed().await.is_err() {
            return None;
        }
        let tick = receiver.borrow_and_update().clone();
        let event = match tick {
            Some(tick) => Event::default().event("tick").json_data(tick),
            None => Ok(Event::default().event("idle").data("idle")),
        };
        Some((event, (receiver, false)))
    });
    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Persists a changed log, putting `before` back if the write fails.
async fn commit_log(
    state: &AppState,
    tracker: &mut Tracker,
    before: Tracker,
    date: NaiveDate,
    outcome: CountOutcome,
) -> Result<Json<LogUpdate>, AppError> {
    if outcome.changed() {
        if let Err(err) = save_log(state.store.as_ref(), tracker.log()).await {
            *tracker = before;
            return Err(err.into());
        }
        info!("{date} now at {} ({outcome:?})", tracker.log().get_count(date));
    }
    Ok(Json(LogUpdate {
        outcome,
        view: build_log_view(tracker, state.clock.today()),
    }))
}

fn fasting_view(state: &AppState, tracker: &Tracker) -> FastingView {
    build_fasting_view(
        tracker.fasting(),
        state.clock.now_utc(),
        state.config.fast_goal_hours,
        state.config.history_shown,
    )
}

/// Coerces a form value to a number: JSON numbers as-is, numeric strings
/// parsed, everything else (including blanks) dropped.
fn parse_amount(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => {
            let text = text.trim();
            if text.is_empty() {
                None
            } else {
                text.parse::<f64>().ok()
            }
        }
        _ => None,
    }
}

fn parse_start_time(raw: &str) -> Result<DateTime<Utc>, AppError> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return naive
                .and_local_timezone(Local)
                .earliest()
                .map(|at| at.with_timezone(&Utc))
                .ok_or_else(|| AppError::bad_request("start time does not exist in local time"));
        }
    }
    Err(AppError::bad_request(
        "start time must be RFC 3339 or YYYY-MM-DDTHH:MM",
    ))
}
