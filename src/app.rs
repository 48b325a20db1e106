use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post, put}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/log", get(handlers::get_log))
        .route("/api/log/add", post(handlers::add_reps))
        .route("/api/log/undo", post(handlers::undo))
        .route("/api/log/days/:date", put(handlers::set_day_count))
        .route("/api/log/select", post(handlers::select_date))
        .route("/api/log/today", post(handlers::return_to_today))
        .route("/api/log/month", post(handlers::shift_month))
        .route("/api/fasting", get(handlers::get_fasting))
        .route("/api/fasting/start", post(handlers::start_fast))
        .route("/api/fasting/end", post(handlers::end_fast))
        .route("/api/fasting/ticks", get(handlers::fasting_ticks))
        .with_state(state)
}
