use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, TimeZone};
use daily_habits::{
    AppState, Config, KeyValueStore, MemoryStore,
    clock::ManualClock,
    router,
    storage::{FASTING_KEY, LOG_KEY, StoreError},
};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

struct Harness<S> {
    base_url: String,
    client: Client,
    clock: ManualClock,
    store: Arc<S>,
    state: AppState,
}

/// Memory store whose writes can be switched to fail, like a full disk.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    failing: AtomicBool,
}

impl FlakyStore {
    fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get(&self, key: &str) -> Option<Value> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other("disk full")));
        }
        self.inner.set(key, value).await
    }
}

impl<S> Harness<S> {
    async fn get(&self, path: &str) -> Value {
        self.client
            .get(format!("{}{path}", self.base_url))
            .send()
            .await
            .unwrap()
            .error_for_status()
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    async fn send(&self, method: reqwest::Method, path: &str, body: Value) -> reqwest::Response {
        self.client
            .request(method, format!("{}{path}", self.base_url))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn post(&self, path: &str, body: Value) -> Value {
        self.send(reqwest::Method::POST, path, body)
            .await
            .error_for_status()
            .unwrap()
            .json()
            .await
            .unwrap()
    }
}

fn noon(year: i32, month: u32, day: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}

async fn start<S: KeyValueStore + 'static>(store: S, now: DateTime<Local>) -> Harness<S> {
    let clock = ManualClock::new(now);
    let store = Arc::new(store);
    let state = AppState::load(Config::default(), Arc::new(clock.clone()), store.clone()).await;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Harness {
        base_url: format!("http://{addr}"),
        client: Client::new(),
        clock,
        store,
        state,
    }
}

#[tokio::test]
async fn goal_reached_is_reported_once_per_crossing() {
    let h = start(MemoryStore::new(), noon(2024, 1, 2)).await;

    let first = h.post("/api/log/add", json!({ "amount": 60 })).await;
    assert_eq!(first["outcome"], "updated");
    let second = h.post("/api/log/add", json!({ "amount": "40" })).await;
    assert_eq!(second["outcome"], "goal_reached");
    assert_eq!(second["view"]["message"], "Goal complete!");
    let third = h.post("/api/log/add", json!({ "amount": 10 })).await;
    assert_eq!(third["outcome"], "updated");

    let undone = h.post("/api/log/undo", json!({})).await;
    assert_eq!(undone["view"]["count"], 100);
    let undone = h.post("/api/log/undo", json!({})).await;
    assert_eq!(undone["view"]["count"], 90);
    let again = h.post("/api/log/add", json!({ "amount": 10 })).await;
    assert_eq!(again["outcome"], "goal_reached");

    assert_eq!(h.store.get(LOG_KEY).await, Some(json!({ "2024-01-02": 100 })));
}

#[tokio::test]
async fn streak_and_total_come_from_the_persisted_log() {
    let store = MemoryStore::with_entries([(LOG_KEY, json!({ "2024-01-01": 100, "2024-01-02": 100 }))]);
    let h = start(store, noon(2024, 1, 2)).await;

    let view = h.get("/api/log").await;
    assert_eq!(view["streak"], 2);
    assert_eq!(view["total"], 200);
    assert_eq!(view["is_today"], true);

    // the next day the run is still alive until the day ends
    h.clock.advance(TimeDelta::days(1));
    let view = h.get("/api/log").await;
    assert_eq!(view["streak"], 2);

    h.clock.advance(TimeDelta::days(1));
    let view = h.get("/api/log").await;
    assert_eq!(view["streak"], 0);
}

#[tokio::test]
async fn selection_and_month_navigation() {
    let h = start(MemoryStore::new(), noon(2024, 1, 15)).await;

    let view = h.post("/api/log/month", json!({ "delta": -1 })).await;
    assert_eq!(view["calendar"]["label"], "December 2023");
    // December 2023 starts on a Friday.
    let cells = view["calendar"]["cells"].as_array().unwrap();
    assert_eq!(cells.len(), 5 + 31);
    assert_eq!(cells[5]["date"], "2023-12-01");

    let view = h.post("/api/log/select", json!({ "date": "2023-12-31" })).await;
    assert_eq!(view["date"], "2023-12-31");
    assert_eq!(view["is_today"], false);
    assert_eq!(view["date_label"], "Sun, Dec 31");

    let update = h.post("/api/log/add", json!({ "amount": 100 })).await;
    assert_eq!(update["outcome"], "goal_reached");
    let cells = update["view"]["calendar"]["cells"].as_array().unwrap();
    let last = cells.last().unwrap();
    assert_eq!(last["status"], "done");
    assert_eq!(last["is_selected"], true);

    let view = h.post("/api/log/today", json!({})).await;
    assert_eq!(view["date"], "2024-01-15");
    assert_eq!(view["calendar"]["label"], "January 2024");
}

#[tokio::test]
async fn future_day_cannot_be_edited_from_the_controls() {
    let h = start(MemoryStore::new(), noon(2024, 1, 15)).await;
    h.post("/api/log/select", json!({ "date": "2024-01-20" })).await;

    let update = h.post("/api/log/add", json!({ "amount": 30 })).await;
    assert_eq!(update["outcome"], "ignored");
    assert_eq!(update["view"]["message"], "Future date");
    assert_eq!(update["view"]["controls_enabled"], false);
    assert!(h.store.get(LOG_KEY).await.is_none());
}

#[tokio::test]
async fn set_count_on_any_day_is_clamped() {
    let h = start(MemoryStore::new(), noon(2024, 1, 15)).await;

    let update = h
        .send(reqwest::Method::PUT, "/api/log/days/2024-01-10", json!({ "count": 120.7 }))
        .await
        .json::<Value>()
        .await
        .unwrap();
    // not the selected day, so no celebration
    assert_eq!(update["outcome"], "updated");
    assert_eq!(update["view"]["total"], 120);

    h.send(reqwest::Method::PUT, "/api/log/days/2024-01-11", json!({ "count": -4 }))
        .await;
    assert_eq!(h.store.get(LOG_KEY).await, Some(json!({ "2024-01-10": 120 })));

    let bad = h
        .send(reqwest::Method::PUT, "/api/log/days/yesterday", json!({ "count": 5 }))
        .await;
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn backdated_fast_runs_until_ended() {
    let h = start(MemoryStore::new(), noon(2024, 1, 2)).await;

    let view = h.post("/api/fasting/start", json!({ "start_time": "2024-01-02T04:00" })).await;
    assert_eq!(view["status"], "fasting");
    assert_eq!(view["elapsed"], "8:00:00");
    assert_eq!(view["progress"], 0.5);
    assert!(h.state.ticker.is_running());

    let conflict = h.send(reqwest::Method::POST, "/api/fasting/start", json!({})).await;
    assert_eq!(conflict.status(), StatusCode::CONFLICT);

    h.clock.advance(TimeDelta::hours(9));
    let view = h.get("/api/fasting").await;
    assert_eq!(view["goal_reached"], true);
    assert_eq!(view["progress"], 1.0);

    let view = h.post("/api/fasting/end", json!({})).await;
    assert_eq!(view["status"], "idle");
    assert_eq!(view["history_total"], 1);
    assert_eq!(view["history"][0]["duration_ms"], 17 * 3_600_000);
    assert_eq!(view["history"][0]["duration_label"], "17h 0m");
    assert!(!h.state.ticker.is_running());

    let saved = h.store.get(FASTING_KEY).await.unwrap();
    assert_eq!(saved["activeFast"], Value::Null);
    assert_eq!(saved["history"][0]["duration"], 17 * 3_600_000);
}

#[tokio::test]
async fn future_start_leaves_state_untouched() {
    let h = start(MemoryStore::new(), noon(2024, 1, 2)).await;

    let response = h
        .send(
            reqwest::Method::POST,
            "/api/fasting/start",
            json!({ "start_time": "2024-01-02T12:05" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.text().await.unwrap(), "start time cannot be in the future");

    assert_eq!(h.get("/api/fasting").await["status"], "idle");
    assert!(h.store.get(FASTING_KEY).await.is_none());
}

#[tokio::test]
async fn history_keeps_the_newest_twenty() {
    let h = start(MemoryStore::new(), noon(2024, 1, 2)).await;

    for _ in 0..23 {
        h.post("/api/fasting/start", json!({})).await;
        h.clock.advance(TimeDelta::hours(1));
        h.post("/api/fasting/end", json!({})).await;
        h.clock.advance(TimeDelta::hours(1));
    }

    let view = h.get("/api/fasting").await;
    assert_eq!(view["history_total"], 20);
    assert_eq!(view["history"].as_array().unwrap().len(), 5);

    let saved = h.store.get(FASTING_KEY).await.unwrap();
    let history = saved["history"].as_array().unwrap();
    assert_eq!(history.len(), 20);
    let newest = DateTime::parse_from_rfc3339(history[0]["startTime"].as_str().unwrap()).unwrap();
    let oldest = DateTime::parse_from_rfc3339(history[19]["startTime"].as_str().unwrap()).unwrap();
    assert_eq!(newest - oldest, TimeDelta::hours(2 * 19));
}

#[tokio::test]
async fn malformed_documents_load_as_defaults() {
    let store = MemoryStore::with_entries([
        (LOG_KEY, json!("not a log")),
        (FASTING_KEY, json!({ "activeFast": 5 })),
    ]);
    let h = start(store, noon(2024, 1, 2)).await;

    let log = h.get("/api/log").await;
    assert_eq!(log["total"], 0);
    assert_eq!(log["streak"], 0);
    assert_eq!(h.get("/api/fasting").await["status"], "idle");
    assert!(!h.state.ticker.is_running());
}

#[tokio::test]
async fn persisted_active_fast_resumes_ticking() {
    let store = MemoryStore::with_entries([(
        FASTING_KEY,
        json!({ "activeFast": { "startTime": "2024-01-02T00:00:00Z" }, "history": [] }),
    )]);
    let h = start(store, noon(2024, 1, 2)).await;

    assert!(h.state.ticker.is_running());
    let view = h.get("/api/fasting").await;
    assert_eq!(view["status"], "fasting");
    assert_eq!(view["started_at"], "2024-01-02T00:00:00Z");
}

#[tokio::test]
async fn tick_stream_opens_with_current_state() {
    let h = start(MemoryStore::new(), noon(2024, 1, 2)).await;

    let mut response = h
        .client
        .get(format!("{}/api/fasting/ticks", h.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let chunk = response.chunk().await.unwrap().expect("first event");
    let text = String::from_utf8_lossy(&chunk);
    assert!(text.contains("event: idle"), "unexpected event: {text}");
}

#[tokio::test]
async fn failed_write_rolls_back_fast_start() {
    let h = start(FlakyStore::default(), noon(2024, 1, 2)).await;

    h.store.fail_writes(true);
    let response = h.send(reqwest::Method::POST, "/api/fasting/start", json!({})).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(h.get("/api/fasting").await["status"], "idle");
    assert!(!h.state.ticker.is_running());

    h.store.fail_writes(false);
    let view = h.post("/api/fasting/start", json!({})).await;
    assert_eq!(view["status"], "fasting");
    assert!(h.state.ticker.is_running());
}

#[tokio::test]
async fn failed_write_keeps_fast_running_on_end() {
    let h = start(FlakyStore::default(), noon(2024, 1, 2)).await;
    h.post("/api/fasting/start", json!({})).await;
    h.clock.advance(TimeDelta::hours(3));

    h.store.fail_writes(true);
    let response = h.send(reqwest::Method::POST, "/api/fasting/end", json!({})).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let view = h.get("/api/fasting").await;
    assert_eq!(view["status"], "fasting");
    assert_eq!(view["history_total"], 0);
    assert!(h.state.ticker.is_running());

    h.store.fail_writes(false);
    let view = h.post("/api/fasting/end", json!({})).await;
    assert_eq!(view["history"][0]["duration_ms"], 3 * 3_600_000);
    assert!(!h.state.ticker.is_running());
}

#[tokio::test]
async fn failed_write_leaves_count_and_goal_crossing_intact() {
    let h = start(FlakyStore::default(), noon(2024, 1, 2)).await;
    h.post("/api/log/add", json!({ "amount": 90 })).await;

    h.store.fail_writes(true);
    let response = h.send(reqwest::Method::POST, "/api/log/add", json!({ "amount": 10 })).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(h.get("/api/log").await["count"], 90);

    let response = h.send(reqwest::Method::POST, "/api/log/undo", json!({})).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(h.get("/api/log").await["count"], 90);

    h.store.fail_writes(false);
    let update = h.post("/api/log/add", json!({ "amount": 10 })).await;
    assert_eq!(update["outcome"], "goal_reached");
    assert_eq!(h.store.get(LOG_KEY).await, Some(json!({ "2024-01-02": 100 })));
}
