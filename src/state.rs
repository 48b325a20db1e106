use crate::clock::Clock;
use crate::config::Config;
use crate::storage::{KeyValueStore, load_fasting, load_log};
use crate::ticker::FastTicker;
use crate::tracker::Tracker;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub clock: Arc<dyn Clock>,
    pub store: Arc<dyn KeyValueStore>,
    pub tracker: Arc<Mutex<Tracker>>,
    pub ticker: Arc<FastTicker>,
}

impl AppState {
    /// Reads both documents and resumes ticking if a fast was left running.
    pub async fn load(config: Config, clock: Arc<dyn Clock>, store: Arc<dyn KeyValueStore>) -> Self {
        let log = load_log(store.as_ref()).await;
        let fasting = load_fasting(store.as_ref()).await;
        info!(
            "loaded {} logged days and {} past fasts",
            log.len(),
            fasting.history().len()
        );

        let ticker = FastTicker::new(Arc::clone(&clock), config.fast_goal_hours);
        if let Some(active) = fasting.active() {
            info!("resuming fast started at {}", active.start_time);
            ticker.start(active.start_time);
        }

        let tracker = Tracker::new(log, fasting, clock.today());
        Self {
            config: Arc::new(config),
            clock,
            store,
            tracker: Arc::new(Mutex::new(tracker)),
            ticker: Arc::new(ticker),
        }
    }
}
