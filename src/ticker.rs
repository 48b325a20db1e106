use crate::clock::Clock;
use crate::models::FastingTick;
use crate::summary::build_tick;
use chrono::{DateTime, Utc};
use std::{
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::info;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Recomputes the active fast's elapsed time on a fixed period and publishes
/// it. At most one tick task runs at a time; idle publishes `None`.
pub struct FastTicker {
    clock: Arc<dyn Clock>,
    goal_hours: u32,
    period: Duration,
    sender: Arc<watch::Sender<Option<FastingTick>>>,
    generation: Arc<AtomicU64>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl FastTicker {
    pub fn new(clock: Arc<dyn Clock>, goal_hours: u32) -> Self {
        Self::with_period(clock, goal_hours, TICK_PERIOD)
    }

    pub fn with_period(clock: Arc<dyn Clock>, goal_hours: u32, period: Duration) -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            clock,
            goal_hours,
            period,
            sender: Arc::new(sender),
            generation: Arc::new(AtomicU64::new(0)),
            task: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<FastingTick>> {
        self.sender.subscribe()
    }

    pub fn latest(&self) -> Option<FastingTick> {
        self.sender.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.lock_task()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Must be called from inside a tokio runtime.
    pub fn start(&self, started_at: DateTime<Utc>) {
        let mut task = self.lock_task();
        if let Some(previous) = task.take() {
            previous.abort();
        }
        let current = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let sender = Arc::clone(&self.sender);
        let generation = Arc::clone(&self.generation);
        let clock = Arc::clone(&self.clock);
        let goal_hours = self.goal_hours;
        let period = self.period;
        *task = Some(tokio::spawn(async move {
            let mut ticks = interval(period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticks.tick().await;
                let tick = build_tick(started_at, clock.now_utc(), goal_hours);
                // checked under the channel lock, so a superseded task can
                // never land a value after stop() or a newer start()
                sender.send_if_modified(|latest| {
                    if generation.load(Ordering::SeqCst) != current {
                        return false;
                    }
                    *latest = Some(tick);
                    true
                });
            }
        }));
        info!("fast ticker started for fast beginning {started_at}");
    }

    pub fn stop(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = self.lock_task().take() {
            task.abort();
            info!("fast ticker stopped");
        }
        self.sender.send_replace(None);
    }

    fn lock_task(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for FastTicker {
    fn drop(&mut self) {
        let task = self
            .task
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(task) = task.take() {
            task.abort();
        }
    }
}
