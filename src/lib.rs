pub mod app;
pub mod calendar;
pub mod clock;
pub mod config;
pub mod errors;
pub mod fasting;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod state;
pub mod storage;
pub mod summary;
pub mod ticker;
pub mod tracker;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore};
