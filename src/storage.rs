use crate::fasting::FastingState;
use crate::ledger::DailyLog;
use async_trait::async_trait;
use serde_json::Value;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::{fs, sync::Mutex};
use tracing::{debug, error, warn};

pub const LOG_KEY: &str = "pushups-daily-v2";
pub const FASTING_KEY: &str = "fasting-v1";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid store key {0:?}")]
    InvalidKey(String),
    #[error("failed to encode document: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write document: {0}")]
    Io(#[from] std::io::Error),
}

/// Durable string-keyed JSON documents.
///
/// `get` never fails: a missing or unreadable document is reported as absent.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<Value>;
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
}

/// One pretty-printed `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && !key.starts_with('.');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Option<Value> {
        let path = match self.path_for(key) {
            Ok(path) => path,
            Err(err) => {
                error!("{err}");
                return None;
            }
        };
        match fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(value) => Some(value),
                Err(err) => {
                    warn!("failed to parse {}: {err}", path.display());
                    None
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                warn!("failed to read {}: {err}", path.display());
                None
            }
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let payload = serde_json::to_vec_pretty(&value)?;
        fs::create_dir_all(&self.dir).await?;
        fs::write(&path, payload).await?;
        debug!("wrote {}", path.display());
        Ok(())
    }
}

/// In-process store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            entries: Mutex::new(entries.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<Value> {
        self.entries.lock().await.get(key).cloned()
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }
}

pub async fn load_log(store: &dyn KeyValueStore) -> DailyLog {
    DailyLog::from_value(store.get(LOG_KEY).await)
}

pub async fn save_log(store: &dyn KeyValueStore, log: &DailyLog) -> Result<(), StoreError> {
    store.set(LOG_KEY, log.to_value()).await.inspect_err(|err| {
        error!("failed to persist daily log: {err}");
    })
}

pub async fn load_fasting(store: &dyn KeyValueStore) -> FastingState {
    FastingState::from_value(store.get(FASTING_KEY).await)
}

pub async fn save_fasting(store: &dyn KeyValueStore, state: &FastingState) -> Result<(), StoreError> {
    store.set(FASTING_KEY, state.to_value()).await.inspect_err(|err| {
        error!("failed to persist fasting state: {err}");
    })
}
