use crate::fasting::DEFAULT_GOAL_HOURS;
use std::{env, path::PathBuf, str::FromStr};
use tracing::warn;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_HISTORY_SHOWN: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub data_dir: PathBuf,
    pub fast_goal_hours: u32,
    pub history_shown: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            fast_goal_hours: DEFAULT_GOAL_HOURS,
            history_shown: DEFAULT_HISTORY_SHOWN,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let fast_goal_hours = parse_or(&lookup, "FAST_GOAL_HOURS", defaults.fast_goal_hours);

        Self {
            port: parse_or(&lookup, "PORT", defaults.port),
            data_dir: lookup("APP_DATA_DIR")
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            fast_goal_hours: if fast_goal_hours == 0 {
                warn!("FAST_GOAL_HOURS must be at least 1, using {DEFAULT_GOAL_HOURS}");
                DEFAULT_GOAL_HOURS
            } else {
                fast_goal_hours
            },
            history_shown: parse_or(&lookup, "FAST_HISTORY_SHOWN", defaults.history_shown),
        }
    }
}

fn parse_or<T: FromStr + Copy>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => value,
        Err(_) => {
            warn!("ignoring unparseable {key}={raw:?}");
            default
        }
    }
}
