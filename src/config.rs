use std::str::FromStr;

use log::LevelFilter;

use crate::parse_env;

pub const LOG_LEVEL_KEY: &str = "LEOC_LOG";
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// settings of the command line driver, read from environment variables
#[derive(Debug, PartialEq, Clone)]
pub struct Config {
    pub log_level: LevelFilter,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_level(&parse_env(LOG_LEVEL_KEY, DEFAULT_LOG_LEVEL))
    }

    /// level names are the ones accepted by `log` (`off`, `error` .. `trace`), case insensitive
    pub fn from_level(level: &str) -> Result<Self, String> {
        match LevelFilter::from_str(level.trim()) {
            Ok(log_level) => Ok(Self { log_level }),
            Err(_) => Err(format!("invalid value of {}: `{}`", LOG_LEVEL_KEY, level)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self { log_level: LevelFilter::Warn }
    }
}
