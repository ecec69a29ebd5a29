use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use log::info;

use crate::model::types::QuizConfig;
use crate::question_source::DEFAULT_API_URL;

pub const DEFAULT_DATA_DIR: &str = ".trivia-quiz";
pub const DEFAULT_AMOUNT: u32 = 10;
pub const DEFAULT_TIME_LIMIT: u32 = 30;
pub const DEFAULT_FEEDBACK_DELAY: Duration = Duration::from_millis(2000);
pub const DEFAULT_FETCH_RETRIES: usize = 2;

#[derive(Debug)]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={:?} is invalid: {}", self.var, self.value, self.reason)
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub data_dir: PathBuf,
    pub default_amount: u32,
    pub time_limit: u32,
    pub feedback_delay: Duration,
    pub fetch_retries: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            default_amount: DEFAULT_AMOUNT,
            time_limit: DEFAULT_TIME_LIMIT,
            feedback_delay: DEFAULT_FEEDBACK_DELAY,
            fetch_retries: DEFAULT_FETCH_RETRIES,
        }
    }
}

fn parse_var<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => {
            value.trim().parse::<T>().map_err(|e| ConfigError {
                var,
                value: value.clone(),
                reason: e.to_string(),
            })
        }
        _ => Ok(default),
    }
}

impl Config {
    /// Read `TRIVIA_*` variables, falling back to defaults for unset ones.
    /// Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();
        let config = Config {
            api_url: env::var("TRIVIA_API_URL")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.api_url),
            data_dir: env::var("TRIVIA_DATA_DIR")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            default_amount: parse_var("TRIVIA_DEFAULT_AMOUNT", defaults.default_amount)?,
            time_limit: parse_var("TRIVIA_TIME_LIMIT", defaults.time_limit)?,
            feedback_delay: Duration::from_millis(parse_var(
                "TRIVIA_FEEDBACK_DELAY_MS",
                defaults.feedback_delay.as_millis() as u64,
            )?),
            fetch_retries: parse_var("TRIVIA_FETCH_RETRIES", defaults.fetch_retries)?,
        };

        config.quiz_defaults().validate().map_err(|reason| ConfigError {
            var: "TRIVIA_DEFAULT_AMOUNT/TRIVIA_TIME_LIMIT",
            value: format!("{}/{}", config.default_amount, config.time_limit),
            reason,
        })?;

        info!("Loaded config: {config:?}");
        Ok(config)
    }

    /// Quiz settings used when the player does not override them.
    pub fn quiz_defaults(&self) -> QuizConfig {
        QuizConfig::new(self.default_amount, self.time_limit)
    }
}
