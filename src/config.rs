//! Application Configuration
//!
//! Resolved once at startup from values baked in at build time
//! (`TASKBOARD_API_URL`, `TASKBOARD_LOG`, ...). Bad values fall back to the
//! defaults with a warning rather than aborting the app.

use log::LevelFilter;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {name}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// API origin, without trailing slash. Empty means same origin.
    pub api_base_url: String,
    /// Total attempts for reads hitting transient failures
    pub read_attempts: u32,
    pub retry_delay_ms: u32,
    pub log_level: LevelFilter,
    /// Lines kept by the console logger's ring buffer
    pub log_buffer: usize,
    /// Pixels a card must travel before a press becomes a drag
    pub drag_threshold_px: i32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            read_attempts: 3,
            retry_delay_ms: 500,
            log_level: LevelFilter::Info,
            log_buffer: console_logger::DEFAULT_CAPACITY,
            drag_threshold_px: leptos_dragdrop::DRAG_THRESHOLD_PX,
        }
    }
}

impl AppConfig {
    /// Configuration baked in at compile time
    pub fn from_build_env() -> (Self, Vec<ConfigError>) {
        Self::from_lookup(|name| match name {
            "TASKBOARD_API_URL" => option_env!("TASKBOARD_API_URL"),
            "TASKBOARD_READ_ATTEMPTS" => option_env!("TASKBOARD_READ_ATTEMPTS"),
            "TASKBOARD_RETRY_DELAY_MS" => option_env!("TASKBOARD_RETRY_DELAY_MS"),
            "TASKBOARD_LOG" => option_env!("TASKBOARD_LOG"),
            "TASKBOARD_LOG_BUFFER" => option_env!("TASKBOARD_LOG_BUFFER"),
            _ => None,
        })
    }

    /// Build from a variable lookup, collecting the values that were rejected
    pub fn from_lookup<'a>(lookup: impl Fn(&str) -> Option<&'a str>) -> (Self, Vec<ConfigError>) {
        let mut config = Self::default();
        let mut errors = Vec::new();

        if let Some(url) = lookup("TASKBOARD_API_URL") {
            config.api_base_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(raw) = lookup("TASKBOARD_READ_ATTEMPTS") {
            match raw.trim().parse::<u32>() {
                Ok(n) if n >= 1 => config.read_attempts = n,
                _ => errors.push(invalid("TASKBOARD_READ_ATTEMPTS", raw)),
            }
        }
        if let Some(raw) = lookup("TASKBOARD_RETRY_DELAY_MS") {
            match raw.trim().parse::<u32>() {
                Ok(n) => config.retry_delay_ms = n,
                Err(_) => errors.push(invalid("TASKBOARD_RETRY_DELAY_MS", raw)),
            }
        }
        if let Some(raw) = lookup("TASKBOARD_LOG") {
            match raw.trim().parse::<LevelFilter>() {
                Ok(level) => config.log_level = level,
                Err(_) => errors.push(invalid("TASKBOARD_LOG", raw)),
            }
        }
        if let Some(raw) = lookup("TASKBOARD_LOG_BUFFER") {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.log_buffer = n,
                _ => errors.push(invalid("TASKBOARD_LOG_BUFFER", raw)),
            }
        }

        (config, errors)
    }

    /// Fill in the page's own origin when no API origin was configured
    pub fn resolve_base_url(&mut self, page_origin: &str) {
        if self.api_base_url.is_empty() {
            self.api_base_url = page_origin.trim_end_matches('/').to_string();
        }
    }
}

fn invalid(name: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid { name, value: value.to_string() }
}
