use crate::error::{AppError, AppResult};
use std::env;
use std::path::PathBuf;

/// Engine settings needed by the library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Capacity of the event broadcast channel
    pub event_buffer: usize,
    /// Max ids accepted by one scoring or finalization batch
    pub max_batch_size: usize,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub log_level: String,
    pub log_format: LogFormat,
    pub environment: String,
    /// Directory of the JSON-lines audit trail, disabled when unset
    pub audit_log_dir: Option<PathBuf>,
    pub scenario_path: Option<PathBuf>,
}

impl EngineConfig {
    /// Create engine config from environment variables
    pub fn from_env() -> AppResult<Self> {
        let event_buffer = env::var("EVENT_BUFFER")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(1024);

        let max_batch_size = env::var("MAX_BATCH_SIZE")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(100);

        let config = Self {
            event_buffer,
            max_batch_size,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.event_buffer == 0 {
            return Err(AppError::Config(
                "EVENT_BUFFER must be greater than 0".to_string(),
            ));
        }

        if self.max_batch_size == 0 {
            return Err(AppError::Config(
                "MAX_BATCH_SIZE must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_buffer: 1024,
            max_batch_size: 100,
        }
    }
}

impl LogFormat {
    pub fn parse(value: &str) -> AppResult<Self> {
        match value.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(AppError::Config(format!(
                "Invalid LOG_FORMAT: {}. Must be one of: [\"pretty\", \"json\"]",
                other
            ))),
        }
    }
}

impl AppConfig {
    /// Create application config from environment variables
    pub fn from_env() -> AppResult<Self> {
        let engine = EngineConfig::from_env()?;

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_format = env::var("LOG_FORMAT")
            .map(|s| LogFormat::parse(&s))
            .unwrap_or(Ok(LogFormat::Pretty))?;

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let audit_log_dir = env::var("AUDIT_LOG_DIR")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let scenario_path = env::var("SCENARIO_PATH")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        // Validate log level
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&log_level.to_lowercase().as_str()) {
            return Err(AppError::Config(format!(
                "Invalid LOG_LEVEL: {}. Must be one of: {:?}",
                log_level, valid_log_levels
            )));
        }

        // Validate environment
        let valid_environments = ["development", "staging", "production"];
        if !valid_environments.contains(&environment.to_lowercase().as_str()) {
            return Err(AppError::Config(format!(
                "Invalid ENVIRONMENT: {}. Must be one of: {:?}",
                environment, valid_environments
            )));
        }

        Ok(Self {
            engine,
            log_level: log_level.to_lowercase(),
            log_format,
            environment: environment.to_lowercase(),
            audit_log_dir,
            scenario_path,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            environment: "development".to_string(),
            audit_log_dir: None,
            scenario_path: None,
        }
    }
}
