use crate::config::Config;
use crate::error::{AvatarError, Result};
use chrono::{DateTime, Utc};
use colored::*;
use log::{Level, LevelFilter, Metadata, Record};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::{Duration, Instant};

static AVATAR_LOGGER: Lazy<AvatarLogger> = Lazy::new(AvatarLogger::new);

pub fn init() -> Result<()> {
    init_with_config(LoggerConfig::default())
}

pub fn init_with_config(config: LoggerConfig) -> Result<()> {
    let max_level = config.min_level;
    AVATAR_LOGGER.update_config(config);

    log::set_logger(&*AVATAR_LOGGER)
        .map_err(|e| AvatarError::Config(format!("Failed to set logger: {:?}", e)))?;
    log::set_max_level(max_level);
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub target: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl LogEntry {
    fn from_record(record: &Record) -> Self {
        Self {
            timestamp: Utc::now(),
            level: record.level().as_str().to_string(),
            target: record.target().to_string(),
            message: record.args().to_string(),
            location: record
                .file()
                .map(|file| format!("{}:{}", file, record.line().unwrap_or(0))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub min_level: LevelFilter,
    pub show_colors: bool,
    pub show_location: bool,
    pub timestamp_format: String,
    pub output_json: bool,
    pub log_file_path: Option<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LevelFilter::Info,
            show_colors: true,
            show_location: false,
            timestamp_format: "%Y-%m-%d %H:%M:%S%.3f".to_string(),
            output_json: false,
            log_file_path: None,
        }
    }
}

impl LoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.min_level = level;
        self
    }

    pub fn with_file_output(mut self, path: &str) -> Self {
        self.log_file_path = Some(path.to_string());
        self
    }

    /// JSON lines, no colors; what a log shipper wants.
    pub fn production() -> Self {
        Self {
            show_colors: false,
            output_json: true,
            ..Default::default()
        }
    }

    pub fn development() -> Self {
        Self {
            min_level: LevelFilter::Debug,
            show_location: true,
            ..Default::default()
        }
    }

    pub fn for_server(config: &Config) -> Self {
        if config.json_logs {
            Self::production()
        } else {
            Self::default()
        }
    }
}

pub struct AvatarLogger {
    config: Mutex<LoggerConfig>,
    log_file: Mutex<Option<File>>,
}

impl AvatarLogger {
    fn new() -> Self {
        Self {
            config: Mutex::new(LoggerConfig::default()),
            log_file: Mutex::new(None),
        }
    }

    fn update_config(&self, new_config: LoggerConfig) {
        if let Some(path) = &new_config.log_file_path {
            match OpenOptions::new().create(true).append(true).open(path) {
                Ok(file) => {
                    if let Ok(mut log_file) = self.log_file.lock() {
                        *log_file = Some(file);
                    }
                }
                Err(e) => eprintln!("Could not open log file {}: {}", path, e),
            }
        }
        if let Ok(mut config) = self.config.lock() {
            *config = new_config;
        }
    }

    fn format_line(&self, entry: &LogEntry, level: Level, config: &LoggerConfig) -> String {
        let timestamp = entry.timestamp.format(&config.timestamp_format).to_string();
        let mut line = if config.show_colors {
            format!(
                "{} [{}] {}: {}",
                timestamp.bright_black(),
                format!("{:<5}", entry.level).color(level_color(level)).bold(),
                entry.target.bright_blue(),
                entry.message
            )
        } else {
            format!(
                "{} [{:<5}] {}: {}",
                timestamp, entry.level, entry.target, entry.message
            )
        };

        if config.show_location {
            if let Some(location) = &entry.location {
                line.push_str(&format!(" ({})", location));
            }
        }
        line
    }
}

fn level_color(level: Level) -> Color {
    match level {
        Level::Trace => Color::Cyan,
        Level::Debug => Color::Blue,
        Level::Info => Color::Green,
        Level::Warn => Color::Yellow,
        Level::Error => Color::Red,
    }
}

impl log::Log for AvatarLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.config
            .lock()
            .map(|config| metadata.level() <= config.min_level)
            .unwrap_or(true)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let Ok(config) = self.config.lock() else {
            return;
        };

        let entry = LogEntry::from_record(record);
        let line = if config.output_json {
            serde_json::to_string(&entry).unwrap_or_default()
        } else {
            self.format_line(&entry, record.level(), &config)
        };

        if record.level() <= Level::Warn {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }

        if let Ok(mut file) = self.log_file.lock() {
            if let Some(file) = file.as_mut() {
                let plain = if config.output_json {
                    line
                } else {
                    let plain_config = LoggerConfig {
                        show_colors: false,
                        ..config.clone()
                    };
                    self.format_line(&entry, record.level(), &plain_config)
                };
                let _ = writeln!(file, "{}", plain);
            }
        }
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
        if let Ok(mut file) = self.log_file.lock() {
            if let Some(file) = file.as_mut() {
                let _ = file.flush();
            }
        }
    }
}

/// Logs how long a named operation took when it is dropped.
pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn new(name: &str) -> Self {
        log::debug!("Starting timer: {}", name);
        Self {
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        log::info!("{} completed in {}ms", self.name, self.elapsed().as_millis());
    }
}

pub fn log_startup_info(app_name: &str, version: &str, config: &Config) {
    log::info!("Starting {} v{}", app_name, version);
    log::info!("Listening on http://{}:{}", config.host, config.port);
}

/// Prints the effective settings; the key itself is never logged.
pub fn log_config_info(config: &Config) {
    log::info!("Configuration loaded:");
    log::info!("   Public dir: {}", config.public_dir.display());
    log::info!(
        "   Server API key: {}",
        if config.credentials.has_key() { "configured" } else { "not set (clients supply their own)" }
    );
    log::info!(
        "   Server API base: {}",
        config.credentials.api_base.as_deref().unwrap_or("not set")
    );
    log::info!("   Max body: {} bytes", config.max_body_bytes);
    log::info!("   Upstream timeout: {}s", config.request_timeout.as_secs());
}
