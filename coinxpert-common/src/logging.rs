//! Logging for the selection engine
//!
//! Events go through the `log` facade. [`init`] installs an `env_logger`
//! backend that writes one line per record, as plain text or as JSON, to
//! stderr or to a file. Each engine area logs under its own target
//! (`coinxpert::selection`, `coinxpert::comparison`, ...) so output can be
//! filtered with the usual `RUST_LOG` syntax.
//!
//! # Usage
//!
//! ```
//! use coinxpert_common::logging::{self, LogConfig, LogLevel};
//! use serde_json::json;
//!
//! logging::init(&LogConfig::default()).expect("Failed to initialize logging");
//!
//! logging::log_selection(
//!     LogLevel::Info,
//!     "selection_completed",
//!     Some(json!({ "strategy": "core", "inputs": 2 })),
//! );
//! ```

use chrono::Local;
use log::{debug, LevelFilter, Record};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_level(self) -> log::Level {
        match self {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        level.as_level().to_level_filter()
    }
}

/// Engine area an event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogContext {
    Selection,
    Comparison,
    Simulation,
    Config,
    /// Request decoding and response encoding
    Boundary,
}

impl LogContext {
    /// `log` target used for events in this area
    pub fn target(self) -> &'static str {
        match self {
            LogContext::Selection => "coinxpert::selection",
            LogContext::Comparison => "coinxpert::comparison",
            LogContext::Simulation => "coinxpert::simulation",
            LogContext::Config => "coinxpert::config",
            LogContext::Boundary => "coinxpert::boundary",
        }
    }
}

/// Line layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// The `[logging]` section of the configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
    /// Append to this file instead of writing to stderr
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
    pub timestamps: bool,
    pub source_location: bool,
    pub format: LogFormat,
    /// Suppress stderr output; a configured log file still receives records
    pub quiet: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            log_file: None,
            timestamps: true,
            source_location: false,
            format: LogFormat::Text,
            quiet: false,
        }
    }
}

impl LogConfig {
    /// Maximum level that will actually be written
    pub fn effective_filter(&self) -> LevelFilter {
        if self.quiet && self.log_file.is_none() {
            LevelFilter::Off
        } else {
            self.level.into()
        }
    }
}

/// Renders a record as a single output line
#[derive(Debug, Clone, Copy)]
struct LineFormat {
    timestamps: bool,
    source_location: bool,
    format: LogFormat,
}

impl From<&LogConfig> for LineFormat {
    fn from(config: &LogConfig) -> Self {
        Self {
            timestamps: config.timestamps,
            source_location: config.source_location,
            format: config.format,
        }
    }
}

impl LineFormat {
    fn render(&self, record: &Record) -> String {
        let timestamp = self
            .timestamps
            .then(|| Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string());
        let location = if self.source_location {
            record
                .file()
                .map(|file| format!("{}:{}", file, record.line().unwrap_or(0)))
        } else {
            None
        };

        match self.format {
            LogFormat::Json => {
                let mut line = json!({
                    "level": record.level().to_string(),
                    "target": record.target(),
                    "message": record.args().to_string(),
                });
                if let Some(timestamp) = timestamp {
                    line["timestamp"] = Value::String(timestamp);
                }
                if let Some(location) = location {
                    line["location"] = Value::String(location);
                }
                line.to_string()
            }
            LogFormat::Text => {
                let mut line = String::new();
                if let Some(timestamp) = timestamp {
                    line.push_str(&timestamp);
                    line.push(' ');
                }
                line.push_str(&format!("{:<5} [{}", record.level(), record.target()));
                if let Some(location) = location {
                    line.push(' ');
                    line.push_str(&location);
                }
                line.push_str(&format!("] {}", record.args()));
                line
            }
        }
    }
}

static LOGGER: OnceLock<Result<(), String>> = OnceLock::new();

/// Install the global logger
///
/// Only the first call has any effect; later calls return its outcome. If
/// another logger is already installed (a test harness, an embedding
/// application) it is left in place.
pub fn init(config: &LogConfig) -> Result<(), String> {
    LOGGER.get_or_init(|| install(config)).clone()
}

fn install(config: &LogConfig) -> Result<(), String> {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(config.effective_filter());

    let line = LineFormat::from(config);
    builder.format(move |buf, record| writeln!(buf, "{}", line.render(record)));

    if let Some(path) = &config.log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| format!("Failed to open log file {}: {}", path, e))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    if let Err(e) = builder.try_init() {
        debug!("Keeping the existing logger: {}", e);
    }
    Ok(())
}

fn log_event(level: LogLevel, context: LogContext, event: &str, fields: Option<Value>) {
    let target = context.target();
    match fields {
        Some(fields) => log::log!(target: target, level.as_level(), "{} {}", event, fields),
        None => log::log!(target: target, level.as_level(), "{}", event),
    }
}

pub fn log_selection(level: LogLevel, event: &str, fields: Option<Value>) {
    log_event(level, LogContext::Selection, event, fields);
}

pub fn log_comparison(level: LogLevel, event: &str, fields: Option<Value>) {
    log_event(level, LogContext::Comparison, event, fields);
}

pub fn log_simulation(level: LogLevel, event: &str, fields: Option<Value>) {
    log_event(level, LogContext::Simulation, event, fields);
}

pub fn log_config(level: LogLevel, event: &str, fields: Option<Value>) {
    log_event(level, LogContext::Config, event, fields);
}

pub fn log_boundary(level: LogLevel, event: &str, fields: Option<Value>) {
    log_event(level, LogContext::Boundary, event, fields);
}

/// Build a JSON object of string fields for the `log_*` helpers
pub fn log_params(params: Vec<(&str, String)>) -> Value {
    let fields: Map<String, Value> = params
        .into_iter()
        .map(|(name, value)| (name.to_string(), Value::String(value)))
        .collect();
    Value::Object(fields)
}
