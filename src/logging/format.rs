//! Record formatting with timezone-aware timestamps

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde_json::json;

use super::config::Level;

/// A single log record captured at the call site. The timestamp is a UTC
/// instant; rendering into the configured zone happens in the formatter.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub logger: String,
    pub message: String,
}

impl LogRecord {
    pub fn new(level: Level, logger: &str, message: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            logger: logger.to_string(),
            message: message.to_string(),
        }
    }
}

/// Renders records either through a line template or as JSON objects.
///
/// Timestamps are always rendered in the formatter's zone, independent of
/// the host clock's local zone.
#[derive(Debug, Clone)]
pub struct Formatter {
    template: Option<String>,
    tz: Tz,
}

impl Formatter {
    /// Template mode. Placeholders `{timestamp}`, `{level}`, `{logger}` and
    /// `{message}` are substituted; anything else is copied verbatim.
    pub fn template(template: &str, tz: Tz) -> Self {
        Self {
            template: Some(template.to_string()),
            tz,
        }
    }

    /// JSON mode: one object per record with `timestamp`, `level`,
    /// `logger_name` and `message` fields.
    pub fn json(tz: Tz) -> Self {
        Self { template: None, tz }
    }

    /// Render one record as a single line without a trailing newline.
    pub fn format(&self, record: &LogRecord) -> String {
        let timestamp = record
            .timestamp
            .with_timezone(&self.tz)
            .format("%Y-%m-%d %H:%M:%S%.3f")
            .to_string();
        match &self.template {
            Some(template) => template
                .replace("{timestamp}", &timestamp)
                .replace("{level}", record.level.as_str())
                .replace("{logger}", &record.logger)
                .replace("{message}", &record.message),
            None => json!({
                "timestamp": timestamp,
                "level": record.level.as_str(),
                "logger_name": record.logger,
                "message": record.message,
            })
            .to_string(),
        }
    }
}
