//! Typed view of the `logging` namespace of a merged configuration tree

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default line template. Placeholders: `{timestamp}`, `{level}`,
/// `{logger}`, `{message}`.
pub const DEFAULT_FORMAT: &str = "[{timestamp}] [{level}] [{logger}] {message}";

const DEFAULT_MAX_BYTES: u64 = 10 * 1024 * 1024;

/// Ordered log severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TRACE" => Ok(Level::Trace),
            "DEBUG" => Ok(Level::Debug),
            "INFO" => Ok(Level::Info),
            "WARN" | "WARNING" => Ok(Level::Warn),
            "ERROR" => Ok(Level::Error),
            "FATAL" | "CRITICAL" => Ok(Level::Fatal),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Logging settings with documented defaults for every field.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory holding the rotating log file. Created on configure.
    pub log_dir: PathBuf,
    /// File name prefix: the log file is `{app_name}_{timestamp}.log`.
    pub app_name: String,
    /// Minimum severity emitted by non-excluded loggers.
    pub level: Level,
    /// Line template; ignored when `json_logs` is set.
    pub format: String,
    /// Rotation threshold in megabytes; wins over `max_bytes` when both
    /// are present.
    pub max_megabytes: Option<u64>,
    /// Rotation threshold in bytes.
    pub max_bytes: Option<u64>,
    /// Number of rotated files retained beyond the current one.
    pub backup_count: u32,
    /// Literal date segment for the file name; derived from today's date in
    /// the configured timezone when absent.
    pub timestamp: Option<String>,
    /// Emit one JSON object per record instead of the line template.
    pub json_logs: bool,
    /// IANA zone name used to render timestamps; unknown names fall back
    /// to UTC.
    pub timezone: String,
    /// Route records through an unbounded queue drained by a single
    /// background listener.
    pub async_logging: bool,
    /// Logger names (subtrees) clamped to WARN with propagation disabled.
    pub exclude_loggers: BTreeSet<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("./log"),
            app_name: "app".to_string(),
            level: Level::Info,
            format: DEFAULT_FORMAT.to_string(),
            max_megabytes: None,
            max_bytes: None,
            backup_count: 5,
            timestamp: None,
            json_logs: false,
            timezone: "UTC".to_string(),
            async_logging: false,
            exclude_loggers: BTreeSet::new(),
        }
    }
}

impl LoggingConfig {
    /// Extract and validate the `logging` section of a merged tree.
    /// A missing or empty section yields the defaults.
    pub fn from_value(root: &serde_yaml::Value) -> Result<Self> {
        let cfg = match root.get("logging") {
            None | Some(serde_yaml::Value::Null) => Self::default(),
            Some(section) => serde_yaml::from_value(section.clone())
                .map_err(|e| Error::InvalidConfig(e.to_string()))?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Effective rotation threshold in bytes.
    pub fn rotation_threshold(&self) -> u64 {
        match (self.max_megabytes, self.max_bytes) {
            (Some(mb), _) => mb * 1024 * 1024,
            (None, Some(bytes)) => bytes,
            (None, None) => DEFAULT_MAX_BYTES,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.rotation_threshold() == 0 {
            return Err(Error::InvalidConfig(
                "rotation threshold must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
