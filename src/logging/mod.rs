//! Logging pipeline
//!
//! Formatter (template or JSON, timezone-aware), console + size-rotating
//! file handlers, and an optional queue/listener bridge that decouples
//! producer threads from handler I/O.

pub mod config;
pub mod format;
pub mod pipeline;
pub mod rotate;

pub use config::{Level, LoggingConfig};
pub use format::{Formatter, LogRecord};
pub use pipeline::{Logger, LoggingPipeline};
pub use rotate::RotatingFileWriter;
