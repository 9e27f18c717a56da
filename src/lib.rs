//! session-kit: layered configuration merging and a rotating, timezone-aware
//! logging pipeline behind an explicit session facade.
//!
//! Three pieces:
//!
//! - [`ConfigSources`] loads YAML/TOML layers (package default, user home,
//!   working directory, explicit path) and merges them right-biased into one
//!   tree.
//! - [`LoggingPipeline`] formats records (line template or JSON, rendered in
//!   a configured IANA timezone), writes them through console and
//!   size-rotating file handlers, and can decouple producers from handler
//!   I/O with an unbounded queue drained by a single background listener.
//! - [`Session`] ties the two together: one-time initialization, logger
//!   lookup, flush-on-stop, and reset for test isolation.
//!
//! # Quick start
//!
//! ```no_run
//! use session_kit::{ConfigSources, Session};
//!
//! let session = Session::new();
//! session.initialize(&ConfigSources::for_app("svc").explicit_path("./svc.yaml"))?;
//!
//! let log = session.get_logger("svc.startup");
//! log.info("service starting");
//!
//! // Flushes the file handler and drains the async listener, if enabled.
//! session.stop_logging();
//! # Ok::<(), session_kit::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod hook;
pub mod logging;
pub mod session;

pub use config::{merge_values, ConfigSources};
pub use error::{Error, Result};
pub use hook::install_panic_hook;
pub use logging::{Formatter, Level, LogRecord, Logger, LoggingConfig, LoggingPipeline};
pub use session::Session;
