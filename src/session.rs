//! Explicit session facade over config merging and the logging pipeline

use std::sync::{Mutex, MutexGuard};

use serde_yaml::Value;

use crate::config::ConfigSources;
use crate::error::Result;
use crate::logging::{Logger, LoggingConfig, LoggingPipeline};

/// One-time initialization of configuration and logging, shared by
/// reference across an application.
///
/// This is an explicit object rather than a process-wide singleton:
/// construct one, pass it to whatever needs config or loggers, and call
/// [`Session::initialize`] once. Repeated initialization is a no-op (first
/// configuration wins), `reset` returns to the uninitialized state for test
/// isolation, and `stop_logging` flushes the pipeline.
pub struct Session {
    state: Mutex<SessionState>,
    /// Console-only pipeline backing logger lookups before initialization.
    fallback: LoggingPipeline,
}

#[derive(Default)]
struct SessionState {
    config: Option<Value>,
    pipeline: Option<LoggingPipeline>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SessionState::default()),
            fallback: LoggingPipeline::console_only(),
        }
    }

    /// Merge the configured sources, derive the logging configuration from
    /// the `logging` namespace, and build the pipeline.
    ///
    /// Safe under concurrent first-call races; the losing caller sees the
    /// no-op path. On failure no handler state is installed and the session
    /// stays uninitialized, so a later call may retry.
    pub fn initialize(&self, sources: &ConfigSources) -> Result<()> {
        let mut state = self.lock();
        if let Some(pipeline) = &state.pipeline {
            pipeline
                .get_logger("session")
                .warn("session already initialized; ignoring repeated initialize call");
            return Ok(());
        }

        let merged = sources.load()?;
        let logging_cfg = LoggingConfig::from_value(&merged)?;
        let pipeline = LoggingPipeline::configure(&logging_cfg)?;

        state.config = Some(merged);
        state.pipeline = Some(pipeline);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.lock().pipeline.is_some()
    }

    /// The merged configuration tree, or `None` before initialization.
    pub fn get_config(&self) -> Option<Value> {
        self.lock().config.clone()
    }

    /// Logger lookup. Before initialization this returns a handle backed by
    /// a console-only pipeline at INFO instead of failing.
    pub fn get_logger(&self, name: &str) -> Logger {
        let state = self.lock();
        match &state.pipeline {
            Some(pipeline) => pipeline.get_logger(name),
            None => self.fallback.get_logger(name),
        }
    }

    /// Flush the pipeline, draining the async listener if one is running.
    /// Valid in either state and idempotent.
    pub fn stop_logging(&self) {
        if let Some(pipeline) = &self.lock().pipeline {
            pipeline.stop();
        }
    }

    /// Unconditionally return to the uninitialized state, discarding the
    /// cached configuration and pipeline so the next `initialize` re-runs
    /// resolution from scratch. Callers that care about flushing call
    /// [`Session::stop_logging`] first.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.config = None;
        state.pipeline = None;
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
