//! Handler composition, logger handles, and the async queue/listener bridge

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{mpsc, Arc, Mutex, MutexGuard};
use std::thread;

use chrono::Utc;
use chrono_tz::Tz;

use crate::error::{Error, Result};
use crate::logging::config::{Level, LoggingConfig};
use crate::logging::format::{Formatter, LogRecord};
use crate::logging::rotate::RotatingFileWriter;

/// Console handler plus optional rotating file handler sharing one
/// formatter. The file handler is absent only for the pre-initialization
/// fallback pipeline.
struct HandlerSet {
    formatter: Formatter,
    file: Option<RotatingFileWriter>,
}

impl HandlerSet {
    fn dispatch(&mut self, record: &LogRecord) -> Result<()> {
        let line = self.formatter.format(record);
        {
            // Unbuffered console handler: lock once per record so lines from
            // concurrent callers never interleave mid-line.
            let mut stdout = io::stdout().lock();
            stdout.write_all(line.as_bytes())?;
            stdout.write_all(b"\n")?;
            stdout.flush()?;
        }
        if let Some(file) = self.file.as_mut() {
            file.write_line(&line)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

enum Command {
    Record(LogRecord),
    Shutdown,
}

/// Background listener for async mode: drains the queue in FIFO order and
/// performs all handler I/O. Exits on the shutdown sentinel or when every
/// sender is gone.
struct Listener {
    receiver: Receiver<Command>,
    handlers: HandlerSet,
}

impl Listener {
    fn run(mut self) {
        while let Ok(command) = self.receiver.recv() {
            match command {
                Command::Record(record) => {
                    if let Err(e) = self.handlers.dispatch(&record) {
                        eprintln!("log listener: dropping record: {e}");
                    }
                }
                Command::Shutdown => break,
            }
        }
        if let Err(e) = self.handlers.flush() {
            eprintln!("log listener: flush on shutdown failed: {e}");
        }
    }
}

enum Sink {
    /// Synchronous mode: callers write directly through the shared,
    /// mutex-serialized handler set.
    Direct(Mutex<HandlerSet>),
    /// Asynchronous mode: callers enqueue; the listener owns the handlers.
    Queued(Sender<Command>),
}

struct PipelineShared {
    level: Level,
    exclude: BTreeSet<String>,
    sink: Sink,
}

impl PipelineShared {
    fn is_excluded(&self, name: &str) -> bool {
        self.exclude.iter().any(|excluded| {
            name == excluded
                || name
                    .strip_prefix(excluded.as_str())
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }
}

/// A configured handler chain for one logging namespace.
///
/// Each `configure` call builds a fresh pipeline; deduplicating repeated
/// configuration is the session's responsibility.
pub struct LoggingPipeline {
    shared: Arc<PipelineShared>,
    listener: Mutex<Option<thread::JoinHandle<()>>>,
}

impl LoggingPipeline {
    /// Build handlers (and, in async mode, the queue and listener) from a
    /// validated configuration.
    ///
    /// All-or-nothing: directory-creation and file-open failures propagate
    /// before any handler state is installed. An unknown timezone is not
    /// fatal; it falls back to UTC and a warning is emitted through the
    /// freshly built pipeline.
    pub fn configure(cfg: &LoggingConfig) -> Result<Self> {
        fs::create_dir_all(&cfg.log_dir).map_err(|e| Error::CreateDir {
            path: cfg.log_dir.clone(),
            source: e,
        })?;

        let (tz, tz_fallback) = match cfg.timezone.parse::<Tz>() {
            Ok(tz) => (tz, false),
            Err(_) => (chrono_tz::UTC, true),
        };

        let stamp = match &cfg.timestamp {
            Some(literal) => literal.clone(),
            None => Utc::now().with_timezone(&tz).format("%Y-%m-%d").to_string(),
        };
        let file_path = cfg.log_dir.join(format!("{}_{}.log", cfg.app_name, stamp));

        let formatter = if cfg.json_logs {
            Formatter::json(tz)
        } else {
            Formatter::template(&cfg.format, tz)
        };
        let file = RotatingFileWriter::open(file_path, cfg.rotation_threshold(), cfg.backup_count)?;
        let handlers = HandlerSet {
            formatter,
            file: Some(file),
        };

        let (sink, handle) = if cfg.async_logging {
            let (sender, receiver) = mpsc::channel();
            let listener = Listener { receiver, handlers };
            let handle = thread::Builder::new()
                .name("log-listener".to_string())
                .spawn(move || listener.run())
                .map_err(Error::Listener)?;
            (Sink::Queued(sender), Some(handle))
        } else {
            (Sink::Direct(Mutex::new(handlers)), None)
        };

        let pipeline = Self {
            shared: Arc::new(PipelineShared {
                level: cfg.level,
                exclude: cfg.exclude_loggers.clone(),
                sink,
            }),
            listener: Mutex::new(handle),
        };

        if tz_fallback {
            pipeline.get_logger("logging").warn(&format!(
                "unknown timezone '{}', falling back to UTC",
                cfg.timezone
            ));
        }
        Ok(pipeline)
    }

    /// Console-only pipeline at INFO, used for logger lookups before a
    /// session is initialized.
    pub fn console_only() -> Self {
        let handlers = HandlerSet {
            formatter: Formatter::template(
                crate::logging::config::DEFAULT_FORMAT,
                chrono_tz::UTC,
            ),
            file: None,
        };
        Self {
            shared: Arc::new(PipelineShared {
                level: Level::Info,
                exclude: BTreeSet::new(),
                sink: Sink::Direct(Mutex::new(handlers)),
            }),
            listener: Mutex::new(None),
        }
    }

    /// Cheap, side-effect-free logger lookup. Writes through the handle
    /// route to whatever handler chain this pipeline installed.
    pub fn get_logger(&self, name: &str) -> Logger {
        Logger {
            name: name.to_string(),
            shared: Arc::clone(&self.shared),
        }
    }

    /// Flush and, in async mode, drain the queue and join the listener.
    ///
    /// Everything enqueued before the call is dispatched before `stop`
    /// returns. Idempotent, and a no-op when nothing was started.
    pub fn stop(&self) {
        match &self.shared.sink {
            Sink::Queued(sender) => {
                let handle = lock_unpoisoned(&self.listener).take();
                if let Some(handle) = handle {
                    // The sentinel queues behind every record already sent,
                    // so the join below is a bounded drain.
                    let _ = sender.send(Command::Shutdown);
                    if handle.join().is_err() {
                        eprintln!("log listener: thread panicked before join");
                    }
                }
            }
            Sink::Direct(handlers) => {
                if let Err(e) = lock_unpoisoned(handlers).flush() {
                    eprintln!("logging: flush failed: {e}");
                }
            }
        }
    }
}

impl Drop for LoggingPipeline {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Named handle writing through the pipeline that minted it. Cloneable and
/// cheap; clones share the underlying handler chain.
#[derive(Clone)]
pub struct Logger {
    name: String,
    shared: Arc<PipelineShared>,
}

impl Logger {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Minimum severity this handle emits: the pipeline level, clamped to
    /// WARN for excluded names and their dot-separated descendants.
    pub fn effective_level(&self) -> Level {
        if self.shared.is_excluded(&self.name) {
            Level::Warn
        } else {
            self.shared.level
        }
    }

    pub fn enabled(&self, level: Level) -> bool {
        level >= self.effective_level()
    }

    /// Emit one record, surfacing write and rotation errors in synchronous
    /// mode. In asynchronous mode enqueueing cannot fail while the listener
    /// runs; after shutdown the record is dropped.
    pub fn try_log(&self, level: Level, message: &str) -> Result<()> {
        if self.shared.is_excluded(&self.name) {
            if level < Level::Warn {
                return Ok(());
            }
            // Propagation is disabled for excluded names: WARN and above go
            // to the last-resort stderr stream, never to the handlers.
            eprintln!("[{}] [{}] {}", level, self.name, message);
            return Ok(());
        }
        if level < self.shared.level {
            return Ok(());
        }
        let record = LogRecord::new(level, &self.name, message);
        match &self.shared.sink {
            Sink::Direct(handlers) => lock_unpoisoned(handlers).dispatch(&record),
            Sink::Queued(sender) => {
                let _ = sender.send(Command::Record(record));
                Ok(())
            }
        }
    }

    /// Emit one record, reporting failures to stderr instead of returning
    /// them. Convenience path for call sites that never inspect log errors.
    pub fn log(&self, level: Level, message: &str) {
        if let Err(e) = self.try_log(level, message) {
            eprintln!("logging: failed to emit record from '{}': {e}", self.name);
        }
    }

    pub fn trace(&self, message: &str) {
        self.log(Level::Trace, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(Level::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }

    pub fn fatal(&self, message: &str) {
        self.log(Level::Fatal, message);
    }
}
