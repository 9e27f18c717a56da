//! Top-level panic boundary wired into the logging pipeline

use std::panic;

use crate::logging::Logger;

/// Log unhandled panics at FATAL through `logger` before the previously
/// installed hook (normally the default stderr printer) runs.
///
/// Call this after the session is initialized so the record reaches the
/// configured handlers rather than the console-only fallback.
pub fn install_panic_hook(logger: Logger) {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let message = info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unhandled panic".to_string());
        match info.location() {
            Some(location) => logger.fatal(&format!(
                "panic at {}:{}: {message}",
                location.file(),
                location.line()
            )),
            None => logger.fatal(&format!("panic: {message}")),
        }
        previous(info);
    }));
}
