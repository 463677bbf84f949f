//! Outcome loggers for the setup pipeline.

use std::sync::{Mutex, PoisonError};

/// Append-only sink for setup outcome messages.
pub trait Logger {
    fn log_message(&self, message: &str);

    fn log_messages(&self, messages: &[String]) {
        for message in messages {
            self.log_message(message);
        }
    }
}

impl<L: Logger + ?Sized> Logger for &L {
    fn log_message(&self, message: &str) {
        (**self).log_message(message);
    }
}

/// Forwards every message to `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log_message(&self, message: &str) {
        tracing::info!(target: "blockgate::setup", "{message}");
    }
}

/// Keeps messages in memory so callers can inspect them afterwards.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    logs: Mutex<Vec<String>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages logged so far, oldest first.
    pub fn logs(&self) -> Vec<String> {
        self.logs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Logger for MemoryLogger {
    fn log_message(&self, message: &str) {
        self.logs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_logger_keeps_order() {
        let logger = MemoryLogger::new();
        logger.log_message("first");
        logger.log_messages(&["second".to_string(), "third".to_string()]);
        assert_eq!(logger.logs(), vec!["first", "second", "third"]);
    }

    #[test]
    fn logger_by_reference_writes_through() {
        let logger = MemoryLogger::new();
        let by_ref = &logger;
        by_ref.log_message("hello");
        assert_eq!(logger.logs(), vec!["hello"]);
    }
}
