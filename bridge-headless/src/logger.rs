//! Logger sink printing to stdout.

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    logging::{LogEntry, LogLevel, LoggerSink},
};

/// Prints forwarded log entries, one line per entry plus a field line.
#[derive(Debug, Clone)]
pub struct ConsoleLogger {
    pub min_level: LogLevel,
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
        }
    }
}

impl ConsoleLogger {
    pub fn with_min_level(min_level: LogLevel) -> Self {
        Self { min_level }
    }

    fn format(entry: &LogEntry) -> String {
        let mut line = format!(
            "[{}] {} {}: {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            entry.level.as_str().to_uppercase(),
            entry.target,
            entry.message
        );
        if let Some(span) = &entry.span_id {
            line.push_str(&format!(" (in {})", span));
        }
        line
    }
}

#[async_trait]
impl LoggerSink for ConsoleLogger {
    async fn log(&self, entry: LogEntry) -> Result<()> {
        if entry.level >= self.min_level {
            println!("{}", Self::format(&entry));

            if !entry.fields.is_empty() {
                println!("  Fields: {:?}", entry.fields);
            }
        }
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        self.min_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn console_logger_accepts_entries() {
        let logger = ConsoleLogger::with_min_level(LogLevel::Debug);
        let entry = LogEntry::new(LogLevel::Info, "core_playback", "Queue updated")
            .with_field("len", "3");

        logger.log(entry).await.unwrap();
        assert_eq!(logger.min_level(), LogLevel::Debug);
    }

    #[test]
    fn format_includes_level_and_span() {
        let entry = LogEntry::new(LogLevel::Warn, "core_notification", "Post failed")
            .with_span_id("update_state");
        let line = ConsoleLogger::format(&entry);
        assert!(line.contains("WARN core_notification: Post failed"));
        assert!(line.ends_with("(in update_state)"));
    }
}
