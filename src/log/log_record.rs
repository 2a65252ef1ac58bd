use std::fmt::{self, Write};

use crate::log::{log_color::LogColor, log_level::LogLevel};

/// Maximum length in bytes of the subsystem tag.
pub const MAX_SYSTEM_LEN: usize = 31;

/// Maximum length in bytes of a rendered line, prefix included.
pub const MAX_LINE_LEN: usize = 4095;

/// `strftime` layout of [`Record::timestamp`]; always 19 characters wide.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Represents a single formatted log line.
///
/// A `Record` is built once on the emitting thread and never mutated afterwards,
/// so sinks can clone it freely into queues or buffers owned by other threads.
///
/// The rendered line has the layout `[<timestamp>][<system>]: <message>`.
/// Both the subsystem tag and the line are silently truncated to
/// [`MAX_SYSTEM_LEN`] and [`MAX_LINE_LEN`] bytes, always on a char boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    level: LogLevel,
    color: Option<LogColor>,
    timestamp: String,
    system: String,
    line: String,
    message_offset: usize,
}

impl Record {
    /// Creates a new `Record` stamped with the current local time.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sinklog::log::{log_level::LogLevel, log_record::Record};
    ///
    /// let record = Record::new(LogLevel::Info, "net", None, format_args!("{} peers", 3));
    /// assert_eq!(record.message(), "3 peers");
    /// assert_eq!(record.system(), "net");
    /// ```
    #[must_use]
    pub fn new(
        level: LogLevel,
        system: &str,
        color: Option<LogColor>,
        args: fmt::Arguments<'_>,
    ) -> Self {
        let timestamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
        Self::with_timestamp(level, system, color, timestamp, args)
    }

    /// Creates a `Record` with an explicit timestamp string.
    #[must_use]
    pub fn with_timestamp(
        level: LogLevel,
        system: &str,
        color: Option<LogColor>,
        timestamp: String,
        args: fmt::Arguments<'_>,
    ) -> Self {
        let system = truncate_to_boundary(system, MAX_SYSTEM_LEN).to_owned();

        let mut out = BoundedWriter::new(MAX_LINE_LEN);
        // BoundedWriter never reports an error; overflow is dropped.
        let _ = write!(out, "[{timestamp}][{system}]: ");
        let message_offset = out.buf.len();
        let _ = out.write_fmt(args);

        Self {
            level,
            color,
            timestamp,
            system,
            line: out.buf,
            message_offset,
        }
    }

    #[must_use]
    pub fn level(&self) -> LogLevel {
        self.level
    }

    #[must_use]
    pub fn color(&self) -> Option<LogColor> {
        self.color
    }

    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    #[must_use]
    pub fn system(&self) -> &str {
        &self.system
    }

    /// The full rendered line, prefix included, without a trailing newline.
    #[must_use]
    pub fn line(&self) -> &str {
        &self.line
    }

    /// The message part of the line, after the `[timestamp][system]: ` prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.line[self.message_offset..]
    }
}

fn truncate_to_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// `fmt::Write` adapter that keeps at most `limit` bytes and drops the rest.
struct BoundedWriter {
    buf: String,
    limit: usize,
}

impl BoundedWriter {
    fn new(limit: usize) -> Self {
        Self {
            buf: String::with_capacity(128),
            limit,
        }
    }
}

impl Write for BoundedWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = self.limit - self.buf.len();
        if room > 0 {
            self.buf.push_str(truncate_to_boundary(s, room));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    fn record(system: &str, args: fmt::Arguments<'_>) -> Record {
        Record::with_timestamp(
            LogLevel::Info,
            system,
            None,
            "2024-01-02 03:04:05".to_owned(),
            args,
        )
    }

    #[test]
    fn line_has_timestamp_and_system_prefix() {
        let r = record("test", format_args!("hello {}", 42));
        assert_eq!(r.line(), "[2024-01-02 03:04:05][test]: hello 42");
        assert_eq!(r.message(), "hello 42");
        assert_eq!(r.timestamp().len(), 19);
    }

    #[test]
    fn now_timestamp_is_fixed_width() {
        let r = Record::new(LogLevel::Debug, "t", None, format_args!("x"));
        assert_eq!(r.timestamp().len(), 19);
        assert!(r.line().starts_with('['));
    }

    #[test]
    fn oversized_message_is_truncated_not_dropped() {
        let long = "x".repeat(MAX_LINE_LEN * 2);
        let r = record("test", format_args!("{long}"));
        assert_eq!(r.line().len(), MAX_LINE_LEN);
        assert!(r.message().chars().all(|c| c == 'x'));

        let next = record("test", format_args!("short"));
        assert_eq!(next.message(), "short");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // Each 'é' is two bytes, so the limit falls mid-char.
        let long = "é".repeat(MAX_LINE_LEN);
        let r = record("t", format_args!("{long}"));
        assert!(r.line().len() <= MAX_LINE_LEN);
        assert!(r.line().len() >= MAX_LINE_LEN - 1);
        assert!(r.message().chars().all(|c| c == 'é'));
    }

    #[test]
    fn system_tag_is_truncated() {
        let tag = "s".repeat(100);
        let r = record(&tag, format_args!("m"));
        assert_eq!(r.system().len(), MAX_SYSTEM_LEN);
        assert_eq!(r.message(), "m");
    }
}
