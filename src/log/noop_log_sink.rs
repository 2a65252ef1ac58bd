use crate::log::{log_record::Record, log_sink::LogSink};

/// Sink that discards every record.
#[derive(Debug, Clone, Default)]
pub struct NoopLogSink;

impl LogSink for NoopLogSink {
    #[inline]
    fn emit(&self, _record: &Record) {}
}
