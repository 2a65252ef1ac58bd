use std::sync::{
    Arc,
    atomic::{AtomicU8, Ordering},
};

use crate::log::{log_level::LogLevel, log_record::Record, log_sink::LogSink};

/// Forwards records at or above a level that can be changed at runtime.
pub struct FilterLogSink {
    inner: Arc<dyn LogSink>,
    min_level: AtomicU8,
}

impl FilterLogSink {
    #[must_use]
    pub fn new(inner: Arc<dyn LogSink>, min_level: LogLevel) -> Self {
        Self {
            inner,
            min_level: AtomicU8::new(min_level.to_u8()),
        }
    }

    #[must_use]
    pub fn min_level(&self) -> LogLevel {
        LogLevel::from_u8(self.min_level.load(Ordering::Relaxed))
    }

    pub fn set_min_level(&self, level: LogLevel) {
        self.min_level.store(level.to_u8(), Ordering::Relaxed);
    }
}

impl LogSink for FilterLogSink {
    fn emit(&self, record: &Record) {
        if record.level() >= self.min_level() {
            self.inner.emit(record);
        }
    }

    fn finish(&self) {
        self.inner.finish();
    }
}
