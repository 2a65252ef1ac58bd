use std::sync::Arc;

use crate::log::log_record::Record;

/// A backend that consumes formatted log records.
///
/// `emit` must never fail in a way that reaches the caller; delivery is
/// best-effort. `finish` drains whatever the sink still holds and is called
/// during orderly shutdown.
pub trait LogSink: Send + Sync {
    fn emit(&self, record: &Record);

    fn finish(&self) {}
}

impl<T: LogSink + ?Sized> LogSink for Arc<T> {
    #[inline]
    fn emit(&self, record: &Record) {
        (**self).emit(record);
    }

    #[inline]
    fn finish(&self) {
        (**self).finish();
    }
}

impl<T: LogSink + ?Sized> LogSink for Box<T> {
    #[inline]
    fn emit(&self, record: &Record) {
        (**self).emit(record);
    }

    #[inline]
    fn finish(&self) {
        (**self).finish();
    }
}
