use std::sync::Arc;

use crate::log::{log_record::Record, log_sink::LogSink};

/// Broadcasts every record to its children in registration order.
///
/// Children are shared, so the same sink may also be held elsewhere (e.g. a
/// console sink kept around to adjust its filter). A panicking child is not
/// isolated: the panic propagates and later children miss that record.
pub struct CollectionLogSink {
    sinks: Vec<Arc<dyn LogSink>>,
}

impl CollectionLogSink {
    #[must_use]
    pub fn new(sinks: Vec<Arc<dyn LogSink>>) -> Self {
        Self { sinks }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl LogSink for CollectionLogSink {
    fn emit(&self, record: &Record) {
        for sink in &self.sinks {
            sink.emit(record);
        }
    }

    fn finish(&self) {
        for sink in &self.sinks {
            sink.finish();
        }
    }
}
