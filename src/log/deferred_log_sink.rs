use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::log::{log_record::Record, log_sink::LogSink};

/// Sink whose real target is attached later, exactly once.
///
/// Until [`set`](Self::set) is called, records are buffered in arrival order
/// (bounded only by memory). `set` replays the buffer into the target and frees
/// it; afterwards every `emit` goes straight to the target without touching the
/// buffer lock.
///
/// The target is published only after the replay finished, so buffered records
/// always reach it before any record forwarded directly.
#[derive(Default)]
pub struct DeferredLogSink {
    target: OnceLock<Arc<dyn LogSink>>,
    pending: Mutex<Vec<Record>>,
}

impl DeferredLogSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches the real sink and replays everything buffered so far.
    ///
    /// # Panics
    ///
    /// Panics if a target has already been attached.
    pub fn set(&self, sink: Box<dyn LogSink>) {
        let sink: Arc<dyn LogSink> = Arc::from(sink);
        let mut pending = self.pending.lock();
        assert!(
            self.target.get().is_none(),
            "deferred logger has already been set and can only be set once"
        );
        for record in pending.iter() {
            sink.emit(record);
        }
        // Publishing while still holding the lock makes racing emits either
        // land in `pending` before the replay or see the target afterwards.
        let _ = self.target.set(sink);
        *pending = Vec::new();
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.target.get().is_some()
    }

    /// Number of records waiting for a target.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }
}

impl LogSink for DeferredLogSink {
    fn emit(&self, record: &Record) {
        if let Some(target) = self.target.get() {
            target.emit(record);
            return;
        }

        let mut pending = self.pending.lock();
        // `set` may have completed between the check above and taking the lock.
        match self.target.get() {
            Some(target) => {
                drop(pending);
                target.emit(record);
            }
            None => pending.push(record.clone()),
        }
    }

    fn finish(&self) {
        if let Some(target) = self.target.get() {
            target.finish();
        }
    }
}
