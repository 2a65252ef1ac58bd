use std::{
    collections::VecDeque,
    sync::atomic::{AtomicUsize, Ordering},
};

use parking_lot::Mutex;

use crate::log::{log_record::Record, log_sink::LogSink};

/// Bounded in-memory tap for a UI console.
///
/// Records accumulate in a ring of `capacity` entries; once full, the oldest
/// record is recycled and counted as dropped. The UI thread pumps the backlog
/// with [`drain`](Self::drain) at its own pace, so `emit` never waits on it.
pub struct BacklogLogSink {
    pending: Mutex<VecDeque<Record>>,
    capacity: usize,
    dropped: AtomicUsize,
}

impl BacklogLogSink {
    /// A capacity of zero is treated as one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            pending: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
            dropped: AtomicUsize::new(0),
        }
    }

    /// Takes every pending record, oldest first.
    #[must_use]
    pub fn drain(&self) -> Vec<Record> {
        self.pending.lock().drain(..).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Records recycled because the UI did not drain fast enough.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl LogSink for BacklogLogSink {
    fn emit(&self, record: &Record) {
        let mut pending = self.pending.lock();
        if pending.len() == self.capacity {
            pending.pop_front();
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        pending.push_back(record.clone());
    }
}
