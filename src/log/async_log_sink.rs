use std::{
    fs::File,
    io::{self, BufWriter, IsTerminal, Write},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    thread,
};

use bytes::{BufMut, Bytes, BytesMut};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;

use crate::log::{log_color::ANSI_DEFAULT_FOREGROUND, log_record::Record, log_sink::LogSink};

/// How a console sink decides whether to emit ANSI truecolor escapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// Color when `NO_COLOR` is unset and stdout is a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    #[must_use]
    pub fn stdout_enabled(self) -> bool {
        match self {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => {
                std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal()
            }
        }
    }
}

enum Command {
    Write(Bytes),
    /// Drain barrier: acknowledged once everything queued before it is written.
    Flush(Sender<()>),
}

/// Non-blocking sink that owns one output stream and a background writer thread.
///
/// # Architecture
///
/// 1. **Producers**: any thread calls [`emit`](LogSink::emit), which renders the
///    record into one byte buffer (color escape, line, newline).
/// 2. **Queue**: the buffer is pushed onto an unbounded channel while holding the
///    sink's lock, so the output order is the order in which `emit` was called.
/// 3. **Consumer**: a dedicated thread performs the blocking writes and flushes
///    whenever the queue runs empty.
///
/// `finish` blocks until every prior `emit` has reached the OS. When the sink was
/// created with `close = true` the queue is closed and the worker joined; later
/// emits are dropped. Otherwise the sink keeps accepting records after `finish`.
///
/// There is no timeout: a stream that never accepts writes hangs `finish`.
pub struct AsyncLogSink {
    tx: Mutex<Option<Sender<Command>>>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
    write_errors: Arc<AtomicU64>,
    ansi_truecolor: bool,
    close: bool,
}

impl AsyncLogSink {
    /// Spawns the writer thread for `writer`.
    ///
    /// # Arguments
    ///
    /// * `writer` - The output stream; owned by the worker thread.
    /// * `ansi_truecolor` - Prefix each line with a 24-bit ANSI color escape.
    /// * `close` - Whether `finish` closes the stream and stops the worker.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker thread cannot be spawned.
    pub fn new(
        writer: Box<dyn Write + Send>,
        ansi_truecolor: bool,
        close: bool,
    ) -> io::Result<Self> {
        let (tx, rx) = crossbeam_channel::unbounded::<Command>();
        let write_errors = Arc::new(AtomicU64::new(0));
        let errors = write_errors.clone();

        let worker = thread::Builder::new()
            .name("log-writer".into())
            .spawn(move || run_writer(writer, &rx, &errors))?;

        Ok(Self {
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
            write_errors,
            ansi_truecolor,
            close,
        })
    }

    /// Console sink over stdout. `finish` drains but never closes stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker thread cannot be spawned.
    pub fn stdout(color: ColorMode) -> io::Result<Self> {
        Self::new(Box::new(io::stdout()), color.stdout_enabled(), false)
    }

    /// File sink without color; `finish` closes the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker thread cannot be spawned.
    pub fn file(file: File) -> io::Result<Self> {
        Self::new(Box::new(file), false, true)
    }

    /// Number of writes or flushes that failed on the worker.
    #[must_use]
    pub fn write_errors(&self) -> u64 {
        self.write_errors.load(Ordering::Relaxed)
    }

    fn render(&self, record: &Record) -> Bytes {
        let line = record.line();
        let mut buf = BytesMut::with_capacity(line.len() + 24);
        if self.ansi_truecolor {
            match record.color() {
                Some(color) => buf.put_slice(color.ansi().as_bytes()),
                None => buf.put_slice(ANSI_DEFAULT_FOREGROUND.as_bytes()),
            }
        }
        buf.put_slice(line.as_bytes());
        buf.put_u8(b'\n');
        buf.freeze()
    }

    fn close_and_join(&self) {
        // Dropping the last sender ends the worker's receive loop.
        drop(self.tx.lock().take());
        if let Some(worker) = self.worker.lock().take() {
            let _ = worker.join();
        }
    }

    fn wait_drained(&self) {
        let (ack_tx, ack_rx) = crossbeam_channel::bounded::<()>(1);
        let sent = match self.tx.lock().as_ref() {
            Some(tx) => tx.send(Command::Flush(ack_tx)).is_ok(),
            None => false,
        };
        if sent {
            let _ = ack_rx.recv();
        }
    }
}

fn run_writer(writer: Box<dyn Write + Send>, rx: &Receiver<Command>, errors: &AtomicU64) {
    let mut out = BufWriter::new(writer);

    while let Ok(cmd) = rx.recv() {
        match cmd {
            Command::Write(bytes) => {
                if out.write_all(&bytes).is_err() {
                    errors.fetch_add(1, Ordering::Relaxed);
                }
                if rx.is_empty() {
                    flush_counted(&mut out, errors);
                }
            }
            Command::Flush(ack) => {
                flush_counted(&mut out, errors);
                let _ = ack.send(());
            }
        }
    }

    flush_counted(&mut out, errors);
}

fn flush_counted<W: Write>(out: &mut W, errors: &AtomicU64) {
    if out.flush().is_err() {
        errors.fetch_add(1, Ordering::Relaxed);
    }
}

impl LogSink for AsyncLogSink {
    fn emit(&self, record: &Record) {
        let bytes = self.render(record);
        if let Some(tx) = self.tx.lock().as_ref() {
            let _ = tx.send(Command::Write(bytes));
        }
    }

    fn finish(&self) {
        if self.close {
            self.close_and_join();
        } else {
            self.wait_drained();
        }
    }
}

impl Drop for AsyncLogSink {
    fn drop(&mut self) {
        self.close_and_join();
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::log::{log_color::LogColor, log_level::LogLevel};

    /// Writer that appends into a shared buffer so tests can inspect the output.
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(data);
            Ok(data.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().clone()).unwrap()
        }
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _data: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk on fire"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::other("disk on fire"))
        }
    }

    fn rec(msg: &str, color: Option<LogColor>) -> Record {
        Record::with_timestamp(
            LogLevel::Info,
            "test",
            color,
            "2024-01-02 03:04:05".to_owned(),
            format_args!("{msg}"),
        )
    }

    #[test]
    fn writes_newline_terminated_lines_in_order() {
        let buf = SharedBuf::default();
        let sink = AsyncLogSink::new(Box::new(buf.clone()), false, true).unwrap();
        sink.emit(&rec("one", None));
        sink.emit(&rec("two", Some(LogColor::new(1, 2, 3))));
        sink.finish();

        assert_eq!(
            buf.text(),
            "[2024-01-02 03:04:05][test]: one\n[2024-01-02 03:04:05][test]: two\n"
        );
    }

    #[test]
    fn truecolor_prefixes_escape_per_line() {
        let buf = SharedBuf::default();
        let sink = AsyncLogSink::new(Box::new(buf.clone()), true, true).unwrap();
        sink.emit(&rec("red", Some(LogColor::new(255, 0, 0))));
        sink.emit(&rec("plain", None));
        sink.finish();

        let text = buf.text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "\x1b[38;2;255;0;0m[2024-01-02 03:04:05][test]: red");
        assert_eq!(lines[1], "\x1b[39m[2024-01-02 03:04:05][test]: plain");
    }

    #[test]
    fn closing_finish_drops_later_emits() {
        let buf = SharedBuf::default();
        let sink = AsyncLogSink::new(Box::new(buf.clone()), false, true).unwrap();
        sink.emit(&rec("before", None));
        sink.finish();
        sink.emit(&rec("after", None));
        sink.finish();
        drop(sink);

        assert_eq!(buf.text().lines().count(), 1);
    }

    #[test]
    fn non_closing_finish_keeps_sink_usable() {
        let buf = SharedBuf::default();
        let sink = AsyncLogSink::new(Box::new(buf.clone()), false, false).unwrap();
        sink.emit(&rec("first", None));
        sink.finish();
        assert_eq!(buf.text().lines().count(), 1);

        sink.emit(&rec("second", None));
        sink.finish();
        assert_eq!(buf.text().lines().count(), 2);
    }

    #[test]
    fn write_failures_are_counted_not_surfaced() {
        let sink = AsyncLogSink::new(Box::new(FailingWriter), false, true).unwrap();
        sink.emit(&rec("lost", None));
        sink.finish();
        assert!(sink.write_errors() > 0);
    }

    #[test]
    fn drop_drains_queue() {
        let buf = SharedBuf::default();
        {
            let sink = AsyncLogSink::new(Box::new(buf.clone()), false, false).unwrap();
            for i in 0..100 {
                sink.emit(&rec(&i.to_string(), None));
            }
        }
        assert_eq!(buf.text().lines().count(), 100);
    }
}
