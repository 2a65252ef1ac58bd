//! Format-and-forward sinks for OS facilities, plus the per-platform default.
//!
//! These sinks write synchronously from the calling thread. Constructors for a
//! facility the current platform lacks return [`LogError::Unsupported`].

use std::sync::Arc;

use crate::log::{
    async_log_sink::{AsyncLogSink, ColorMode},
    log_error::LogError,
    log_record::Record,
    log_sink::LogSink,
};

/// Sends each line to the attached debugger (`OutputDebugStringW`).
#[derive(Debug)]
pub struct DebuggerLogSink {
    _priv: (),
}

impl DebuggerLogSink {
    /// # Errors
    ///
    /// Returns [`LogError::Unsupported`] on platforms other than Windows.
    pub fn new() -> Result<Self, LogError> {
        if cfg!(windows) {
            Ok(Self { _priv: () })
        } else {
            Err(LogError::Unsupported("debugger logger"))
        }
    }
}

#[cfg(windows)]
mod win {
    #[link(name = "kernel32")]
    unsafe extern "system" {
        pub fn OutputDebugStringW(output: *const u16);
    }
}

impl LogSink for DebuggerLogSink {
    #[cfg(windows)]
    fn emit(&self, record: &Record) {
        let wide: Vec<u16> = record
            .line()
            .encode_utf16()
            .chain([u16::from(b'\n'), 0])
            .collect();
        // SAFETY: `wide` is NUL-terminated and outlives the call.
        unsafe { win::OutputDebugStringW(wide.as_ptr()) };
    }

    #[cfg(not(windows))]
    fn emit(&self, _record: &Record) {}
}

/// Writes to the Android system log, tagged with the record's subsystem.
#[derive(Debug)]
pub struct AndroidLogSink {
    _priv: (),
}

impl AndroidLogSink {
    /// # Errors
    ///
    /// Returns [`LogError::Unsupported`] on platforms other than Android.
    pub fn new() -> Result<Self, LogError> {
        if cfg!(target_os = "android") {
            Ok(Self { _priv: () })
        } else {
            Err(LogError::Unsupported("android logger"))
        }
    }
}

#[cfg(target_os = "android")]
mod android {
    use libc::{c_char, c_int};

    pub const VERBOSE: c_int = 2;
    pub const DEBUG: c_int = 3;
    pub const INFO: c_int = 4;
    pub const WARN: c_int = 5;
    pub const ERROR: c_int = 6;

    #[link(name = "log")]
    unsafe extern "C" {
        pub fn __android_log_write(prio: c_int, tag: *const c_char, text: *const c_char) -> c_int;
    }
}

#[cfg(target_os = "android")]
fn c_string(s: &str) -> std::ffi::CString {
    // Interior NULs would cut the message short; replace them instead.
    std::ffi::CString::new(s.replace('\0', " ")).unwrap_or_default()
}

impl LogSink for AndroidLogSink {
    #[cfg(target_os = "android")]
    fn emit(&self, record: &Record) {
        use crate::log::log_level::LogLevel;

        let prio = match record.level() {
            LogLevel::Trace => android::VERBOSE,
            LogLevel::Debug => android::DEBUG,
            LogLevel::Info => android::INFO,
            LogLevel::Warn => android::WARN,
            LogLevel::Error => android::ERROR,
        };
        let tag = c_string(record.system());
        let text = c_string(record.message());
        // SAFETY: both pointers are valid NUL-terminated strings for the call.
        unsafe {
            android::__android_log_write(prio, tag.as_ptr(), text.as_ptr());
        }
    }

    #[cfg(not(target_os = "android"))]
    fn emit(&self, _record: &Record) {}
}

/// The platform's default root: the system log on Android, stdout elsewhere.
///
/// # Errors
///
/// Returns an error if the stdout writer thread cannot be spawned.
pub fn default_sink(color: ColorMode) -> Result<Arc<dyn LogSink>, LogError> {
    if cfg!(target_os = "android") {
        Ok(Arc::new(AndroidLogSink::new()?))
    } else {
        Ok(Arc::new(AsyncLogSink::stdout(color)?))
    }
}
