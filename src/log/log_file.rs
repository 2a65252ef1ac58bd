use std::{
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
};

use crate::log::{async_log_sink::AsyncLogSink, log_error::LogError, log_level::LogLevel};

/// A log file opened for appending, together with where it ended up.
pub struct LogFile {
    pub file: File,
    pub path: PathBuf,
}

impl LogFile {
    /// Opens (or creates) `path` for appending, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or the file cannot be created.
    pub fn open(path: &Path) -> Result<Self, LogError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Creates a timestamped, per-PID log file inside `dir`.
    ///
    /// If `dir` is unusable the file is created in the system temp directory
    /// instead, and a warning is logged under the `logger` subsystem.
    ///
    /// # Example Filename
    /// `logs/server-20251102_023045-pid1234.log`
    ///
    /// # Errors
    ///
    /// Returns the original error if the temp directory fails as well.
    pub fn create_in_dir<D: AsRef<Path>>(dir: D, app_name: Option<&str>) -> Result<Self, LogError> {
        let dir = dir.as_ref();
        let fname = file_name(app_name);

        match Self::open(&dir.join(&fname)) {
            Ok(log_file) => Ok(log_file),
            Err(err) => {
                let fallback = std::env::temp_dir().join(&fname);
                let log_file = Self::open(&fallback).map_err(|_| err)?;
                crate::log::registry::log(
                    LogLevel::Warn,
                    "logger",
                    format_args!(
                        "cannot write to {}, logging to {} instead",
                        dir.display(),
                        fallback.display()
                    ),
                );
                Ok(log_file)
            }
        }
    }

    /// Creates the file in a `logs/` directory next to the executable.
    ///
    /// # Errors
    ///
    /// See [`create_in_dir`](Self::create_in_dir).
    pub fn create_default(app_name: Option<&str>) -> Result<Self, LogError> {
        Self::create_in_dir(exe_dir_fallback_cwd().join("logs"), app_name)
    }

    /// Hands the file to a closing async sink.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer thread cannot be spawned.
    pub fn into_sink(self) -> io::Result<AsyncLogSink> {
        AsyncLogSink::file(self.file)
    }
}

/// `<app>-YYYYMMDD_HHMMSS-pid<PID>.log`, or without the app prefix.
fn file_name(app_name: Option<&str>) -> String {
    let ts = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let pid = std::process::id();
    match app_name.filter(|n| !n.is_empty()) {
        Some(name) => format!("{name}-{ts}-pid{pid}.log"),
        None => format!("{ts}-pid{pid}.log"),
    }
}

/// Directory of the running executable, or the current directory on error.
fn exe_dir_fallback_cwd() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Expands a leading `~` to the user's home directory.
#[must_use]
pub fn expand_path(path_str: &str) -> PathBuf {
    if path_str.starts_with('~') {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .ok()
            .map(PathBuf::from);

        if let Some(mut home_path) = home {
            if path_str == "~" {
                return home_path;
            }
            if let Some(rest) = path_str
                .strip_prefix("~/")
                .or_else(|| path_str.strip_prefix("~\\"))
            {
                home_path.push(rest);
                return home_path;
            }
        }
    }
    PathBuf::from(path_str)
}
