use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::log::{
    async_log_sink::{AsyncLogSink, ColorMode},
    backlog_log_sink::BacklogLogSink,
    collection_log_sink::CollectionLogSink,
    filter_log_sink::FilterLogSink,
    log_error::LogError,
    log_file::{LogFile, expand_path},
    log_level::LogLevel,
    log_sink::LogSink,
};

/// INI-style configuration: `key = value` pairs, optional `[Section]` headers,
/// `#` comments, surrounding quotes stripped from values.
#[derive(Debug, Default)]
pub struct Config {
    pub globals: HashMap<String, String>,
    pub sections: HashMap<String, HashMap<String, String>>,
}

impl Config {
    /// # Errors
    ///
    /// Returns [`LogError::Config`] if the file cannot be read.
    pub fn load(path: &str) -> Result<Self, LogError> {
        let content = fs::read_to_string(path)
            .map_err(|e| LogError::Config(format!("Error reading file {path}: {e}")))?;
        Ok(Self::parse(&content))
    }

    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut globals = HashMap::new();
        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut current_section: Option<String> = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                current_section = Some(name.trim().to_string());
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim().to_string();
                let value = value.trim().trim_matches('"').to_string();

                match &current_section {
                    None => {
                        globals.insert(key, value);
                    }
                    Some(sec) => {
                        sections.entry(sec.clone()).or_default().insert(key, value);
                    }
                }
            }
        }
        Config { globals, sections }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|sec| sec.get(key))
            .map(|s| s.as_str())
    }

    #[must_use]
    pub fn get_global(&self, key: &str) -> Option<&str> {
        self.globals.get(key).map(|s| s.as_str())
    }

    /// Section value if non-empty, else a non-empty global of the same name.
    #[must_use]
    pub fn get_non_empty(&self, section: &str, key: &str) -> Option<&str> {
        self.get(section, key)
            .filter(|s| !s.is_empty())
            .or_else(|| self.get_global(key).filter(|s| !s.is_empty()))
    }
}

const SECTION: &str = "Logging";

/// Where the file backend writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileTarget {
    /// Exactly this file, appended to.
    Path(PathBuf),
    /// A timestamped per-process file inside this directory.
    Dir {
        dir: PathBuf,
        app_name: Option<String>,
    },
}

/// Typed view of the `[Logging]` section.
///
/// ```ini
/// [Logging]
/// level = debug
/// stdout = true
/// color = auto        # auto | always | never
/// dir = ~/.local/state/app/logs
/// app_name = server
/// backlog = 1024
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: LogLevel,
    pub stdout: bool,
    pub color: ColorMode,
    pub file: Option<FileTarget>,
    pub backlog: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            stdout: true,
            color: ColorMode::Auto,
            file: None,
            backlog: 0,
        }
    }
}

/// Sinks produced by [`LogConfig::build`].
///
/// `root` is what gets installed; the other handles point at the same sinks
/// so the application can adjust filters or pump the backlog later.
pub struct BuiltSinks {
    pub root: Arc<dyn LogSink>,
    pub stdout: Option<Arc<FilterLogSink>>,
    pub file: Option<Arc<FilterLogSink>>,
    pub file_path: Option<PathBuf>,
    pub backlog: Option<Arc<BacklogLogSink>>,
}

impl LogConfig {
    /// # Errors
    ///
    /// Returns [`LogError::Config`] for an unknown level, color mode, boolean
    /// or a non-numeric backlog size.
    pub fn from_config(config: &Config) -> Result<Self, LogError> {
        let defaults = Self::default();

        let level = match config.get_non_empty(SECTION, "level") {
            Some(s) => s.parse().map_err(|e| LogError::Config(format!("{e}")))?,
            None => defaults.level,
        };
        let stdout = match config.get_non_empty(SECTION, "stdout") {
            Some(s) => parse_bool(s)?,
            None => defaults.stdout,
        };
        let color = match config.get_non_empty(SECTION, "color") {
            Some(s) => parse_color_mode(s)?,
            None => defaults.color,
        };
        let file = if let Some(path) = config.get_non_empty(SECTION, "file") {
            Some(FileTarget::Path(expand_path(path)))
        } else {
            config
                .get_non_empty(SECTION, "dir")
                .map(|dir| FileTarget::Dir {
                    dir: expand_path(dir),
                    app_name: config.get_non_empty(SECTION, "app_name").map(str::to_owned),
                })
        };
        let backlog = match config.get_non_empty(SECTION, "backlog") {
            Some(s) => s
                .parse()
                .map_err(|_| LogError::Config(format!("invalid backlog size: {s}")))?,
            None => defaults.backlog,
        };

        Ok(Self {
            level,
            stdout,
            color,
            file,
            backlog,
        })
    }

    /// Builds the configured sinks, fanned out through one collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the log file cannot be created or a writer
    /// thread cannot be spawned.
    pub fn build(&self) -> Result<BuiltSinks, LogError> {
        let mut children: Vec<Arc<dyn LogSink>> = Vec::new();

        let stdout = if self.stdout {
            let console = Arc::new(AsyncLogSink::stdout(self.color)?);
            let filtered = Arc::new(FilterLogSink::new(console, self.level));
            children.push(filtered.clone());
            Some(filtered)
        } else {
            None
        };

        let (file, file_path) = match &self.file {
            Some(target) => {
                let log_file = match target {
                    FileTarget::Path(path) => LogFile::open(path)?,
                    FileTarget::Dir { dir, app_name } => {
                        LogFile::create_in_dir(dir, app_name.as_deref())?
                    }
                };
                let path = log_file.path.clone();
                let filtered = Arc::new(FilterLogSink::new(
                    Arc::new(log_file.into_sink()?),
                    self.level,
                ));
                children.push(filtered.clone());
                (Some(filtered), Some(path))
            }
            None => (None, None),
        };

        let backlog = (self.backlog > 0).then(|| Arc::new(BacklogLogSink::new(self.backlog)));
        if let Some(backlog) = &backlog {
            children.push(backlog.clone());
        }

        Ok(BuiltSinks {
            root: Arc::new(CollectionLogSink::new(children)),
            stdout,
            file,
            file_path,
            backlog,
        })
    }
}

fn parse_bool(s: &str) -> Result<bool, LogError> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(LogError::Config(format!("invalid boolean: {s}"))),
    }
}

fn parse_color_mode(s: &str) -> Result<ColorMode, LogError> {
    match s.to_ascii_lowercase().as_str() {
        "auto" => Ok(ColorMode::Auto),
        "always" | "true" => Ok(ColorMode::Always),
        "never" | "false" => Ok(ColorMode::Never),
        _ => Err(LogError::Config(format!("invalid color mode: {s}"))),
    }
}
