use std::{fmt, io};

/// Errors reported while setting up sinks.
///
/// The logging hot path never returns errors; these only come out of
/// configuration, file creation and platform sink construction.
#[derive(Debug)]
pub enum LogError {
    Io(io::Error),
    Config(String),
    Unsupported(&'static str),
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Unsupported(what) => write!(f, "{what} is not available on this platform"),
        }
    }
}

impl std::error::Error for LogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for LogError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
