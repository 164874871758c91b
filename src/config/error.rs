use crate::config::window::WindowError;

use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    Window(WindowError),
    Pattern(glob::PatternError),
    ProgressInterval,
    MissingSection(&'static str),
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Window(e) => write!(f, "Invalid window: {}", e),
            ConfigError::Pattern(e) => write!(f, "Invalid raster pattern: {}", e),
            ConfigError::ProgressInterval => write!(f, "progress_every must be greater than 0"),
            ConfigError::MissingSection(name) => {
                write!(f, "Missing '{}' section in configuration file", name)
            }
            ConfigError::Io(e) => write!(f, "I/O error: {}", e),
            ConfigError::Json(e) => write!(f, "Failed to parse JSON: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> ConfigError {
        ConfigError::Io(err)
    }
}

impl From<WindowError> for ConfigError {
    fn from(err: WindowError) -> ConfigError {
        ConfigError::Window(err)
    }
}

impl From<glob::PatternError> for ConfigError {
    fn from(err: glob::PatternError) -> ConfigError {
        ConfigError::Pattern(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> ConfigError {
        ConfigError::Json(err)
    }
}
