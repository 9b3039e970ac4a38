use std::path::PathBuf;
use thiserror::Error;

/// Result type for scan operations
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors that can occur while filtering log files
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("Invalid timestamp '{value}': expected format {format}")]
    InvalidTimestamp { value: String, format: &'static str },
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid UTF-8 in file {path}: {source}")]
    EncodingError {
        path: PathBuf,
        source: std::string::FromUtf8Error,
    },
}

impl ScanError {
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn invalid_pattern(pattern: impl Into<String>) -> Self {
        Self::InvalidPattern(pattern.into())
    }

    pub fn invalid_timestamp(value: impl Into<String>, format: &'static str) -> Self {
        Self::InvalidTimestamp {
            value: value.into(),
            format,
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn encoding_error(path: impl Into<PathBuf>, source: std::string::FromUtf8Error) -> Self {
        Self::EncodingError {
            path: path.into(),
            source,
        }
    }

    /// Maps an open error to a path-carrying variant where the io kind allows it
    pub fn from_open(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::file_not_found(path),
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::IoError(err),
        }
    }
}
