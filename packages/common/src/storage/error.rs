use std::fmt;

use crate::filename::FilenameError;

/// Errors that can occur while writing to or reading from the upload root.
#[derive(Debug)]
pub enum StorageError {
    /// A file already exists at the destination.
    Conflict(String),
    /// The requested file was not found.
    NotFound(String),
    /// The relative path was rejected before touching the filesystem.
    UnsafePath(&'static str),
    /// The path resolves to something other than a regular file.
    NotAFile(String),
    /// The upload exceeds the configured size limit.
    SizeLimitExceeded { actual: u64, limit: u64 },
    /// An I/O error occurred.
    Io(std::io::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conflict(path) => write!(f, "file already exists: {path}"),
            Self::NotFound(path) => write!(f, "file not found: {path}"),
            Self::UnsafePath(reason) => write!(f, "unsafe path: {reason}"),
            Self::NotAFile(path) => write!(f, "not a regular file: {path}"),
            Self::SizeLimitExceeded { actual, limit } => {
                write!(f, "upload exceeds size limit ({actual} > {limit} bytes)")
            }
            Self::Io(err) => write!(f, "storage IO error: {err}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// A declared upload was refused before anything was written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct ValidationError {
    pub reason: String,
}

impl ValidationError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl From<FilenameError> for ValidationError {
    fn from(err: FilenameError) -> Self {
        Self::new(err.message())
    }
}
