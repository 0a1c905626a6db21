//! Error types for hashing and imaging operations

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while computing a file digest
#[derive(Error, Debug)]
pub enum HashError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("I/O error while hashing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl HashError {
    /// Classify an I/O failure on `path`
    pub(crate) fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => HashError::NotFound(path),
            _ => HashError::Io { path, source },
        }
    }

    /// Path of the file that could not be hashed
    pub fn path(&self) -> &std::path::Path {
        match self {
            HashError::NotFound(path) => path,
            HashError::Io { path, .. } => path,
        }
    }
}

/// Errors raised while streaming a source file into a forensic image
#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("Cannot open source {path}: {source}")]
    OpenSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot create destination {path}: {source}")]
    CreateDestination {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Read error at offset {offset}: {source}")]
    Read {
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("Write error at offset {offset}: {source}")]
    Write {
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("Failed to flush destination {path}: {source}")]
    Sync {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Source and destination refer to the same file: {0}")]
    SameFile(PathBuf),
}
