use std::path::Path;

use thiserror::Error;

/// The error for opening, building and reading sequence databases. I/O failures always name
/// the file they happened on.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The database or one of its index files could not be read or written.
    #[error("database file {path}: {source}")]
    Io {
        /// The file the failure happened on.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },
    /// A serial number beyond the entry count was requested.
    #[error("serial number {serial} out of range, database has {count} entries")]
    OutOfBounds {
        /// The requested serial number.
        serial: u32,
        /// The number of entries in the database.
        count: u32,
    },
    /// The database content or its index files are inconsistent.
    #[error("database {path}: {detail}")]
    Corrupt {
        /// The file the inconsistency was detected in.
        path: String,
        /// What is inconsistent.
        detail: String,
    },
}

impl DatabaseError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    pub(crate) fn corrupt(path: &Path, detail: impl Into<String>) -> Self {
        Self::Corrupt {
            path: path.display().to_string(),
            detail: detail.into(),
        }
    }
}
