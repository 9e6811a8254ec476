//! Error types for promptweave.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Store and snapshot failures have their own bounded enums.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all promptweave operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Construction ---
    #[error("Invalid message item: {0}")]
    InvalidItem(String),

    #[error("Unsupported message item type: {0}")]
    UnsupportedItemType(String),

    // --- Provider updates ---
    #[error("Provider '{name}' is a {actual} source, not {expected}")]
    WrongSourceKind {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    // --- Container structure ---
    #[error("Message index {index} out of range for {len} messages")]
    IndexOutOfRange { index: isize, len: usize },

    // --- Byte store ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Persistence ---
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Failed to read {path}: {reason}")]
    Io { path: String, reason: String },
}

impl StoreError {
    /// Classify an I/O error for `path`.
    pub fn from_io(path: &str, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(path.to_string())
        } else {
            Self::Io {
                path: path.to_string(),
                reason: err.to_string(),
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to read snapshot {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to write snapshot {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("Corrupt snapshot: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Unsupported snapshot version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_kind_displays_correctly() {
        let err = Error::WrongSourceKind {
            name: "greet".into(),
            expected: "files",
            actual: "text",
        };
        assert!(err.to_string().contains("greet"));
        assert!(err.to_string().contains("files"));
    }

    #[test]
    fn io_not_found_is_classified() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(StoreError::from_io("a.txt", io).is_not_found());

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err = StoreError::from_io("a.txt", io);
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("a.txt"));
    }
}
