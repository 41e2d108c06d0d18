//! Weight store error types.

use std::path::PathBuf;

/// Errors from reading or writing segment weights.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem operation failed
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot could not be encoded
    #[error("failed to serialize weights: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Snapshot on disk could not be decoded
    #[error("corrupt weight file {}: {message}", .path.display())]
    Corrupt { path: PathBuf, message: String },

    /// Sample rejected before touching any row
    #[error("invalid sample: {0}")]
    InvalidSample(String),

    /// Background write task failed to complete
    #[error("store task failed: {0}")]
    Task(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = StoreError::Corrupt {
            path: PathBuf::from("w.json"),
            message: "expected value".into(),
        };
        assert_eq!(err.to_string(), "corrupt weight file w.json: expected value");

        let err = StoreError::Io {
            path: PathBuf::from("/x/w.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(err.to_string(), "I/O error on /x/w.json: gone");
    }
}
