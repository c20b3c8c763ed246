//! Unified error types for shellkeep.
//!
//! Storage failures are absorbed and logged on the request path; network
//! failures are absorbed with a store fallback only under refresh-ahead.

use tokio_rusqlite::rusqlite;

/// Unified error types for the shellkeep worker.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No connectivity, DNS/TLS failure, or the request could not be sent.
    #[error("NETWORK_FAILURE: {0}")]
    Network(String),

    /// Persistent store operation failed (quota, I/O).
    #[error("STORAGE_FAILURE: {0}")]
    Storage(tokio_rusqlite::Error),

    /// One or more app-shell resources could not be fetched during install.
    #[error("MANIFEST_FETCH_FAILED: {0}")]
    ManifestFetch(String),

    /// Migration failed to apply.
    #[error("STORAGE_FAILURE: migration failed: {0}")]
    MigrationFailed(String),

    /// A stored row could not be encoded or decoded.
    #[error("STORAGE_FAILURE: corrupt entry: {0}")]
    CorruptEntry(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// A lifecycle transition was requested from the wrong state.
    #[error("INVALID_STATE: {0}")]
    InvalidState(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Storage(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Storage(tokio_rusqlite::Error::Close(c)),
            _ => Error::Storage(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Storage(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Storage(tokio_rusqlite::Error::Error(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Network("connection refused".to_string());
        assert!(err.to_string().contains("NETWORK_FAILURE"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_manifest_error_display() {
        let err = Error::ManifestFetch("/index.html".to_string());
        assert!(err.to_string().contains("MANIFEST_FETCH_FAILED"));
    }
}
