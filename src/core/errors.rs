//! Shared error types for the analysis pipeline

use thiserror::Error;

/// Main error type for reductor operations
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration rejected before any work starts
    #[error("Configuration error: {0}")]
    Config(String),

    /// Test-run store failures, with the underlying cause
    #[error("Store error: {message}")]
    Store {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A single test could not be vectorized; one failure invalidates the
    /// shared vocabulary, so the run aborts
    #[error("Vectorization failed for test {test_id}: {message}")]
    Vectorization { test_id: String, message: String },

    /// The clustering collaborator failed or timed out
    #[error("Clustering error: {cause}")]
    Clustering {
        cause: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    /// The collaborator returned a partition inconsistent with its inputs
    #[error("Cluster partition inconsistent with inputs: {0}")]
    ClusterConsistency(String),

    /// The run was cancelled between stages
    #[error("Run cancelled")]
    Cancelled,

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a store error with an underlying cause
    pub fn store(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Store {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a store error without a cause
    pub fn store_msg(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
            source: None,
        }
    }

    /// Create a vectorization error for a specific test
    pub fn vectorization(test_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Vectorization {
            test_id: test_id.into(),
            message: message.into(),
        }
    }

    /// Create a clustering error from a bare cause
    pub fn clustering(cause: impl Into<String>) -> Self {
        Self::Clustering {
            cause: cause.into(),
            stderr: None,
            exit_code: None,
        }
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vectorization_error_carries_test_id() {
        let err = Error::vectorization("tests/A.php::testX", "source file not found");
        let rendered = err.to_string();
        assert!(rendered.contains("tests/A.php::testX"));
        assert!(rendered.contains("source file not found"));
    }

    #[test]
    fn test_clustering_error_display() {
        let err = Error::Clustering {
            cause: "timeout".to_string(),
            stderr: Some("killed".to_string()),
            exit_code: Some(124),
        };
        assert_eq!(err.to_string(), "Clustering error: timeout");
    }

    #[test]
    fn test_store_error_with_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = Error::store("could not open run file", io);
        assert!(err.to_string().contains("could not open run file"));
    }
}
