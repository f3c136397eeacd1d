//! Error types for dexdiag

use std::time::Duration;
use thiserror::Error;

/// Fatal errors that abort a whole invocation
#[derive(Debug, Error)]
pub enum DiagError {
    #[error("No connection target: pass --kubeconfig or set KUBECONFIG")]
    MissingTarget,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Bundle error: {0}")]
    Bundle(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for DiagError {
    fn from(e: serde_json::Error) -> Self {
        DiagError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for DiagError {
    fn from(e: serde_yaml::Error) -> Self {
        DiagError::Serialization(e.to_string())
    }
}

/// A single resource, cloud or log query failed.
///
/// These never abort a collection run; the orchestrator records them inline
/// in the report next to the sections that did succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("{operation}: Kubernetes API error: {message}")]
    Kube { operation: String, message: String },

    #[error("{operation}: cloud API error: {message}")]
    Cloud { operation: String, message: String },

    #[error("{operation}: timed out after {}s", after.as_secs())]
    Timeout { operation: String, after: Duration },

    #[error("{operation}: operation not supported by this client")]
    Unsupported { operation: String },

    #[error("{operation}: malformed response: {message}")]
    Malformed { operation: String, message: String },
}

impl QueryError {
    /// Identity of the operation that failed
    pub fn operation(&self) -> &str {
        match self {
            QueryError::Kube { operation, .. }
            | QueryError::Cloud { operation, .. }
            | QueryError::Timeout { operation, .. }
            | QueryError::Unsupported { operation }
            | QueryError::Malformed { operation, .. } => operation,
        }
    }

    pub fn kube(operation: impl Into<String>, err: impl std::fmt::Display) -> Self {
        QueryError::Kube {
            operation: operation.into(),
            message: err.to_string(),
        }
    }

    pub fn cloud(operation: impl Into<String>, err: impl std::fmt::Display) -> Self {
        QueryError::Cloud {
            operation: operation.into(),
            message: err.to_string(),
        }
    }
}

/// Result type alias for dexdiag
pub type Result<T> = std::result::Result<T, DiagError>;
