//! Error types used throughout the workspace

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Sable
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum SableError {
    /// The remote store's fetch/query/delete failed. Wraps transport and
    /// protocol-parse failures uniformly.
    #[error("remote store error: {0}")]
    Remote(String),

    /// A listing page request failed after the bounded retry budget was
    /// exhausted; the whole bulk operation aborts with this.
    #[error("pagination error: {0}")]
    Pagination(String),

    /// The caller's cancellation token fired before the operation finished
    /// submitting work.
    #[error("operation cancelled")]
    Cancelled,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for Sable operations
pub type Result<T> = std::result::Result<T, SableError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_serialize_with_type_tag() {
        let err = SableError::Remote("connection refused".to_string());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "Remote");
        assert_eq!(json["message"], "connection refused");
    }

    #[test]
    fn cancelled_has_stable_display() {
        assert_eq!(SableError::Cancelled.to_string(), "operation cancelled");
    }
}
