//! Error types for the WarpGrid state store.

use thiserror::Error;

/// Result type alias for state store operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur during state store operations.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to open state store: {0}")]
    Open(String),

    #[error("state store transaction failed: {0}")]
    Transaction(String),

    #[error("state store table unavailable: {0}")]
    Table(String),

    #[error("failed to read record: {0}")]
    Read(String),

    #[error("failed to write record: {0}")]
    Write(String),

    #[error("failed to encode record: {0}")]
    Encode(String),

    #[error("corrupt record: {0}")]
    Decode(String),

    #[error("instance not found: {0}")]
    NotFound(String),
}

impl StateError {
    /// True when the failure is a missing record rather than a storage fault.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StateError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_distinguished() {
        assert!(StateError::NotFound("x".to_string()).is_not_found());
        assert!(!StateError::Write("disk full".to_string()).is_not_found());
    }
}
