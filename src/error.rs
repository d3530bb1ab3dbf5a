//! Error types for the tabfit crate

use thiserror::Error;

/// Result type alias for tabfit operations
pub type Result<T> = std::result::Result<T, TabfitError>;

/// Main error type for the tabfit crate
#[derive(Error, Debug)]
pub enum TabfitError {
    /// An operation was invoked before its required setup step.
    #[error("Precondition not met: {0}")]
    Precondition(String),

    /// Mismatched lengths or dimensions between related collections.
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// The feature-selection ensemble produced no votes for any column.
    #[error("Feature-selection ensemble produced no votes")]
    EmptyVote,

    /// A fitted result was read before `fit` ran.
    #[error("Not fitted")]
    NotFitted,

    /// Unknown or unsupported model-family tag, search-method tag, or
    /// hyperparameter name.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Bad argument values (fold counts, empty inputs, unknown columns).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Numeric failure (singular systems, non-finite intermediates).
    #[error("Computation error: {0}")]
    Computation(String),
}
