//! Error types for the mimekit crate.

use thiserror::Error;

/// The main error type for the mimekit crate.
///
/// Every failing constructor, setter, and accessor reports through this type.
/// Variants carry the offending input so callers can see what was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The head of a MIME type string contains no `/`.
    #[error("missing subtype")]
    MissingSubtype,

    /// The primary type is not a valid token.
    #[error("invalid type {0:?}")]
    InvalidType(String),

    /// The subtype is not a valid token.
    #[error("invalid subtype {0:?}")]
    InvalidSubtype(String),

    /// A parameter key is not a valid token.
    #[error("invalid parameter key {0:?}")]
    InvalidKey(String),

    /// A parameter value is not valid restricted text.
    #[error("invalid parameter value {0:?}")]
    InvalidValue(String),

    /// The parameter parser could not consume the full input; carries up to
    /// the first 30 characters of the unconsumed tail.
    #[error("invalid parameters {0:?}")]
    InvalidParams(String),

    /// Mutation was attempted after `make_immutable`.
    #[error("immutable")]
    Immutable,
}

/// Specialized Result type for mimekit operations.
pub type Result<T> = std::result::Result<T, Error>;
