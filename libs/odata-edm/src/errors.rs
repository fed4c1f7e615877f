//! Error types for EDM parsing, serialization and registry configuration.

use thiserror::Error;

/// Unified error type for EDM codec and registry operations.
///
/// Configuration problems (`UnresolvedType`, `DuplicateType`) surface at
/// [`crate::registry::Registry::build`] time; the remaining variants are
/// value-level marshalling failures.
#[derive(Debug, Error, Clone)]
pub enum EdmError {
    /// A field, parameter or return type references a type name that no
    /// schema declares. Raised while linking, never at first use.
    #[error("unresolved type reference: {0}")]
    UnresolvedType(String),

    #[error("duplicate type declaration: {0}")]
    DuplicateType(String),

    #[error("malformed ISO-8601 duration: {0}")]
    MalformedDuration(String),

    #[error("type mismatch for {type_name}: expected {expected}, got {got}")]
    TypeMismatch {
        type_name: String,
        expected: &'static str,
        got: String,
    },

    #[error("invalid {type_name} literal: {value}")]
    InvalidLiteral { type_name: String, value: String },

    #[error("unknown enum member for {type_name}: {member}")]
    UnknownEnumMember { type_name: String, member: String },

    #[error("value cannot be encoded as a URL literal: {0}")]
    NotEncodable(String),
}

pub type EdmResult<T> = Result<T, EdmError>;
