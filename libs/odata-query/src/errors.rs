//! Error types for resource building and query compilation.

use thiserror::Error;

use crate::segments::SegmentKind;

/// Unified error type for path, option and compiler operations.
#[derive(Debug, Error, Clone)]
pub enum QueryError {
    /// A service root must be a plain URL; query strings belong to options.
    #[error("service root must not carry a query string: {0}")]
    InvalidServiceRoot(String),

    /// A transform pipeline stage used a key outside the supported set.
    #[error("unsupported transform key(s): {0}")]
    UnsupportedTransform(String),

    /// A segment kind was read before ever being added. Programmer error.
    #[error("missing segment: {0}")]
    MissingSegment(SegmentKind),

    /// A key-bearing operation needs a key the resource does not have.
    #[error("resource requires a key for this operation")]
    MissingKey,

    /// A structured filter/expand/orderby descriptor has an invalid shape.
    #[error("invalid query descriptor: {0}")]
    InvalidDescriptor(String),

    #[error(transparent)]
    Edm(#[from] odata_edm::EdmError),
}

pub type QueryResult<T> = Result<T, QueryError>;
