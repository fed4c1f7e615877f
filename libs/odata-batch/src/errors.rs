//! Batch codec errors.
//!
//! These cover framing only. A sub-response with a non-2xx status is a
//! normal [`odata_query::HttpOutcome`] for its item, never a codec error.

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum BatchError {
    /// The response `Content-Type` carried no usable boundary parameter.
    #[error("content type carries no multipart boundary: {0}")]
    MissingBoundary(String),

    /// A part could not be reconstructed into a status line, headers and body.
    #[error("malformed batch part: {0}")]
    MalformedPart(String),

    /// The payload ended before its closing boundary delimiter.
    #[error("batch payload ended before the closing boundary")]
    UnexpectedEnd,
}

pub type BatchResult<T> = Result<T, BatchError>;
