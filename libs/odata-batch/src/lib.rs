//! Multipart `$batch` codec.
//!
//! [`Batch`] queues planned sub-requests, renders them into one
//! `multipart/mixed` payload and decodes the multipart response back into
//! one [`odata_query::HttpOutcome`] per sub-request. Consecutive non-GET
//! requests share a changeset; every boundary token comes from the batch's
//! own [`BoundarySource`], so concurrent batches never collide and seeded
//! sources reproduce payloads byte for byte.

pub mod batch;
pub mod boundary;
pub mod errors;
pub mod parse;

pub use batch::{Batch, BatchPayload};
pub use boundary::BoundarySource;
pub use errors::{BatchError, BatchResult};
pub use parse::parse_response;
