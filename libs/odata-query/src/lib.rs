//! Resource paths, query options and the query language compiler.
//!
//! The crate models one OData v4 resource as a [`ODataResource`] handle:
//! a service root, an ordered [`PathSegments`] list and a [`QueryOptions`]
//! container. Builder calls clone the handle, so branching queries off a
//! shared base never mutates the base. Filter, expand, orderby and apply
//! descriptors are permissive JSON shapes compiled to canonical OData text
//! at render time.
//!
//! ```
//! use odata_query::ODataResource;
//! use serde_json::json;
//!
//! let people = ODataResource::new("https://example.org/svc")?
//!     .entity_set("People");
//! let url = people
//!     .filter(json!({"FirstName": "Scott"}))
//!     .top(2)
//!     .url()?;
//! assert_eq!(
//!     url,
//!     "https://example.org/svc/People?%24filter=FirstName%20eq%20%27Scott%27&%24top=2"
//! );
//! # Ok::<(), odata_query::QueryError>(())
//! ```

pub mod errors;
pub mod expand;
pub mod filter;
pub mod http;
pub mod literal;
pub mod options;
pub mod orderby;
pub mod resource;
pub mod segments;
pub mod transform;

pub use errors::{QueryError, QueryResult};
pub use expand::render_expand;
pub use filter::{CompareOp, Filter, LambdaKind, StringFunc, field};
pub use http::{HttpOutcome, HttpPlan, ODATA_VERSION, ResponseKind};
pub use literal::{
    Aliases, alias, binary, duration, edm, raw, render_entity_key, render_key_literal,
    render_literal,
};
pub use options::{OptionHandler, QueryOptions};
pub use orderby::render_order_by;
pub use resource::ODataResource;
pub use segments::{PathSegments, Segment, SegmentKind};
pub use transform::render_transform;
