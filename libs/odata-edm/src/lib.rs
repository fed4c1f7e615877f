//! EDM (Entity Data Model) type codecs for the OData v4 client toolkit.
//!
//! This crate marshals wire JSON to and from application values:
//! - [`primitive`]: per-type codecs for the `Edm.*` primitive set, each with
//!   distinct `serialize` (JSON body) and `encode` (URL literal) forms
//! - [`entity`], [`enums`], [`callable`]: structural parsers with single
//!   inheritance, flag enums and callable signatures
//! - [`registry`]: the two-phase construct-then-link schema registry
//!
//! Unknown wire types degrade to passthrough instead of failing, so the
//! pipeline keeps working against partial or evolving metadata.

pub mod callable;
pub mod duration;
pub mod entity;
pub mod enums;
pub mod errors;
pub mod primitive;
pub mod registry;
pub mod value;

pub use callable::CallableParser;
pub use duration::EdmDuration;
pub use entity::{EntityParser, FieldKind, FieldParser};
pub use enums::EnumParser;
pub use errors::{EdmError, EdmResult};
pub use primitive::{EdmType, PrimitiveCodec, encode_value, escape_string_literal};
pub use registry::{
    CallableConfig, EntityConfig, EnumConfig, FieldConfig, Parser, Registry, RegistryOptions,
    SchemaConfig,
};
pub use value::{EdmValue, EntityKey};
