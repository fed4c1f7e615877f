//! Entity and field parsers.
//!
//! An [`EntityParser`] owns its declared fields and an optional parent type
//! name; inheritance is a single chain walked parent-first. Field dispatch is
//! a [`FieldKind`] strategy tag stamped once while the registry links — there
//! is no per-instance rebinding after that.

use serde_json::Value as Json;

use crate::errors::{EdmError, EdmResult};
use crate::primitive::{PrimitiveCodec, edm_to_json, json_to_edm};
use crate::registry::{Parser, Registry};
use crate::value::{EdmValue, EntityKey};

/// Marshalling strategy for one field, resolved at link time.
#[derive(Debug, Clone, Default)]
pub enum FieldKind {
    /// Not linked yet; values pass through untouched.
    #[default]
    Unresolved,
    Primitive(PrimitiveCodec),
    /// Qualified name of an entity (or complex) type in the registry.
    Entity(String),
    /// Qualified name of an enum type in the registry.
    Enum(String),
}

/// One structural field of an entity, complex type or callable signature.
#[derive(Debug, Clone)]
pub struct FieldParser {
    pub name: String,
    pub wire_type: String,
    pub nullable: bool,
    pub key: bool,
    pub navigation: bool,
    pub collection: bool,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    /// Dot-path into a related object for composite key components.
    pub ref_path: Option<String>,
    pub(crate) kind: FieldKind,
}

impl FieldParser {
    pub(crate) fn deserialize(&self, wire: &Json, registry: &Registry) -> EdmResult<EdmValue> {
        if let Json::Array(items) = wire {
            let out = items
                .iter()
                .map(|item| self.deserialize(item, registry))
                .collect::<EdmResult<Vec<_>>>()?;
            return Ok(EdmValue::Collection(out));
        }
        match &self.kind {
            FieldKind::Unresolved => Ok(json_to_edm(wire)),
            FieldKind::Primitive(codec) => codec.deserialize(wire),
            FieldKind::Entity(name) => match registry.parser_for_type(name) {
                Some(Parser::Entity(parser)) => parser.deserialize(wire, registry),
                _ => Err(EdmError::UnresolvedType(name.clone())),
            },
            FieldKind::Enum(name) => match registry.parser_for_type(name) {
                Some(Parser::Enum(parser)) => parser.deserialize(wire),
                _ => Err(EdmError::UnresolvedType(name.clone())),
            },
        }
    }

    pub(crate) fn serialize(&self, value: &EdmValue, registry: &Registry) -> EdmResult<Json> {
        if let EdmValue::Collection(items) = value {
            let out = items
                .iter()
                .map(|item| self.serialize(item, registry))
                .collect::<EdmResult<Vec<_>>>()?;
            return Ok(Json::Array(out));
        }
        match &self.kind {
            FieldKind::Unresolved => edm_to_json(value),
            FieldKind::Primitive(codec) => codec.serialize(value),
            FieldKind::Entity(name) => match registry.parser_for_type(name) {
                Some(Parser::Entity(parser)) => parser.serialize(value, registry),
                _ => Err(EdmError::UnresolvedType(name.clone())),
            },
            FieldKind::Enum(name) => match registry.parser_for_type(name) {
                Some(Parser::Enum(parser)) => parser.serialize(value),
                _ => Err(EdmError::UnresolvedType(name.clone())),
            },
        }
    }

    /// URL-literal form of a value of this field, used for key predicates.
    pub(crate) fn encode(&self, value: &EdmValue, registry: &Registry) -> EdmResult<String> {
        match &self.kind {
            FieldKind::Enum(name) => match registry.parser_for_type(name) {
                Some(Parser::Enum(parser)) => parser.encode(value),
                _ => Err(EdmError::UnresolvedType(name.clone())),
            },
            FieldKind::Primitive(codec) => codec.encode(value),
            _ => crate::primitive::encode_value(value),
        }
    }
}

/// Parser for one entity or complex type.
#[derive(Debug, Clone)]
pub struct EntityParser {
    /// Qualified name, e.g. `"Trippin.Person"`.
    pub name: String,
    pub fields: Vec<FieldParser>,
    /// Qualified name of the base type, if any.
    pub parent: Option<String>,
}

impl EntityParser {
    /// Marshal a wire object into an [`EdmValue::Object`].
    ///
    /// Parent fields apply first, then own fields. Fields absent from the
    /// source stay absent — they are never materialized as nulls. Members the
    /// schema does not declare (annotations, open-type payload) pass through.
    ///
    /// # Errors
    /// Propagates field-level coercion failures.
    pub fn deserialize(&self, wire: &Json, registry: &Registry) -> EdmResult<EdmValue> {
        if let Json::Array(items) = wire {
            let out = items
                .iter()
                .map(|item| self.deserialize(item, registry))
                .collect::<EdmResult<Vec<_>>>()?;
            return Ok(EdmValue::Collection(out));
        }
        let Json::Object(source) = wire else {
            return Err(EdmError::TypeMismatch {
                type_name: self.name.clone(),
                expected: "object",
                got: wire.to_string(),
            });
        };

        let mut out = match self.parent_parser(registry)? {
            Some(parent) => match parent.deserialize(wire, registry)? {
                EdmValue::Object(map) => map,
                other => return Err(EdmError::TypeMismatch {
                    type_name: parent.name.clone(),
                    expected: "object",
                    got: other.to_string(),
                }),
            },
            None => std::collections::BTreeMap::new(),
        };

        for field in &self.fields {
            if let Some(raw) = source.get(&field.name) {
                if raw.is_null() {
                    continue;
                }
                out.insert(field.name.clone(), field.deserialize(raw, registry)?);
            }
        }
        // Undeclared members survive unchanged.
        for (name, raw) in source {
            if !out.contains_key(name) && !self.declares(name, registry) {
                out.insert(name.clone(), json_to_edm(raw));
            }
        }
        Ok(EdmValue::Object(out))
    }

    /// Marshal an application object back to wire JSON, parent-first,
    /// skipping fields the value does not carry.
    ///
    /// # Errors
    /// Propagates field-level serialization failures.
    pub fn serialize(&self, value: &EdmValue, registry: &Registry) -> EdmResult<Json> {
        if let EdmValue::Collection(items) = value {
            let out = items
                .iter()
                .map(|item| self.serialize(item, registry))
                .collect::<EdmResult<Vec<_>>>()?;
            return Ok(Json::Array(out));
        }
        let EdmValue::Object(source) = value else {
            return Err(EdmError::TypeMismatch {
                type_name: self.name.clone(),
                expected: "object",
                got: value.to_string(),
            });
        };

        let mut out = match self.parent_parser(registry)? {
            Some(parent) => match parent.serialize(value, registry)? {
                Json::Object(map) => map,
                other => return Err(EdmError::TypeMismatch {
                    type_name: parent.name.clone(),
                    expected: "object",
                    got: other.to_string(),
                }),
            },
            None => serde_json::Map::new(),
        };

        for field in &self.fields {
            if let Some(item) = source.get(&field.name) {
                if item.is_null() {
                    continue;
                }
                out.insert(field.name.clone(), field.serialize(item, registry)?);
            }
        }
        for (name, item) in source {
            if !out.contains_key(name) && !self.declares(name, registry) {
                out.insert(name.clone(), edm_to_json(item)?);
            }
        }
        Ok(Json::Object(out))
    }

    /// All key fields, parent keys first.
    #[must_use]
    pub fn keys<'a>(&'a self, registry: &'a Registry) -> Vec<&'a FieldParser> {
        let mut out = Vec::new();
        if let Ok(Some(parent)) = self.parent_parser(registry) {
            out.extend(parent.keys(registry));
        }
        out.extend(self.fields.iter().filter(|f| f.key));
        out
    }

    /// Find a declared field by name, traversing the parent chain.
    #[must_use]
    pub fn field<'a>(&'a self, name: &str, registry: &'a Registry) -> Option<&'a FieldParser> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .or_else(|| match self.parent_parser(registry) {
                Ok(Some(parent)) => parent.field(name, registry),
                _ => None,
            })
    }

    /// Wire type name of a declared field.
    #[must_use]
    pub fn type_for(&self, name: &str, registry: &Registry) -> Option<String> {
        self.field(name, registry).map(|f| f.wire_type.clone())
    }

    /// Resolve the key of a wire/application JSON object.
    ///
    /// Walks the declared key fields (parent keys first), following `ref`
    /// dot-paths for composite components. A single key field collapses to a
    /// bare value. Returns `Ok(None)` when any component is missing.
    ///
    /// # Errors
    /// Propagates coercion failures of present key values.
    pub fn resolve_key(&self, entity: &Json, registry: &Registry) -> EdmResult<Option<EntityKey>> {
        let keys = self.keys(registry);
        let mut parts: Vec<(String, EdmValue)> = Vec::with_capacity(keys.len());
        for field in keys {
            let path = field.ref_path.as_deref().unwrap_or(&field.name);
            let Some(raw) = json_at_path(entity, path) else {
                return Ok(None);
            };
            if raw.is_null() {
                return Ok(None);
            }
            let name = path.rsplit('.').next().unwrap_or(path).to_owned();
            parts.push((name, field.deserialize(raw, registry)?));
        }
        Ok(match parts.len() {
            0 => None,
            1 => Some(EntityKey::Single(parts.remove(0).1)),
            _ => Some(EntityKey::Composite(parts)),
        })
    }

    fn declares(&self, name: &str, registry: &Registry) -> bool {
        self.field(name, registry).is_some()
    }

    fn parent_parser<'a>(&self, registry: &'a Registry) -> EdmResult<Option<&'a EntityParser>> {
        match &self.parent {
            None => Ok(None),
            Some(parent) => match registry.parser_for_type(parent) {
                Some(Parser::Entity(parser)) => Ok(Some(parser)),
                _ => Err(EdmError::UnresolvedType(parent.clone())),
            },
        }
    }
}

/// Walk a dot-delimited path into a JSON object.
pub(crate) fn json_at_path<'a>(value: &'a Json, path: &str) -> Option<&'a Json> {
    let mut current = value;
    for part in path.split('.') {
        current = current.get(part)?;
    }
    Some(current)
}
