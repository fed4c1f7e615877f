//! Schema registry: two-phase construct-then-link parser graph.
//!
//! Phase one builds standalone parsers from the raw schema config. Phase two
//! links every cross-type reference (field types, parent chains, callable
//! parameters and returns) against the declared name table; anything that
//! does not resolve is a configuration error here, never a silent miss at
//! first use.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value as Json;

use crate::callable::CallableParser;
use crate::entity::{EntityParser, FieldKind, FieldParser};
use crate::enums::EnumParser;
use crate::errors::{EdmError, EdmResult};
use crate::primitive::{PrimitiveCodec, edm_to_json, json_to_edm};
use crate::value::EdmValue;

/// Global marshalling options, fixed at registry construction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistryOptions {
    #[serde(default)]
    pub string_as_enum: bool,
    #[serde(default)]
    pub ieee754_compatible: bool,
}

/// Raw schema for one namespace, as supplied by the metadata collaborator.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaConfig {
    pub namespace: String,
    #[serde(default)]
    pub enums: Vec<EnumConfig>,
    #[serde(default)]
    pub entities: Vec<EntityConfig>,
    #[serde(default)]
    pub callables: Vec<CallableConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnumConfig {
    pub name: String,
    #[serde(default)]
    pub flags: bool,
    /// Member name to numeric value. Rendering order is ascending value.
    pub members: HashMap<String, i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityConfig {
    pub name: String,
    /// Qualified base type name for single inheritance.
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub wire_type: String,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default)]
    pub key: bool,
    #[serde(default)]
    pub navigation: bool,
    #[serde(default)]
    pub collection: bool,
    #[serde(default)]
    pub precision: Option<u32>,
    #[serde(default)]
    pub scale: Option<u32>,
    #[serde(rename = "ref", default)]
    pub ref_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallableConfig {
    pub name: String,
    #[serde(default)]
    pub bound: bool,
    #[serde(default)]
    pub parameters: Vec<FieldConfig>,
    #[serde(rename = "return", default)]
    pub return_type: Option<String>,
}

fn default_true() -> bool {
    true
}

/// A linked parser for one declared type.
#[derive(Debug, Clone)]
pub enum Parser {
    Primitive(PrimitiveCodec),
    Entity(EntityParser),
    Enum(EnumParser),
    Callable(CallableParser),
}

/// Linked parser graph for a service's whole schema tree.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    parsers: HashMap<String, Parser>,
    options: RegistryOptions,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum DeclKind {
    Entity,
    Enum,
    Callable,
}

impl Registry {
    /// Build and link a registry from raw schema configs.
    ///
    /// # Errors
    /// Returns `EdmError::DuplicateType` for colliding declarations and
    /// `EdmError::UnresolvedType` listing every reference that does not
    /// resolve.
    pub fn build(schemas: &[SchemaConfig], options: RegistryOptions) -> EdmResult<Self> {
        // Phase 1: declared-name table.
        let mut declared: HashMap<String, DeclKind> = HashMap::new();
        for schema in schemas {
            for e in &schema.enums {
                let name = qualify(&schema.namespace, &e.name);
                if declared.insert(name.clone(), DeclKind::Enum).is_some() {
                    return Err(EdmError::DuplicateType(name));
                }
            }
            for e in &schema.entities {
                let name = qualify(&schema.namespace, &e.name);
                if declared.insert(name.clone(), DeclKind::Entity).is_some() {
                    return Err(EdmError::DuplicateType(name));
                }
            }
            for c in &schema.callables {
                let name = qualify(&schema.namespace, &c.name);
                if declared.insert(name.clone(), DeclKind::Callable).is_some() {
                    return Err(EdmError::DuplicateType(name));
                }
            }
        }

        // Phase 2: construct parsers with every reference linked.
        let mut unresolved: Vec<String> = Vec::new();
        let mut parsers: HashMap<String, Parser> = HashMap::new();

        for schema in schemas {
            for e in &schema.enums {
                let name = qualify(&schema.namespace, &e.name);
                let mut members: Vec<(String, i64)> =
                    e.members.iter().map(|(k, v)| (k.clone(), *v)).collect();
                members.sort_by_key(|(_, v)| *v);
                parsers.insert(
                    name.clone(),
                    Parser::Enum(EnumParser {
                        name,
                        members,
                        flags: e.flags,
                        string_as_enum: options.string_as_enum,
                    }),
                );
            }
            for e in &schema.entities {
                let name = qualify(&schema.namespace, &e.name);
                if let Some(base) = &e.base {
                    if declared.get(base) != Some(&DeclKind::Entity) {
                        unresolved.push(base.clone());
                    }
                }
                let fields = e
                    .fields
                    .iter()
                    .map(|f| link_field(f, &declared, &options, &mut unresolved))
                    .collect();
                parsers.insert(
                    name.clone(),
                    Parser::Entity(EntityParser {
                        name,
                        fields,
                        parent: e.base.clone(),
                    }),
                );
            }
            for c in &schema.callables {
                let name = qualify(&schema.namespace, &c.name);
                if let Some(ret) = &c.return_type {
                    let (base, _) = strip_collection(ret);
                    if !base.starts_with("Edm.") && !declared.contains_key(base) {
                        unresolved.push(base.to_owned());
                    }
                }
                let parameters = c
                    .parameters
                    .iter()
                    .map(|p| link_field(p, &declared, &options, &mut unresolved))
                    .collect();
                parsers.insert(
                    name.clone(),
                    Parser::Callable(CallableParser {
                        name,
                        bound: c.bound,
                        parameters,
                        return_type: c.return_type.clone(),
                    }),
                );
            }
        }

        if !unresolved.is_empty() {
            unresolved.sort();
            unresolved.dedup();
            return Err(EdmError::UnresolvedType(unresolved.join(", ")));
        }

        tracing::debug!(types = parsers.len(), "schema registry linked");
        Ok(Self { parsers, options })
    }

    /// Look up the parser for a qualified type name.
    #[must_use]
    pub fn parser_for_type(&self, name: &str) -> Option<&Parser> {
        self.parsers.get(name)
    }

    #[must_use]
    pub fn entity(&self, name: &str) -> Option<&EntityParser> {
        match self.parsers.get(name) {
            Some(Parser::Entity(p)) => Some(p),
            _ => None,
        }
    }

    #[must_use]
    pub fn enum_type(&self, name: &str) -> Option<&EnumParser> {
        match self.parsers.get(name) {
            Some(Parser::Enum(p)) => Some(p),
            _ => None,
        }
    }

    #[must_use]
    pub fn callable(&self, name: &str) -> Option<&CallableParser> {
        match self.parsers.get(name) {
            Some(Parser::Callable(p)) => Some(p),
            _ => None,
        }
    }

    #[must_use]
    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    /// Marshal a wire value by type name. Unknown names pass through.
    ///
    /// # Errors
    /// Propagates codec failures for known types.
    pub fn deserialize(&self, type_name: &str, wire: &Json) -> EdmResult<EdmValue> {
        match self.parsers.get(type_name) {
            Some(Parser::Entity(p)) => p.deserialize(wire, self),
            Some(Parser::Enum(p)) => p.deserialize(wire),
            Some(Parser::Primitive(codec)) => codec.deserialize(wire),
            Some(Parser::Callable(_)) | None => {
                let codec = PrimitiveCodec::for_type_name(type_name)
                    .with_ieee754(self.options.ieee754_compatible);
                codec.deserialize(wire)
            }
        }
    }

    /// Marshal an application value to wire form by type name.
    ///
    /// # Errors
    /// Propagates codec failures for known types.
    pub fn serialize(&self, type_name: &str, value: &EdmValue) -> EdmResult<Json> {
        match self.parsers.get(type_name) {
            Some(Parser::Entity(p)) => p.serialize(value, self),
            Some(Parser::Enum(p)) => p.serialize(value),
            Some(Parser::Primitive(codec)) => codec.serialize(value),
            Some(Parser::Callable(_)) | None => {
                let codec = PrimitiveCodec::for_type_name(type_name)
                    .with_ieee754(self.options.ieee754_compatible);
                codec.serialize(value)
            }
        }
    }

    /// URL-literal form of a value by type name.
    ///
    /// # Errors
    /// Propagates codec failures for known types.
    pub fn encode(&self, type_name: &str, value: &EdmValue) -> EdmResult<String> {
        match self.parsers.get(type_name) {
            Some(Parser::Enum(p)) => p.encode(value),
            Some(Parser::Primitive(codec)) => codec.encode(value),
            _ => PrimitiveCodec::for_type_name(type_name).encode(value),
        }
    }

    /// Marshal an arbitrary wire JSON value without a declared type.
    #[must_use]
    pub fn deserialize_untyped(&self, wire: &Json) -> EdmValue {
        json_to_edm(wire)
    }

    /// Inverse of [`Registry::deserialize_untyped`].
    ///
    /// # Errors
    /// Returns `EdmError::NotEncodable` for values with no JSON form.
    pub fn serialize_untyped(&self, value: &EdmValue) -> EdmResult<Json> {
        edm_to_json(value)
    }
}

fn link_field(
    config: &FieldConfig,
    declared: &HashMap<String, DeclKind>,
    options: &RegistryOptions,
    unresolved: &mut Vec<String>,
) -> FieldParser {
    let (base_type, wrapped) = strip_collection(&config.wire_type);
    let kind = if base_type.starts_with("Edm.") {
        FieldKind::Primitive(
            PrimitiveCodec::for_type_name(base_type)
                .with_ieee754(options.ieee754_compatible)
                .with_precision(config.precision, config.scale),
        )
    } else {
        match declared.get(base_type) {
            Some(DeclKind::Entity) => FieldKind::Entity(base_type.to_owned()),
            Some(DeclKind::Enum) => FieldKind::Enum(base_type.to_owned()),
            _ => {
                unresolved.push(base_type.to_owned());
                FieldKind::Unresolved
            }
        }
    };
    FieldParser {
        name: config.name.clone(),
        wire_type: base_type.to_owned(),
        nullable: config.nullable,
        key: config.key,
        navigation: config.navigation,
        collection: config.collection || wrapped,
        precision: config.precision,
        scale: config.scale,
        ref_path: config.ref_path.clone(),
        kind,
    }
}

/// Split `"Collection(X)"` into `("X", true)`.
fn strip_collection(name: &str) -> (&str, bool) {
    name.strip_prefix("Collection(")
        .and_then(|rest| rest.strip_suffix(')'))
        .map_or((name, false), |inner| (inner, true))
}

fn qualify(namespace: &str, name: &str) -> String {
    format!("{namespace}.{name}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn trippin() -> Vec<SchemaConfig> {
        serde_json::from_value(json!([{
            "namespace": "Trippin",
            "enums": [{
                "name": "PersonGender",
                "flags": false,
                "members": {"Male": 0, "Female": 1, "Unknown": 2}
            }],
            "entities": [
                {
                    "name": "Person",
                    "fields": [
                        {"name": "UserName", "type": "Edm.String", "key": true, "nullable": false},
                        {"name": "FirstName", "type": "Edm.String"},
                        {"name": "Gender", "type": "Trippin.PersonGender"},
                        {"name": "Friends", "type": "Trippin.Person", "collection": true, "navigation": true}
                    ]
                },
                {
                    "name": "Manager",
                    "base": "Trippin.Person",
                    "fields": [
                        {"name": "Budget", "type": "Edm.Int64", "nullable": false}
                    ]
                }
            ],
            "callables": [{
                "name": "GetNearestAirport",
                "parameters": [
                    {"name": "lat", "type": "Edm.Double"},
                    {"name": "lon", "type": "Edm.Double"}
                ],
                "return": "Edm.String"
            }]
        }]))
        .unwrap()
    }

    #[test]
    fn links_a_complete_schema() {
        let registry = Registry::build(&trippin(), RegistryOptions::default()).unwrap();
        assert!(registry.entity("Trippin.Person").is_some());
        assert!(registry.enum_type("Trippin.PersonGender").is_some());
        assert!(registry.callable("Trippin.GetNearestAirport").is_some());
    }

    #[test]
    fn unresolved_reference_fails_at_link_time() {
        let mut schemas = trippin();
        schemas[0].entities[0].fields.push(FieldConfig {
            name: "Photo".to_owned(),
            wire_type: "Trippin.Photo".to_owned(),
            nullable: true,
            key: false,
            navigation: true,
            collection: false,
            precision: None,
            scale: None,
            ref_path: None,
        });
        let err = Registry::build(&schemas, RegistryOptions::default()).unwrap_err();
        assert!(matches!(err, EdmError::UnresolvedType(ref t) if t.contains("Trippin.Photo")));
    }

    #[test]
    fn duplicate_declaration_is_rejected() {
        let mut schemas = trippin();
        let dup = schemas[0].entities[0].clone();
        schemas[0].entities.push(dup);
        assert!(matches!(
            Registry::build(&schemas, RegistryOptions::default()),
            Err(EdmError::DuplicateType(_))
        ));
    }

    #[test]
    fn entity_round_trip_with_inheritance() {
        let registry = Registry::build(&trippin(), RegistryOptions::default()).unwrap();
        let wire = json!({
            "UserName": "russellwhyte",
            "FirstName": "Russell",
            "Gender": "Male",
            "Budget": 1000000
        });
        let value = registry.deserialize("Trippin.Manager", &wire).unwrap();
        let back = registry.serialize("Trippin.Manager", &value).unwrap();
        assert_eq!(back["UserName"], json!("russellwhyte"));
        assert_eq!(back["Budget"], json!(1_000_000));
        // Non-string_as_enum mode qualifies the literal.
        assert_eq!(back["Gender"], json!("Trippin.PersonGender'Male'"));
    }

    #[test]
    fn absent_fields_stay_absent() {
        let registry = Registry::build(&trippin(), RegistryOptions::default()).unwrap();
        let wire = json!({"UserName": "mirsking"});
        let value = registry.deserialize("Trippin.Person", &wire).unwrap();
        let back = registry.serialize("Trippin.Person", &value).unwrap();
        assert_eq!(back, json!({"UserName": "mirsking"}));
    }

    #[test]
    fn resolve_key_collapses_single_key() {
        let registry = Registry::build(&trippin(), RegistryOptions::default()).unwrap();
        let person = registry.entity("Trippin.Person").unwrap();
        let key = person
            .resolve_key(&json!({"UserName": "russellwhyte"}), &registry)
            .unwrap()
            .unwrap();
        assert_eq!(
            key,
            crate::value::EntityKey::Single(EdmValue::String("russellwhyte".to_owned()))
        );
    }

    #[test]
    fn resolve_key_missing_component_is_none() {
        let registry = Registry::build(&trippin(), RegistryOptions::default()).unwrap();
        let person = registry.entity("Trippin.Person").unwrap();
        assert_eq!(
            person
                .resolve_key(&json!({"FirstName": "Russell"}), &registry)
                .unwrap(),
            None
        );
    }

    #[test]
    fn callable_serialize_skips_absent_parameters() {
        let registry = Registry::build(&trippin(), RegistryOptions::default()).unwrap();
        let callable = registry.callable("Trippin.GetNearestAirport").unwrap();
        let body = callable
            .serialize(&json!({"lat": 47.6, "lon": null}), &registry)
            .unwrap();
        assert_eq!(body, json!({"lat": 47.6}));
    }
}
