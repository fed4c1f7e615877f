//! Function and action parsers.

use serde_json::Value as Json;

use crate::entity::FieldParser;
use crate::errors::{EdmError, EdmResult};
use crate::registry::Registry;

/// Parser for one function or action signature.
#[derive(Debug, Clone)]
pub struct CallableParser {
    /// Qualified name, e.g. `"Trippin.GetNearestAirport"`.
    pub name: String,
    /// Bound callables take their first parameter from the resource path.
    pub bound: bool,
    pub parameters: Vec<FieldParser>,
    pub return_type: Option<String>,
}

impl CallableParser {
    /// Serialize an argument object for an action body or function call.
    ///
    /// Only parameters that are present and non-null on the input appear in
    /// the output; each is marshalled by its bound parameter parser.
    ///
    /// # Errors
    /// Propagates parameter-level coercion failures, and flags arguments
    /// that match no declared parameter.
    pub fn serialize(&self, args: &Json, registry: &Registry) -> EdmResult<Json> {
        let Json::Object(source) = args else {
            return Err(EdmError::TypeMismatch {
                type_name: self.name.clone(),
                expected: "object",
                got: args.to_string(),
            });
        };
        let mut out = serde_json::Map::new();
        for parameter in &self.parameters {
            if let Some(raw) = source.get(&parameter.name) {
                if raw.is_null() {
                    continue;
                }
                let value = parameter.deserialize(raw, registry)?;
                out.insert(parameter.name.clone(), parameter.serialize(&value, registry)?);
            }
        }
        for name in source.keys() {
            if !self.parameters.iter().any(|p| &p.name == name) {
                return Err(EdmError::TypeMismatch {
                    type_name: self.name.clone(),
                    expected: "declared parameter",
                    got: name.clone(),
                });
            }
        }
        Ok(Json::Object(out))
    }

    /// URL-literal argument pairs for inline function call syntax.
    ///
    /// # Errors
    /// Propagates parameter-level coercion failures.
    pub fn encode_parameters(
        &self,
        args: &Json,
        registry: &Registry,
    ) -> EdmResult<Vec<(String, String)>> {
        let Json::Object(source) = args else {
            return Err(EdmError::TypeMismatch {
                type_name: self.name.clone(),
                expected: "object",
                got: args.to_string(),
            });
        };
        let mut out = Vec::new();
        for parameter in &self.parameters {
            if let Some(raw) = source.get(&parameter.name) {
                if raw.is_null() {
                    continue;
                }
                let value = parameter.deserialize(raw, registry)?;
                out.push((parameter.name.clone(), parameter.encode(&value, registry)?));
            }
        }
        Ok(out)
    }
}
