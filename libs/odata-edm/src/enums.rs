//! Enum type parsers.
//!
//! Flag enums combine on deserialize by OR-reduction over member names and
//! serialize back to a comma-joined name list. Both `flags` and
//! `string_as_enum` are fixed when the parser is constructed; call sites that
//! need a different literal style build their own literal text instead of
//! mutating a shared registry entry.

use serde_json::Value as Json;

use crate::errors::{EdmError, EdmResult};
use crate::value::EdmValue;

#[derive(Debug, Clone)]
pub struct EnumParser {
    /// Qualified name, e.g. `"Trippin.PersonGender"`.
    pub name: String,
    /// Members in ascending value order.
    pub members: Vec<(String, i64)>,
    pub flags: bool,
    /// `true` renders bare member names; `false` the fully qualified
    /// `Namespace.Type'Member'` form.
    pub string_as_enum: bool,
}

impl EnumParser {
    /// Marshal a wire value (member name list or raw number) to its numeric
    /// application value.
    ///
    /// # Errors
    /// Returns `EdmError::UnknownEnumMember` for names outside the member set.
    pub fn deserialize(&self, wire: &Json) -> EdmResult<EdmValue> {
        if let Json::Array(items) = wire {
            let out = items
                .iter()
                .map(|item| self.deserialize(item))
                .collect::<EdmResult<Vec<_>>>()?;
            return Ok(EdmValue::Collection(out));
        }
        match wire {
            Json::Null => Ok(EdmValue::Null),
            Json::Number(n) => n.as_i64().map(EdmValue::Int).ok_or_else(|| {
                EdmError::UnknownEnumMember {
                    type_name: self.name.clone(),
                    member: n.to_string(),
                }
            }),
            Json::String(s) => {
                let mut acc = 0i64;
                for part in s.split(',') {
                    acc |= self.value_of(part.trim())?;
                }
                Ok(EdmValue::Int(acc))
            }
            other => Err(EdmError::TypeMismatch {
                type_name: self.name.clone(),
                expected: "string or number",
                got: other.to_string(),
            }),
        }
    }

    /// Marshal a numeric application value to its wire name list.
    ///
    /// # Errors
    /// Returns `EdmError::UnknownEnumMember` when the value maps to no member.
    pub fn serialize(&self, value: &EdmValue) -> EdmResult<Json> {
        if let EdmValue::Collection(items) = value {
            let out = items
                .iter()
                .map(|item| self.serialize(item))
                .collect::<EdmResult<Vec<_>>>()?;
            return Ok(Json::Array(out));
        }
        if value.is_null() {
            return Ok(Json::Null);
        }
        let names = self.names_for(value)?.join(", ");
        if self.string_as_enum {
            Ok(Json::String(names))
        } else {
            Ok(Json::String(format!("{}'{}'", self.name, names)))
        }
    }

    /// URL literal form, quoting per the `string_as_enum` mode.
    ///
    /// # Errors
    /// Returns `EdmError::UnknownEnumMember` when the value maps to no member.
    pub fn encode(&self, value: &EdmValue) -> EdmResult<String> {
        let names = self.names_for(value)?.join(", ");
        if self.string_as_enum {
            Ok(format!("'{names}'"))
        } else {
            Ok(format!("{}'{}'", self.name, names))
        }
    }

    fn names_for(&self, value: &EdmValue) -> EdmResult<Vec<String>> {
        let n = match value {
            EdmValue::Int(n) => *n,
            EdmValue::String(s) => {
                // Already a name list; validate and normalize.
                let mut out = Vec::new();
                for part in s.split(',') {
                    let part = part.trim();
                    self.value_of(part)?;
                    out.push(part.to_owned());
                }
                return Ok(out);
            }
            other => {
                return Err(EdmError::TypeMismatch {
                    type_name: self.name.clone(),
                    expected: "int or string",
                    got: other.to_string(),
                });
            }
        };
        if self.flags {
            let out: Vec<String> = self
                .members
                .iter()
                .filter(|(_, v)| n & v == *v)
                .map(|(name, _)| name.clone())
                .collect();
            if out.is_empty() {
                return Err(EdmError::UnknownEnumMember {
                    type_name: self.name.clone(),
                    member: n.to_string(),
                });
            }
            Ok(out)
        } else {
            self.members
                .iter()
                .find(|(_, v)| *v == n)
                .map(|(name, _)| vec![name.clone()])
                .ok_or_else(|| EdmError::UnknownEnumMember {
                    type_name: self.name.clone(),
                    member: n.to_string(),
                })
        }
    }

    fn value_of(&self, member: &str) -> EdmResult<i64> {
        self.members
            .iter()
            .find(|(name, _)| name == member)
            .map(|(_, v)| *v)
            .ok_or_else(|| EdmError::UnknownEnumMember {
                type_name: self.name.clone(),
                member: member.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn gender(flags: bool, string_as_enum: bool) -> EnumParser {
        EnumParser {
            name: "Trippin.PersonGender".to_owned(),
            members: vec![
                ("Male".to_owned(), 0),
                ("Female".to_owned(), 1),
                ("Unknown".to_owned(), 2),
            ],
            flags,
            string_as_enum,
        }
    }

    #[test]
    fn deserializes_single_member() {
        let p = gender(false, true);
        assert_eq!(p.deserialize(&json!("Female")).unwrap(), EdmValue::Int(1));
        assert_eq!(p.deserialize(&json!(2)).unwrap(), EdmValue::Int(2));
    }

    #[test]
    fn flags_or_reduce_on_deserialize() {
        let p = gender(true, true);
        assert_eq!(
            p.deserialize(&json!("Female, Unknown")).unwrap(),
            EdmValue::Int(3)
        );
    }

    #[test]
    fn flags_serialize_includes_zero_member() {
        // 3 matches Female and Unknown by bitmask, and Male trivially (0).
        let p = gender(true, true);
        assert_eq!(
            p.serialize(&EdmValue::Int(3)).unwrap(),
            json!("Male, Female, Unknown")
        );
    }

    #[test]
    fn qualified_literal_without_string_as_enum() {
        let p = gender(false, false);
        assert_eq!(
            p.serialize(&EdmValue::Int(1)).unwrap(),
            json!("Trippin.PersonGender'Female'")
        );
        assert_eq!(
            p.encode(&EdmValue::Int(1)).unwrap(),
            "Trippin.PersonGender'Female'"
        );
    }

    #[test]
    fn bare_literal_with_string_as_enum() {
        let p = gender(false, true);
        assert_eq!(p.encode(&EdmValue::Int(1)).unwrap(), "'Female'");
    }

    #[test]
    fn unknown_member_is_an_error() {
        let p = gender(false, true);
        assert!(matches!(
            p.deserialize(&json!("Other")),
            Err(EdmError::UnknownEnumMember { .. })
        ));
    }
}
