//! URL literal rendering for permissive JSON descriptor values.
//!
//! Descriptors carry literals as plain `serde_json::Value`; four tagged
//! object shapes bypass default quoting:
//! - `{"$raw": text}` — verbatim passthrough
//! - `{"$duration": text}` — `duration'...'` wrapper
//! - `{"$binary": text}` — `binary'...'` wrapper
//! - `{"$alias": {"name": n, "value": v}}` — emits `@n` in place and records
//!   the rendered value as an `@n=value` side parameter
//!
//! String escaping is shared with the EDM layer so key predicates and filter
//! literals quote identically.

use std::sync::LazyLock;

use odata_edm::{EdmValue, EntityKey, encode_value, escape_string_literal};
use regex::Regex;
use serde_json::{Value as Json, json};

use crate::errors::{QueryError, QueryResult};

static GUID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .unwrap()
});

/// Alias side parameters collected while rendering, emitted after all
/// regular query options.
pub type Aliases = Vec<(String, String)>;

/// Tag a value for verbatim emission.
#[must_use]
pub fn raw(text: impl Into<String>) -> Json {
    json!({"$raw": text.into()})
}

/// Tag a textual ISO-8601 duration literal.
#[must_use]
pub fn duration(text: impl Into<String>) -> Json {
    json!({"$duration": text.into()})
}

/// Tag a base64 binary literal.
#[must_use]
pub fn binary(text: impl Into<String>) -> Json {
    json!({"$binary": text.into()})
}

/// Tag a value as an `@name` alias parameter.
#[must_use]
pub fn alias(name: impl Into<String>, value: Json) -> Json {
    json!({"$alias": {"name": name.into(), "value": value}})
}

/// Bridge a typed EDM value into a descriptor literal via its URL encoding.
///
/// # Errors
/// Propagates `EdmError::NotEncodable` for structural values.
pub fn edm(value: &EdmValue) -> QueryResult<Json> {
    Ok(raw(encode_value(value)?))
}

/// True for strings shaped like a GUID, which render unquoted.
#[must_use]
pub fn is_guid_like(s: &str) -> bool {
    GUID_RE.is_match(s)
}

/// Render a descriptor value as filter-literal text.
///
/// # Errors
/// Returns `QueryError::InvalidDescriptor` for untagged objects.
pub fn render_literal(value: &Json, aliases: &mut Aliases) -> QueryResult<String> {
    match value {
        Json::Null => Ok("null".to_owned()),
        Json::Bool(b) => Ok(b.to_string()),
        Json::Number(n) => Ok(n.to_string()),
        Json::String(s) => Ok(escape_string_literal(s)),
        Json::Array(items) => {
            let parts = items
                .iter()
                .map(|item| render_literal(item, aliases))
                .collect::<QueryResult<Vec<_>>>()?;
            Ok(format!("[{}]", parts.join(",")))
        }
        Json::Object(_) => render_tagged(value, aliases)
            .ok_or_else(|| QueryError::InvalidDescriptor(format!("object literal {value}")))?,
    }
}

/// Render a key predicate value: GUID-shaped strings stay unquoted.
///
/// # Errors
/// Returns `QueryError::InvalidDescriptor` for untagged non-composite objects.
pub fn render_key_literal(value: &Json, aliases: &mut Aliases) -> QueryResult<String> {
    if let Json::String(s) = value {
        if is_guid_like(s) {
            return Ok(s.clone());
        }
    }
    render_literal(value, aliases)
}

/// Render a resolved [`EntityKey`] as a key predicate body.
///
/// # Errors
/// Propagates non-encodable component values.
pub fn render_entity_key(key: &EntityKey) -> QueryResult<String> {
    match key {
        EntityKey::Single(value) => Ok(encode_value(value)?),
        EntityKey::Composite(parts) => {
            let rendered = parts
                .iter()
                .map(|(name, value)| Ok(format!("{name}={}", encode_value(value)?)))
                .collect::<QueryResult<Vec<_>>>()?;
            Ok(rendered.join(","))
        }
    }
}

/// Attempt to render one of the tagged custom shapes.
fn render_tagged(value: &Json, aliases: &mut Aliases) -> Option<QueryResult<String>> {
    let map = value.as_object()?;
    if map.len() != 1 {
        return None;
    }
    if let Some(text) = map.get("$raw").and_then(Json::as_str) {
        return Some(Ok(text.to_owned()));
    }
    if let Some(text) = map.get("$duration").and_then(Json::as_str) {
        return Some(Ok(format!("duration'{text}'")));
    }
    if let Some(text) = map.get("$binary").and_then(Json::as_str) {
        return Some(Ok(format!("binary'{text}'")));
    }
    if let Some(inner) = map.get("$alias") {
        let name = inner.get("name").and_then(Json::as_str)?;
        let target = inner.get("value")?;
        return Some(match render_literal(target, aliases) {
            Ok(rendered) => {
                let param = format!("@{name}");
                aliases.push((param.clone(), rendered));
                Ok(param)
            }
            Err(e) => Err(e),
        });
    }
    None
}

/// True when a tagged shape is present, without rendering it.
#[must_use]
pub(crate) fn is_tagged(value: &Json) -> bool {
    value.as_object().is_some_and(|map| {
        map.len() == 1
            && ["$raw", "$duration", "$binary", "$alias"]
                .iter()
                .any(|tag| map.contains_key(*tag))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_quote_and_escape() {
        let mut aliases = Aliases::new();
        assert_eq!(
            render_literal(&json!("O'Neil"), &mut aliases).unwrap(),
            "'O''Neil'"
        );
        assert_eq!(
            render_literal(&json!("a/b"), &mut aliases).unwrap(),
            "'a%2Fb'"
        );
    }

    #[test]
    fn guid_keys_stay_unquoted() {
        let mut aliases = Aliases::new();
        assert_eq!(
            render_key_literal(&json!("01234567-89ab-cdef-0123-456789abcdef"), &mut aliases)
                .unwrap(),
            "01234567-89ab-cdef-0123-456789abcdef"
        );
        assert_eq!(
            render_key_literal(&json!("russellwhyte"), &mut aliases).unwrap(),
            "'russellwhyte'"
        );
    }

    #[test]
    fn tagged_values_bypass_quoting() {
        let mut aliases = Aliases::new();
        assert_eq!(
            render_literal(&raw("geo.distance(A,B)"), &mut aliases).unwrap(),
            "geo.distance(A,B)"
        );
        assert_eq!(
            render_literal(&duration("P12DT23H59M"), &mut aliases).unwrap(),
            "duration'P12DT23H59M'"
        );
        assert_eq!(
            render_literal(&binary("T0RhdGE="), &mut aliases).unwrap(),
            "binary'T0RhdGE='"
        );
    }

    #[test]
    fn alias_registers_side_parameter() {
        let mut aliases = Aliases::new();
        let text = render_literal(&alias("city", json!("Redmond")), &mut aliases).unwrap();
        assert_eq!(text, "@city");
        assert_eq!(aliases, vec![("@city".to_owned(), "'Redmond'".to_owned())]);
    }

    #[test]
    fn untagged_object_is_rejected() {
        let mut aliases = Aliases::new();
        assert!(render_literal(&json!({"a": 1}), &mut aliases).is_err());
    }
}
