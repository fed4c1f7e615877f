//! `$orderby` descriptors.
//!
//! Accepted shapes:
//! - a string: passed through (`"Name desc"`)
//! - an array of strings or `[field, direction]` pairs
//! - an object: `{field: 1}` ascending, `{field: -1}` descending, or an
//!   explicit `"asc"`/`"desc"` string; an object value recurses with the
//!   field as a `/`-joined path prefix (`{Address: {City: -1}}` renders
//!   `Address/City desc`)

use serde_json::Value as Json;

use crate::errors::{QueryError, QueryResult};

pub fn render_order_by(descriptor: &Json) -> QueryResult<String> {
    match descriptor {
        Json::String(text) => Ok(text.clone()),
        Json::Array(items) => {
            let parts = items
                .iter()
                .map(render_item)
                .collect::<QueryResult<Vec<_>>>()?;
            Ok(parts.join(","))
        }
        Json::Object(map) => Ok(render_object(map, "")?.join(",")),
        other => Err(QueryError::InvalidDescriptor(format!(
            "$orderby must be string, array or object, got {other}"
        ))),
    }
}

fn render_object(
    map: &serde_json::Map<String, Json>,
    prefix: &str,
) -> QueryResult<Vec<String>> {
    let mut parts = Vec::with_capacity(map.len());
    for (field, dir) in map {
        let path = if prefix.is_empty() {
            field.clone()
        } else {
            format!("{prefix}/{field}")
        };
        match dir {
            Json::Object(inner) => parts.extend(render_object(inner, &path)?),
            other => parts.push(format!("{path} {}", direction(other)?)),
        }
    }
    Ok(parts)
}

fn render_item(item: &Json) -> QueryResult<String> {
    match item {
        Json::String(text) => Ok(text.clone()),
        Json::Array(pair) => match pair.as_slice() {
            [Json::String(field), dir] => Ok(format!("{field} {}", direction(dir)?)),
            [Json::String(field)] => Ok(field.clone()),
            _ => Err(QueryError::InvalidDescriptor(format!(
                "$orderby pair must be [field, direction], got {item}"
            ))),
        },
        Json::Object(_) => render_order_by(item),
        other => Err(QueryError::InvalidDescriptor(format!(
            "$orderby item must be string, pair or object, got {other}"
        ))),
    }
}

fn direction(dir: &Json) -> QueryResult<&'static str> {
    match dir {
        Json::Number(n) if n.as_i64() == Some(-1) => Ok("desc"),
        Json::Number(n) if n.as_i64() == Some(1) => Ok("asc"),
        Json::String(s) if s.eq_ignore_ascii_case("desc") => Ok("desc"),
        Json::String(s) if s.eq_ignore_ascii_case("asc") => Ok("asc"),
        other => Err(QueryError::InvalidDescriptor(format!(
            "$orderby direction must be 1, -1, 'asc' or 'desc', got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_passthrough() {
        assert_eq!(render_order_by(&json!("Name desc")).unwrap(), "Name desc");
    }

    #[test]
    fn object_directions() {
        assert_eq!(
            render_order_by(&json!({"Age": -1, "Name": 1})).unwrap(),
            "Age desc,Name asc"
        );
    }

    #[test]
    fn array_of_pairs() {
        assert_eq!(
            render_order_by(&json!([["Age", "desc"], ["Name", 1], "Id"])).unwrap(),
            "Age desc,Name asc,Id"
        );
    }

    #[test]
    fn nested_objects_prefix_paths() {
        assert_eq!(
            render_order_by(&json!({"Address": {"City": -1}})).unwrap(),
            "Address/City desc"
        );
        assert_eq!(
            render_order_by(&json!({"Location": {"City": {"Name": 1}}, "Age": -1})).unwrap(),
            "Age desc,Location/City/Name asc"
        );
        assert_eq!(
            render_order_by(&json!([{"Address": {"City": "desc"}}, "Id"])).unwrap(),
            "Address/City desc,Id"
        );
    }

    #[test]
    fn rejects_bad_direction() {
        assert!(render_order_by(&json!({"Age": 2})).is_err());
    }
}
