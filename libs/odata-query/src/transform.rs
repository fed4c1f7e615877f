//! `$apply` transformation pipelines.
//!
//! A descriptor is one transformation object or an array of them; array
//! items render in order joined by `/`. Supported transformations are
//! `aggregate`, `filter` and `groupby`.

use serde_json::Value as Json;

use crate::errors::{QueryError, QueryResult};
use crate::filter::Filter;
use crate::literal::Aliases;

/// Render an `$apply` descriptor to canonical text.
///
/// # Errors
/// Returns `QueryError::UnsupportedTransform` for unknown transformation
/// keys and `QueryError::InvalidDescriptor` for unusable shapes.
pub fn render_transform(descriptor: &Json, aliases: &mut Aliases) -> QueryResult<String> {
    match descriptor {
        Json::String(text) => Ok(text.clone()),
        Json::Array(items) => {
            let parts = items
                .iter()
                .map(|item| render_transform(item, aliases))
                .collect::<QueryResult<Vec<_>>>()?;
            Ok(parts.join("/"))
        }
        Json::Object(map) => {
            let parts = map
                .iter()
                .map(|(key, value)| render_one(key, value, aliases))
                .collect::<QueryResult<Vec<_>>>()?;
            Ok(parts.join("/"))
        }
        other => Err(QueryError::InvalidDescriptor(format!(
            "$apply must be string, array or object, got {other}"
        ))),
    }
}

fn render_one(key: &str, value: &Json, aliases: &mut Aliases) -> QueryResult<String> {
    match key {
        "aggregate" => Ok(format!("aggregate({})", render_aggregate(value)?)),
        "filter" => Ok(format!(
            "filter({})",
            Filter::from_value(value)?.render(aliases)?
        )),
        "groupby" => render_group_by(value, aliases),
        other => Err(QueryError::UnsupportedTransform(other.to_owned())),
    }
}

fn render_aggregate(value: &Json) -> QueryResult<String> {
    match value {
        Json::String(text) => Ok(text.clone()),
        Json::Array(items) => {
            let parts = items
                .iter()
                .map(render_aggregate)
                .collect::<QueryResult<Vec<_>>>()?;
            Ok(parts.join(","))
        }
        // {property: {with: "sum", as: "Total"}}
        Json::Object(map) => {
            let parts = map
                .iter()
                .map(|(prop, spec)| render_aggregate_spec(prop, spec))
                .collect::<QueryResult<Vec<_>>>()?;
            Ok(parts.join(","))
        }
        other => Err(QueryError::InvalidDescriptor(format!(
            "aggregate must be string, array or object, got {other}"
        ))),
    }
}

fn render_aggregate_spec(prop: &str, spec: &Json) -> QueryResult<String> {
    let Json::Object(map) = spec else {
        return Err(QueryError::InvalidDescriptor(format!(
            "aggregate spec for '{prop}' must be an object, got {spec}"
        )));
    };
    let mut out = prop.to_owned();
    if let Some(Json::String(with)) = map.get("with") {
        out.push_str(" with ");
        out.push_str(with);
    }
    if let Some(Json::String(alias)) = map.get("as") {
        out.push_str(" as ");
        out.push_str(alias);
    }
    Ok(out)
}

fn render_group_by(value: &Json, aliases: &mut Aliases) -> QueryResult<String> {
    // Either a bare property list or {properties: [...], transform: {...}}.
    let (properties, nested) = match value {
        Json::Object(map) if map.contains_key("properties") => {
            (map.get("properties"), map.get("transform"))
        }
        other => (Some(other), None),
    };
    let Some(properties) = properties else {
        return Err(QueryError::InvalidDescriptor(
            "groupby needs a property list".to_owned(),
        ));
    };
    let names = match properties {
        Json::String(text) => text.clone(),
        Json::Array(items) => items
            .iter()
            .map(|item| match item {
                Json::String(name) => Ok(name.clone()),
                other => Err(QueryError::InvalidDescriptor(format!(
                    "groupby property must be a string, got {other}"
                ))),
            })
            .collect::<QueryResult<Vec<_>>>()?
            .join(","),
        other => {
            return Err(QueryError::InvalidDescriptor(format!(
                "groupby properties must be string or array, got {other}"
            )));
        }
    };
    match nested {
        Some(transform) => Ok(format!(
            "groupby(({names}),{})",
            render_transform(transform, aliases)?
        )),
        None => Ok(format!("groupby(({names}))")),
    }
}
