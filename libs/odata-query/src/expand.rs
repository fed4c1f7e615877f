//! `$expand` descriptors.
//!
//! Accepted shapes:
//! - a string: a navigation path; `/`-separated segments fold into nested
//!   `$expand` sub-options (`Foo/Bar` renders `Foo($expand=Bar)`)
//! - an array: each item expanded and comma-joined
//! - an object: keys are navigation names, values hold sub-options
//!   (`expand`, `levels`, `select`, `top`, `count`, `orderby`, `filter`)
//!   or further nested navigations

use serde_json::Value as Json;

use crate::errors::{QueryError, QueryResult};
use crate::filter::Filter;
use crate::literal::Aliases;
use crate::orderby::render_order_by;

const SUB_OPTIONS: [&str; 7] = [
    "expand", "levels", "select", "top", "count", "orderby", "filter",
];

/// Render an `$expand` descriptor to canonical text.
///
/// # Errors
/// Returns `QueryError::InvalidDescriptor` on unusable shapes.
pub fn render_expand(descriptor: &Json, aliases: &mut Aliases) -> QueryResult<String> {
    match descriptor {
        Json::String(path) => Ok(fold_path(path)),
        Json::Array(items) => {
            let parts = items
                .iter()
                .map(|item| render_expand(item, aliases))
                .collect::<QueryResult<Vec<_>>>()?;
            Ok(parts.join(","))
        }
        Json::Object(map) => {
            let parts = map
                .iter()
                .map(|(nav, value)| render_nav(nav, value, aliases))
                .collect::<QueryResult<Vec<_>>>()?;
            Ok(parts.join(","))
        }
        other => Err(QueryError::InvalidDescriptor(format!(
            "$expand must be string, array or object, got {other}"
        ))),
    }
}

fn fold_path(path: &str) -> String {
    let mut segments = path.split('/').rev();
    let Some(last) = segments.next() else {
        return String::new();
    };
    segments.fold(last.to_owned(), |inner, seg| {
        format!("{seg}($expand={inner})")
    })
}

fn render_nav(nav: &str, value: &Json, aliases: &mut Aliases) -> QueryResult<String> {
    let Json::Object(map) = value else {
        // A non-object value selects the navigation with no sub-options.
        return Ok(fold_path(nav));
    };

    // Sub-options render in a fixed order regardless of descriptor shape.
    // Keys outside the known set are nested navigations and merge into the
    // $expand sub-option.
    let mut expand_parts = Vec::new();
    if let Some(sub_value) = map.get("expand") {
        expand_parts.push(render_expand(sub_value, aliases)?);
    }
    for (key, sub_value) in map {
        if !SUB_OPTIONS.contains(&key.as_str()) {
            expand_parts.push(render_nav(key, sub_value, aliases)?);
        }
    }

    let mut sub = Vec::with_capacity(map.len());
    if !expand_parts.is_empty() {
        sub.push(format!("$expand={}", expand_parts.join(",")));
    }
    for &key in SUB_OPTIONS.iter().skip(1) {
        if let Some(sub_value) = map.get(key) {
            sub.push(render_sub_option(key, sub_value, aliases)?);
        }
    }

    if sub.is_empty() {
        Ok(fold_path(nav))
    } else {
        Ok(format!("{nav}({})", sub.join(";")))
    }
}

fn render_sub_option(key: &str, value: &Json, aliases: &mut Aliases) -> QueryResult<String> {
    let rendered = match key {
        "filter" => Filter::from_value(value)?.render(aliases)?,
        "orderby" => render_order_by(value)?,
        "select" => render_list(value),
        "levels" | "top" | "count" => plain(value),
        _ => plain(value),
    };
    Ok(format!("${key}={rendered}"))
}

fn render_list(value: &Json) -> String {
    match value {
        Json::Array(items) => items
            .iter()
            .map(plain)
            .collect::<Vec<_>>()
            .join(","),
        other => plain(other),
    }
}

fn plain(value: &Json) -> String {
    match value {
        Json::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(descriptor: Json) -> String {
        let mut aliases = Aliases::new();
        render_expand(&descriptor, &mut aliases).unwrap()
    }

    #[test]
    fn bare_string() {
        assert_eq!(render(json!("Friends")), "Friends");
    }

    #[test]
    fn slash_path_folds() {
        assert_eq!(
            render(json!("Friends/Trips/PlanItems")),
            "Friends($expand=Trips($expand=PlanItems))"
        );
    }

    #[test]
    fn array_joins() {
        assert_eq!(render(json!(["Friends", "Trips"])), "Friends,Trips");
    }

    #[test]
    fn sub_options_semicolon_joined() {
        assert_eq!(
            render(json!({"Friends": {"select": ["FirstName"], "top": 3}})),
            "Friends($select=FirstName;$top=3)"
        );
    }

    #[test]
    fn nested_filter_sub_option() {
        assert_eq!(
            render(json!({"Trips": {"filter": {"Budget": {"gt": 1000}}}})),
            "Trips($filter=Budget gt 1000)"
        );
    }

    #[test]
    fn unknown_keys_are_nested_navigations() {
        assert_eq!(
            render(json!({"Friends": {"Trips": {"top": 1}}})),
            "Friends($expand=Trips($top=1))"
        );
    }

    #[test]
    fn levels_and_count() {
        assert_eq!(
            render(json!({"Friends": {"levels": 2, "count": true}})),
            "Friends($levels=2;$count=true)"
        );
    }
}
