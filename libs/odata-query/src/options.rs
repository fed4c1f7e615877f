//! Query option container.
//!
//! Options are stored as raw JSON descriptors under their `$`-prefixed
//! names and compiled only when the URL is rendered, so a descriptor can be
//! adjusted repeatedly without re-parsing. Rendering emits known options in
//! a fixed order so equal descriptors always produce equal URLs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use urlencoding::encode;

use crate::errors::QueryResult;
use crate::expand::render_expand;
use crate::filter::Filter;
use crate::literal::Aliases;
use crate::orderby::render_order_by;
use crate::transform::render_transform;

/// Render order for well-known options. Unknown and custom options follow
/// alphabetically, alias parameters last.
const RENDER_ORDER: [&str; 11] = [
    "$select",
    "$filter",
    "$search",
    "$apply",
    "$orderby",
    "$top",
    "$skip",
    "$skiptoken",
    "$expand",
    "$format",
    "$count",
];

fn canonical(name: &str) -> String {
    if name.starts_with('$') || name.starts_with('@') {
        name.to_owned()
    } else {
        format!("${name}")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryOptions {
    entries: BTreeMap<String, Json>,
}

impl QueryOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option, `$`-prefixing bare names.
    pub fn set(&mut self, name: &str, value: Json) {
        self.entries.insert(canonical(name), value);
    }

    /// Set a custom query parameter under its exact name.
    pub fn set_custom(&mut self, name: &str, value: Json) {
        self.entries.insert(name.to_owned(), value);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Json> {
        self.entries.get(&canonical(name))
    }

    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(&canonical(name))
    }

    pub fn unset(&mut self, name: &str) -> Option<Json> {
        self.entries.remove(&canonical(name))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop every option whose bare name is not in `names`.
    pub fn keep(&mut self, names: &[&str]) {
        let keep: Vec<String> = names.iter().map(|n| canonical(n)).collect();
        self.entries.retain(|name, _| keep.contains(name));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value-level editing handle for one option.
    pub fn option(&mut self, name: &str) -> OptionHandler<'_> {
        OptionHandler {
            entries: &mut self.entries,
            name: canonical(name),
        }
    }

    /// Compile every stored option to `name=value` pairs. Options whose
    /// compiled value is empty are dropped, never emitted as bare `name=`.
    ///
    /// # Errors
    /// Propagates descriptor compilation failures.
    pub fn render(&self, aliases: &mut Aliases) -> QueryResult<Vec<(String, String)>> {
        let mut pairs = Vec::with_capacity(self.entries.len());
        for name in RENDER_ORDER {
            if let Some(value) = self.entries.get(name) {
                let rendered = render_value(name, value, aliases)?;
                if !rendered.is_empty() {
                    pairs.push((name.to_owned(), rendered));
                }
            }
        }
        for (name, value) in &self.entries {
            if !RENDER_ORDER.contains(&name.as_str()) {
                let rendered = render_value(name, value, aliases)?;
                if !rendered.is_empty() {
                    pairs.push((name.clone(), rendered));
                }
            }
        }
        Ok(pairs)
    }

    /// Compile to a URL-encoded query string, alias parameters last.
    ///
    /// # Errors
    /// Propagates descriptor compilation failures.
    pub fn render_query_string(&self, aliases: &mut Aliases) -> QueryResult<String> {
        let mut pairs = self.render(aliases)?;
        pairs.extend(aliases.drain(..));
        let encoded: Vec<String> = pairs
            .iter()
            .map(|(name, value)| format!("{}={}", encode(name), encode(value)))
            .collect();
        Ok(encoded.join("&"))
    }

}

fn render_value(name: &str, value: &Json, aliases: &mut Aliases) -> QueryResult<String> {
    match name {
        "$filter" => Filter::from_value(value)?.render(aliases),
        "$expand" => render_expand(value, aliases),
        "$orderby" => render_order_by(value),
        "$apply" => render_transform(value, aliases),
        "$select" => Ok(render_list(value)),
        _ => Ok(render_plain(value)),
    }
}

fn render_list(value: &Json) -> String {
    match value {
        Json::Array(items) => items
            .iter()
            .map(render_plain)
            .collect::<Vec<_>>()
            .join(","),
        other => render_plain(other),
    }
}

fn render_plain(value: &Json) -> String {
    match value {
        Json::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Mutating view over one option value.
///
/// Multi-valued edits keep the value an array; a one-element array collapses
/// back to its single element so `select("A")` and `select(["A"])` stay
/// interchangeable.
pub struct OptionHandler<'a> {
    entries: &'a mut BTreeMap<String, Json>,
    name: String,
}

impl OptionHandler<'_> {
    #[must_use]
    pub fn value(&self) -> Option<&Json> {
        self.entries.get(&self.name)
    }

    pub fn set(&mut self, value: Json) {
        self.entries.insert(self.name.clone(), value);
    }

    pub fn clear(&mut self) -> Option<Json> {
        self.entries.remove(&self.name)
    }

    /// Element at `index`, treating a scalar as a one-element list.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&Json> {
        match self.entries.get(&self.name) {
            Some(Json::Array(items)) => items.get(index),
            Some(single) if index == 0 => Some(single),
            _ => None,
        }
    }

    /// Append an element, promoting a scalar value to an array.
    pub fn push(&mut self, value: Json) {
        match self.entries.get_mut(&self.name) {
            Some(Json::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Json::Array(vec![first, value]);
            }
            None => {
                self.entries.insert(self.name.clone(), value);
            }
        }
    }

    /// Remove every element equal to `value`; collapses a one-element array.
    pub fn remove(&mut self, value: &Json) {
        let collapse = match self.entries.get_mut(&self.name) {
            Some(Json::Array(items)) => {
                items.retain(|item| item != value);
                match items.len() {
                    0 => Some(None),
                    1 => Some(Some(items.remove(0))),
                    _ => None,
                }
            }
            Some(existing) if existing == value => Some(None),
            _ => None,
        };
        match collapse {
            Some(None) => {
                self.entries.remove(&self.name);
            }
            Some(Some(single)) => {
                self.entries.insert(self.name.clone(), single);
            }
            None => {}
        }
    }

    /// Read a nested field of an object-valued option along a dot path.
    /// An empty path reads the whole value.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Json> {
        let mut cursor = self.entries.get(&self.name)?;
        if path.is_empty() {
            return Some(cursor);
        }
        for part in path.split('.') {
            cursor = cursor.as_object()?.get(part)?;
        }
        Some(cursor)
    }

    /// True when the dot path resolves inside this option.
    #[must_use]
    pub fn has(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Set a nested field inside an object-valued option, creating
    /// intermediate objects along a dot path. The path-taking counterpart
    /// of [`OptionHandler::set`]; [`OptionHandler::unassign`] is the
    /// path-taking unset.
    pub fn assign(&mut self, path: &str, value: Json) {
        let root = self
            .entries
            .entry(self.name.clone())
            .or_insert_with(|| Json::Object(serde_json::Map::new()));
        if !root.is_object() {
            *root = Json::Object(serde_json::Map::new());
        }
        let mut cursor = root;
        let mut parts = path.split('.').peekable();
        while let Some(part) = parts.next() {
            if !cursor.is_object() {
                *cursor = Json::Object(serde_json::Map::new());
            }
            let Json::Object(map) = cursor else { return };
            if parts.peek().is_none() {
                map.insert(part.to_owned(), value);
                return;
            }
            cursor = map
                .entry(part.to_owned())
                .or_insert_with(|| Json::Object(serde_json::Map::new()));
        }
    }

    /// Remove a nested field along a dot path.
    pub fn unassign(&mut self, path: &str) {
        let Some(root) = self.entries.get_mut(&self.name) else {
            return;
        };
        let mut cursor = root;
        let mut parts = path.split('.').peekable();
        while let Some(part) = parts.next() {
            let Some(map) = cursor.as_object_mut() else {
                return;
            };
            if parts.peek().is_none() {
                map.remove(part);
                return;
            }
            let Some(next) = map.get_mut(part) else {
                return;
            };
            cursor = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query_string(options: &QueryOptions) -> String {
        let mut aliases = Aliases::new();
        options.render_query_string(&mut aliases).unwrap()
    }

    #[test]
    fn bare_names_get_dollar_prefix() {
        let mut options = QueryOptions::new();
        options.set("top", json!(5));
        assert!(options.has("$top"));
        assert_eq!(options.get("top"), Some(&json!(5)));
    }

    #[test]
    fn render_order_is_fixed() {
        let mut options = QueryOptions::new();
        options.set("top", json!(5));
        options.set("select", json!(["Name", "Age"]));
        options.set("filter", json!({"Age": {"gt": 18}}));
        assert_eq!(
            query_string(&options),
            "%24select=Name%2CAge&%24filter=Age%20gt%2018&%24top=5"
        );
    }

    #[test]
    fn aliases_render_last() {
        let mut options = QueryOptions::new();
        options.set(
            "filter",
            json!({"City": crate::literal::alias("city", json!("Redmond"))}),
        );
        options.set("top", json!(2));
        assert_eq!(
            query_string(&options),
            "%24filter=City%20eq%20%40city&%24top=2&%40city=%27Redmond%27"
        );
    }

    #[test]
    fn push_promotes_scalar_to_array() {
        let mut options = QueryOptions::new();
        options.option("select").set(json!("Name"));
        options.option("select").push(json!("Age"));
        assert_eq!(options.get("select"), Some(&json!(["Name", "Age"])));
        assert_eq!(options.option("select").at(1), Some(&json!("Age")));
    }

    #[test]
    fn remove_collapses_singleton_array() {
        let mut options = QueryOptions::new();
        options.set("select", json!(["Name", "Age"]));
        options.option("select").remove(&json!("Age"));
        assert_eq!(options.get("select"), Some(&json!("Name")));
        options.option("select").remove(&json!("Name"));
        assert!(!options.has("select"));
    }

    #[test]
    fn assign_builds_nested_descriptor() {
        let mut options = QueryOptions::new();
        options.option("expand").assign("Friends.top", json!(3));
        assert_eq!(options.get("expand"), Some(&json!({"Friends": {"top": 3}})));
        options.option("expand").unassign("Friends.top");
        assert_eq!(options.get("expand"), Some(&json!({"Friends": {}})));
    }

    #[test]
    fn dot_path_read_back() {
        let mut options = QueryOptions::new();
        options.option("expand").assign("Friends.top", json!(3));
        options.option("expand").assign("Friends.select", json!(["FirstName"]));
        let handler = options.option("expand");
        assert_eq!(handler.get("Friends.top"), Some(&json!(3)));
        assert_eq!(handler.get("Friends.select"), Some(&json!(["FirstName"])));
        assert_eq!(handler.get(""), Some(&json!({
            "Friends": {"top": 3, "select": ["FirstName"]}
        })));
        assert!(handler.has("Friends"));
        assert!(!handler.has("Friends.filter"));
    }

    #[test]
    fn empty_values_are_not_emitted() {
        let mut options = QueryOptions::new();
        options.set("select", json!([]));
        options.set("filter", json!({}));
        options.set("top", json!(5));
        assert_eq!(query_string(&options), "%24top=5");
    }

    #[test]
    fn count_renders_as_boolean_parameter() {
        let mut options = QueryOptions::new();
        options.set("count", json!(true));
        assert_eq!(query_string(&options), "%24count=true");
    }

    #[test]
    fn custom_parameter_keeps_its_name() {
        let mut options = QueryOptions::new();
        options.set_custom("api-version", json!("2.0"));
        assert_eq!(query_string(&options), "api-version=2.0");
    }
}
