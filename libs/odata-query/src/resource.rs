//! The resource handle: a service root, a segment path and a query option
//! container.
//!
//! Builder methods take `&self` and return a modified clone, so a handle
//! can be kept and branched without interference. [`ODataResource::segments_mut`]
//! and [`ODataResource::options_mut`] expose the underlying state for callers
//! that prefer in-place edits.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::errors::{QueryError, QueryResult};
use crate::options::QueryOptions;
use crate::segments::{PathSegments, Segment, SegmentKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ODataResource {
    service_root: String,
    segments: PathSegments,
    options: QueryOptions,
}

impl ODataResource {
    /// Create a handle rooted at a service URL.
    ///
    /// # Errors
    /// Returns `QueryError::InvalidServiceRoot` when the root carries a
    /// query string.
    pub fn new(service_root: impl Into<String>) -> QueryResult<Self> {
        let service_root = service_root.into();
        if service_root.contains('?') {
            return Err(QueryError::InvalidServiceRoot(service_root));
        }
        Ok(Self {
            service_root: service_root.trim_end_matches('/').to_owned(),
            segments: PathSegments::new(),
            options: QueryOptions::new(),
        })
    }

    #[must_use]
    pub fn service_root(&self) -> &str {
        &self.service_root
    }

    #[must_use]
    pub fn segments(&self) -> &PathSegments {
        &self.segments
    }

    pub fn segments_mut(&mut self) -> &mut PathSegments {
        &mut self.segments
    }

    #[must_use]
    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut QueryOptions {
        &mut self.options
    }

    fn with_segment(&self, kind: SegmentKind, path: &str) -> Self {
        let mut next = self.clone();
        next.segments.add(kind, path);
        next
    }

    #[must_use]
    pub fn entity_set(&self, name: &str) -> Self {
        self.with_segment(SegmentKind::EntitySet, name)
    }

    #[must_use]
    pub fn singleton(&self, name: &str) -> Self {
        self.with_segment(SegmentKind::Singleton, name)
    }

    /// Attach a key predicate to the innermost segment.
    ///
    /// # Errors
    /// Returns `QueryError::MissingSegment` on an empty path.
    pub fn key(&self, key: Json) -> QueryResult<Self> {
        let mut next = self.clone();
        next.segments.set_key(key)?;
        Ok(next)
    }

    /// Step into a navigation property of a single entity.
    ///
    /// # Errors
    /// Returns `QueryError::MissingKey` when the innermost segment is an
    /// entity set without a key predicate.
    pub fn navigation_property(&self, name: &str) -> QueryResult<Self> {
        if let Some(last) = self.segments.last() {
            if last.kind == SegmentKind::EntitySet && !last.has_key() {
                return Err(QueryError::MissingKey);
            }
        }
        Ok(self.with_segment(SegmentKind::Navigation, name))
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Self {
        self.with_segment(SegmentKind::Property, name)
    }

    /// Narrow the path to a derived type.
    #[must_use]
    pub fn cast(&self, qualified_type: &str) -> Self {
        let mut next = self.clone();
        let segment = next.segments.add(SegmentKind::TypeCast, qualified_type);
        segment.type_name = Some(qualified_type.to_owned());
        next
    }

    #[must_use]
    pub fn function(&self, qualified_name: &str, parameters: Json) -> Self {
        let mut next = self.clone();
        let segment = next.segments.add(SegmentKind::Function, qualified_name);
        segment.parameters = Some(parameters);
        next
    }

    #[must_use]
    pub fn action(&self, qualified_name: &str) -> Self {
        self.with_segment(SegmentKind::Action, qualified_name)
    }

    #[must_use]
    pub fn count(&self) -> Self {
        self.with_segment(SegmentKind::Count, "$count")
    }

    #[must_use]
    pub fn value(&self) -> Self {
        self.with_segment(SegmentKind::Value, "$value")
    }

    #[must_use]
    pub fn reference(&self) -> Self {
        self.with_segment(SegmentKind::Reference, "$ref")
    }

    #[must_use]
    pub fn metadata(&self) -> Self {
        self.with_segment(SegmentKind::Metadata, "$metadata")
    }

    #[must_use]
    pub fn batch(&self) -> Self {
        self.with_segment(SegmentKind::Batch, "$batch")
    }

    fn with_option(&self, name: &str, value: Json) -> Self {
        let mut next = self.clone();
        next.options.set(name, value);
        next
    }

    #[must_use]
    pub fn select(&self, descriptor: Json) -> Self {
        self.with_option("select", descriptor)
    }

    #[must_use]
    pub fn filter(&self, descriptor: Json) -> Self {
        self.with_option("filter", descriptor)
    }

    #[must_use]
    pub fn expand(&self, descriptor: Json) -> Self {
        self.with_option("expand", descriptor)
    }

    #[must_use]
    pub fn order_by(&self, descriptor: Json) -> Self {
        self.with_option("orderby", descriptor)
    }

    #[must_use]
    pub fn apply(&self, descriptor: Json) -> Self {
        self.with_option("apply", descriptor)
    }

    #[must_use]
    pub fn top(&self, count: u64) -> Self {
        self.with_option("top", Json::from(count))
    }

    #[must_use]
    pub fn skip(&self, count: u64) -> Self {
        self.with_option("skip", Json::from(count))
    }

    #[must_use]
    pub fn skip_token(&self, token: &str) -> Self {
        self.with_option("skiptoken", Json::from(token))
    }

    #[must_use]
    pub fn search(&self, expression: &str) -> Self {
        self.with_option("search", Json::from(expression))
    }

    #[must_use]
    pub fn format(&self, format: &str) -> Self {
        self.with_option("format", Json::from(format))
    }

    /// Request an inline count alongside the collection.
    #[must_use]
    pub fn with_count(&self) -> Self {
        self.with_option("count", Json::Bool(true))
    }

    /// Set a custom query parameter under its exact name.
    #[must_use]
    pub fn custom(&self, name: &str, value: Json) -> Self {
        let mut next = self.clone();
        next.options.set_custom(name, value);
        next
    }

    /// A filter-shaped `$count` value turns into a `/$count` path suffix
    /// with the filter applied; a boolean stays a query parameter.
    fn count_normalized(&self) -> Self {
        match self.options.get("count") {
            Some(value) if !value.is_boolean() => {
                let descriptor = value.clone();
                let mut next = self.clone();
                next.options.unset("count");
                match next.options.unset("filter") {
                    Some(existing) => next
                        .options
                        .set("filter", serde_json::json!({"and": [existing, descriptor]})),
                    None => next.options.set("filter", descriptor),
                }
                next.segments.add(SegmentKind::Count, "$count");
                next
            }
            _ => self.clone(),
        }
    }

    /// Compile to a path string and ordered query parameters.
    ///
    /// # Errors
    /// Propagates descriptor compilation failures.
    pub fn path_and_params(&self) -> QueryResult<(String, Vec<(String, String)>)> {
        let normalized = self.count_normalized();
        let mut aliases = Vec::new();
        let path = normalized.segments.render(&mut aliases)?;
        let mut params = normalized.options.render(&mut aliases)?;
        params.extend(aliases);
        Ok((path, params))
    }

    /// Compile the full URL.
    ///
    /// # Errors
    /// Propagates descriptor compilation failures.
    pub fn url(&self) -> QueryResult<String> {
        let normalized = self.count_normalized();
        let mut aliases = Vec::new();
        let path = normalized.segments.render(&mut aliases)?;
        let query = normalized.options.render_query_string(&mut aliases)?;
        let mut url = self.service_root.clone();
        if !path.is_empty() {
            url.push('/');
            url.push_str(&path);
        }
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        tracing::debug!(%url, "compiled resource url");
        Ok(url)
    }

    pub(crate) fn last_segment(&self) -> Option<&Segment> {
        self.segments.last()
    }
}
