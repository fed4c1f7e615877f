//! Resource path segments.
//!
//! A path is an ordered list of [`Segment`]s rendered into the part of the
//! URL between the service root and the query string. Key predicates and
//! function parameters attach to individual segments and reuse the literal
//! renderer, so quoting matches `$filter` exactly.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::errors::{QueryError, QueryResult};
use crate::literal::{Aliases, render_key_literal, render_literal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentKind {
    EntitySet,
    Singleton,
    Navigation,
    Property,
    TypeCast,
    Function,
    Action,
    Count,
    Value,
    Reference,
    Metadata,
    Batch,
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SegmentKind::EntitySet => "entity set",
            SegmentKind::Singleton => "singleton",
            SegmentKind::Navigation => "navigation property",
            SegmentKind::Property => "property",
            SegmentKind::TypeCast => "type cast",
            SegmentKind::Function => "function",
            SegmentKind::Action => "action",
            SegmentKind::Count => "$count",
            SegmentKind::Value => "$value",
            SegmentKind::Reference => "$ref",
            SegmentKind::Metadata => "$metadata",
            SegmentKind::Batch => "$batch",
        };
        write!(f, "{text}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub kind: SegmentKind,
    pub path: String,
    /// Qualified EDM type name, when known. Type casts store the cast
    /// target here as well as in `path`.
    pub type_name: Option<String>,
    /// Key predicate: a primitive or an object of named key components.
    pub key: Option<Json>,
    /// Function call parameters.
    pub parameters: Option<Json>,
}

impl Segment {
    #[must_use]
    pub fn new(kind: SegmentKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            type_name: None,
            key: None,
            parameters: None,
        }
    }

    #[must_use]
    pub fn has_key(&self) -> bool {
        self.key.is_some()
    }

    fn render(&self, aliases: &mut Aliases) -> QueryResult<String> {
        let mut out = match self.kind {
            SegmentKind::Count => "$count".to_owned(),
            SegmentKind::Value => "$value".to_owned(),
            SegmentKind::Reference => "$ref".to_owned(),
            SegmentKind::Metadata => "$metadata".to_owned(),
            SegmentKind::Batch => "$batch".to_owned(),
            _ => self.path.clone(),
        };
        if let Some(key) = &self.key {
            out.push('(');
            out.push_str(&render_key(key, aliases)?);
            out.push(')');
        }
        if self.kind == SegmentKind::Function {
            out.push('(');
            if let Some(parameters) = &self.parameters {
                out.push_str(&render_parameters(parameters, aliases)?);
            }
            out.push(')');
        }
        Ok(out)
    }
}

fn render_key(key: &Json, aliases: &mut Aliases) -> QueryResult<String> {
    match key {
        Json::Object(map) if !crate::literal::is_tagged(key) => {
            let parts = map
                .iter()
                .map(|(name, value)| {
                    Ok(format!("{name}={}", render_key_literal(value, aliases)?))
                })
                .collect::<QueryResult<Vec<_>>>()?;
            Ok(parts.join(","))
        }
        single => render_key_literal(single, aliases),
    }
}

fn render_parameters(parameters: &Json, aliases: &mut Aliases) -> QueryResult<String> {
    let Json::Object(map) = parameters else {
        return Err(QueryError::InvalidDescriptor(format!(
            "function parameters must be an object, got {parameters}"
        )));
    };
    let parts = map
        .iter()
        .map(|(name, value)| Ok(format!("{name}={}", render_literal(value, aliases)?)))
        .collect::<QueryResult<Vec<_>>>()?;
    Ok(parts.join(","))
}

/// The ordered segment list of one resource path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathSegments {
    segments: Vec<Segment>,
}

impl PathSegments {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: Segment) -> &mut Segment {
        self.segments.push(segment);
        let idx = self.segments.len() - 1;
        &mut self.segments[idx]
    }

    pub fn add(&mut self, kind: SegmentKind, path: impl Into<String>) -> &mut Segment {
        self.push(Segment::new(kind, path))
    }

    #[must_use]
    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    pub fn last_mut(&mut self) -> Option<&mut Segment> {
        self.segments.last_mut()
    }

    #[must_use]
    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.segments.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Attach a key predicate to the most recent segment.
    ///
    /// # Errors
    /// Returns `QueryError::MissingSegment` when the path is empty.
    pub fn set_key(&mut self, key: Json) -> QueryResult<()> {
        let Some(last) = self.segments.last_mut() else {
            return Err(QueryError::MissingSegment(SegmentKind::EntitySet));
        };
        last.key = Some(key);
        Ok(())
    }

    /// The most recent segment of the given kind.
    #[must_use]
    pub fn find(&self, kind: SegmentKind) -> Option<&Segment> {
        self.segments.iter().rev().find(|s| s.kind == kind)
    }

    /// Qualified type names along the path, innermost last.
    #[must_use]
    pub fn types(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| s.type_name.as_deref())
            .collect()
    }

    /// Render to path text, collecting alias side parameters.
    ///
    /// # Errors
    /// Propagates literal rendering failures.
    pub fn render(&self, aliases: &mut Aliases) -> QueryResult<String> {
        let parts = self
            .segments
            .iter()
            .map(|s| s.render(aliases))
            .collect::<QueryResult<Vec<_>>>()?;
        Ok(parts.join("/"))
    }

    fn rendered_or_empty(&self) -> String {
        let mut aliases = Aliases::new();
        self.render(&mut aliases).unwrap_or_default()
    }

    /// True when both paths render identically.
    #[must_use]
    pub fn is_equal_to(&self, other: &PathSegments) -> bool {
        self.rendered_or_empty() == other.rendered_or_empty()
    }

    /// True when `other` extends this path.
    #[must_use]
    pub fn is_parent_of(&self, other: &PathSegments) -> bool {
        let own = self.rendered_or_empty();
        let theirs = other.rendered_or_empty();
        theirs.len() > own.len() && theirs.starts_with(&own) && theirs.as_bytes()[own.len()] == b'/'
    }

    /// True when this path extends `other`.
    #[must_use]
    pub fn is_child_of(&self, other: &PathSegments) -> bool {
        other.is_parent_of(self)
    }
}

impl<'a> IntoIterator for &'a PathSegments {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}
