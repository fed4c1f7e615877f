//! Filter descriptors: a tagged AST parsed once from permissive JSON shapes,
//! rendered by a single recursive printer.
//!
//! Input shapes, in priority order:
//! 1. a string is a raw escape hatch, emitted verbatim
//! 2. `{prop: primitive}` compiles to `prop eq literal` (`null` included)
//! 3. `{prop: [v1, v2]}` at the top level ORs equality clauses
//! 4. `{prop: {op: value}}` with a comparison operator
//! 5. `{op: [sub...]}` with a logical operator; `not` wraps the AND-join
//! 6. `{prop: {any|all: body}}` collection lambdas
//! 7. `{prop: {startswith|endswith|contains: v}}` string functions
//! 8. `{prop: {in: [...]}}`
//! 9. any other nested object recurses as a `/`-joined property path

use std::fmt;

use serde_json::Value as Json;

use crate::errors::{QueryError, QueryResult};
use crate::literal::{Aliases, is_tagged, render_literal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    fn from_key(key: &str) -> Option<Self> {
        Some(match key {
            "eq" => CompareOp::Eq,
            "ne" => CompareOp::Ne,
            "gt" => CompareOp::Gt,
            "ge" => CompareOp::Ge,
            "lt" => CompareOp::Lt,
            "le" => CompareOp::Le,
            _ => return None,
        })
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CompareOp::Eq => "eq",
            CompareOp::Ne => "ne",
            CompareOp::Gt => "gt",
            CompareOp::Ge => "ge",
            CompareOp::Lt => "lt",
            CompareOp::Le => "le",
        };
        write!(f, "{text}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringFunc {
    StartsWith,
    EndsWith,
    Contains,
}

impl StringFunc {
    fn from_key(key: &str) -> Option<Self> {
        Some(match key {
            "startswith" => StringFunc::StartsWith,
            "endswith" => StringFunc::EndsWith,
            "contains" => StringFunc::Contains,
            _ => return None,
        })
    }
}

impl fmt::Display for StringFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StringFunc::StartsWith => "startswith",
            StringFunc::EndsWith => "endswith",
            StringFunc::Contains => "contains",
        };
        write!(f, "{text}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LambdaKind {
    Any,
    All,
}

impl fmt::Display for LambdaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                LambdaKind::Any => "any",
                LambdaKind::All => "all",
            }
        )
    }
}

/// One filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Canonical text passed through untouched.
    Raw(String),
    Compare {
        path: String,
        op: CompareOp,
        value: Json,
    },
    Func {
        func: StringFunc,
        path: String,
        value: Json,
    },
    In {
        path: String,
        values: Vec<Json>,
    },
    Lambda {
        path: String,
        kind: LambdaKind,
        body: Box<Filter>,
    },
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Vec<Filter>),
}

impl Filter {
    /// Parse a permissive JSON descriptor into a filter expression.
    ///
    /// # Errors
    /// Returns `QueryError::InvalidDescriptor` for shapes outside the rules.
    pub fn from_value(descriptor: &Json) -> QueryResult<Self> {
        parse_node(descriptor, "", true)
    }

    /// Render to canonical OData text, collecting alias side parameters.
    ///
    /// # Errors
    /// Propagates literal rendering failures.
    pub fn render(&self, aliases: &mut Aliases) -> QueryResult<String> {
        self.render_scoped("", 0, aliases)
    }

    /// Combine with another filter under AND.
    #[must_use]
    pub fn and(self, other: Filter) -> Filter {
        match self {
            Filter::And(mut children) => {
                children.push(other);
                Filter::And(children)
            }
            first => Filter::And(vec![first, other]),
        }
    }

    /// Combine with another filter under OR.
    #[must_use]
    pub fn or(self, other: Filter) -> Filter {
        match self {
            Filter::Or(mut children) => {
                children.push(other);
                Filter::Or(children)
            }
            first => Filter::Or(vec![first, other]),
        }
    }

    #[allow(clippy::should_implement_trait)]
    #[must_use]
    pub fn not(self) -> Filter {
        Filter::Not(vec![self])
    }

    fn render_scoped(&self, scope: &str, depth: usize, aliases: &mut Aliases) -> QueryResult<String> {
        match self {
            Filter::Raw(text) => Ok(text.clone()),
            Filter::Compare { path, op, value } => Ok(format!(
                "{} {op} {}",
                scoped_path(scope, path),
                render_literal(value, aliases)?
            )),
            Filter::Func { func, path, value } => Ok(format!(
                "{func}({},{})",
                scoped_path(scope, path),
                render_literal(value, aliases)?
            )),
            Filter::In { path, values } => {
                let rendered = values
                    .iter()
                    .map(|v| render_literal(v, aliases))
                    .collect::<QueryResult<Vec<_>>>()?;
                Ok(format!(
                    "{} in ({})",
                    scoped_path(scope, path),
                    rendered.join(",")
                ))
            }
            Filter::Lambda { path, kind, body } => {
                let var = lambda_var(depth);
                let inner = body.render_scoped(var, depth + 1, aliases)?;
                Ok(format!("{}/{kind}({var}:{inner})", scoped_path(scope, path)))
            }
            Filter::And(children) => render_join(children, " and ", scope, depth, aliases),
            Filter::Or(children) => render_join(children, " or ", scope, depth, aliases),
            Filter::Not(children) => {
                let parts = children
                    .iter()
                    .map(|c| c.render_scoped(scope, depth, aliases))
                    .collect::<QueryResult<Vec<_>>>()?;
                Ok(format!("not({})", parts.join(" and ")))
            }
        }
    }
}

/// Start a comparison chain on a property path.
#[must_use]
pub fn field(path: impl Into<String>) -> FieldExpr {
    FieldExpr { path: path.into() }
}

/// Typed entry point mirroring the descriptor rules for callers that prefer
/// combinators over JSON shapes.
#[derive(Debug, Clone)]
pub struct FieldExpr {
    path: String,
}

impl FieldExpr {
    #[must_use]
    pub fn eq(self, value: Json) -> Filter {
        self.compare(CompareOp::Eq, value)
    }

    #[must_use]
    pub fn ne(self, value: Json) -> Filter {
        self.compare(CompareOp::Ne, value)
    }

    #[must_use]
    pub fn gt(self, value: Json) -> Filter {
        self.compare(CompareOp::Gt, value)
    }

    #[must_use]
    pub fn ge(self, value: Json) -> Filter {
        self.compare(CompareOp::Ge, value)
    }

    #[must_use]
    pub fn lt(self, value: Json) -> Filter {
        self.compare(CompareOp::Lt, value)
    }

    #[must_use]
    pub fn le(self, value: Json) -> Filter {
        self.compare(CompareOp::Le, value)
    }

    #[must_use]
    pub fn contains(self, value: Json) -> Filter {
        Filter::Func {
            func: StringFunc::Contains,
            path: self.path,
            value,
        }
    }

    #[must_use]
    pub fn startswith(self, value: Json) -> Filter {
        Filter::Func {
            func: StringFunc::StartsWith,
            path: self.path,
            value,
        }
    }

    #[must_use]
    pub fn endswith(self, value: Json) -> Filter {
        Filter::Func {
            func: StringFunc::EndsWith,
            path: self.path,
            value,
        }
    }

    #[must_use]
    pub fn in_list(self, values: Vec<Json>) -> Filter {
        Filter::In {
            path: self.path,
            values,
        }
    }

    #[must_use]
    pub fn any(self, body: Filter) -> Filter {
        Filter::Lambda {
            path: self.path,
            kind: LambdaKind::Any,
            body: Box::new(body),
        }
    }

    #[must_use]
    pub fn all(self, body: Filter) -> Filter {
        Filter::Lambda {
            path: self.path,
            kind: LambdaKind::All,
            body: Box::new(body),
        }
    }

    #[must_use]
    pub fn is_null(self) -> Filter {
        self.compare(CompareOp::Eq, Json::Null)
    }

    fn compare(self, op: CompareOp, value: Json) -> Filter {
        Filter::Compare {
            path: self.path,
            op,
            value,
        }
    }
}

fn render_join(
    children: &[Filter],
    sep: &str,
    scope: &str,
    depth: usize,
    aliases: &mut Aliases,
) -> QueryResult<String> {
    let parts = children
        .iter()
        .map(|c| c.render_scoped(scope, depth, aliases))
        .collect::<QueryResult<Vec<_>>>()?;
    match parts.len() {
        0 => Ok(String::new()),
        1 => Ok(parts.into_iter().next().unwrap_or_default()),
        _ => Ok(format!("({})", parts.join(sep))),
    }
}

fn scoped_path(scope: &str, path: &str) -> String {
    match (scope.is_empty(), path.is_empty()) {
        (true, _) => path.to_owned(),
        (false, true) => scope.to_owned(),
        (false, false) => format!("{scope}/{path}"),
    }
}

fn lambda_var(depth: usize) -> &'static str {
    // Shadow-free single letters for nested lambdas.
    const VARS: [&str; 6] = ["x", "y", "z", "w", "v", "u"];
    VARS[depth.min(VARS.len() - 1)]
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}/{key}")
    }
}

fn parse_node(descriptor: &Json, prefix: &str, root: bool) -> QueryResult<Filter> {
    match descriptor {
        Json::String(text) => Ok(Filter::Raw(text.clone())),
        Json::Array(items) => {
            let children = items
                .iter()
                .map(|item| parse_node(item, prefix, root))
                .collect::<QueryResult<Vec<_>>>()?;
            Ok(collapse(Filter::And(children)))
        }
        Json::Object(map) => {
            let mut clauses = Vec::with_capacity(map.len());
            for (key, value) in map {
                clauses.push(parse_entry(key, value, prefix, root)?);
            }
            Ok(collapse(Filter::And(clauses)))
        }
        other => Err(QueryError::InvalidDescriptor(format!(
            "filter root must be string, array or object, got {other}"
        ))),
    }
}

fn parse_entry(key: &str, value: &Json, prefix: &str, root: bool) -> QueryResult<Filter> {
    // Logical connectives take sub-filter lists.
    match key {
        "and" | "or" | "not" => {
            let items: Vec<&Json> = match value {
                Json::Array(items) => items.iter().collect(),
                other => vec![other],
            };
            let children = items
                .into_iter()
                .map(|item| parse_node(item, prefix, false))
                .collect::<QueryResult<Vec<_>>>()?;
            return Ok(match key {
                "and" => collapse(Filter::And(children)),
                "or" => collapse(Filter::Or(children)),
                _ => Filter::Not(children),
            });
        }
        _ => {}
    }

    let path = join_path(prefix, key);
    match value {
        Json::Null | Json::Bool(_) | Json::Number(_) | Json::String(_) => Ok(Filter::Compare {
            path,
            op: CompareOp::Eq,
            value: value.clone(),
        }),
        Json::Array(items) => {
            if root {
                // Top-level value list is an OR of equality clauses.
                let children = items
                    .iter()
                    .map(|item| Filter::Compare {
                        path: path.clone(),
                        op: CompareOp::Eq,
                        value: item.clone(),
                    })
                    .collect();
                Ok(collapse(Filter::Or(children)))
            } else {
                Ok(Filter::Compare {
                    path,
                    op: CompareOp::Eq,
                    value: value.clone(),
                })
            }
        }
        Json::Object(_) if is_tagged(value) => Ok(Filter::Compare {
            path,
            op: CompareOp::Eq,
            value: value.clone(),
        }),
        Json::Object(map) => {
            let mut clauses = Vec::with_capacity(map.len());
            for (sub_key, sub_value) in map {
                clauses.push(parse_operator(&path, sub_key, sub_value)?);
            }
            Ok(collapse(Filter::And(clauses)))
        }
    }
}

fn parse_operator(path: &str, key: &str, value: &Json) -> QueryResult<Filter> {
    if let Some(op) = CompareOp::from_key(key) {
        return Ok(Filter::Compare {
            path: path.to_owned(),
            op,
            value: value.clone(),
        });
    }
    if let Some(func) = StringFunc::from_key(key) {
        return Ok(Filter::Func {
            func,
            path: path.to_owned(),
            value: value.clone(),
        });
    }
    match key {
        "any" | "all" => {
            let kind = if key == "any" {
                LambdaKind::Any
            } else {
                LambdaKind::All
            };
            // A bare value body is shorthand: any matches it, all excludes it.
            let body = match value {
                Json::Object(_) | Json::Array(_) => parse_node(value, "", false)?,
                bare => Filter::Compare {
                    path: String::new(),
                    op: if kind == LambdaKind::Any {
                        CompareOp::Eq
                    } else {
                        CompareOp::Ne
                    },
                    value: bare.clone(),
                },
            };
            Ok(Filter::Lambda {
                path: path.to_owned(),
                kind,
                body: Box::new(body),
            })
        }
        "in" => {
            let Json::Array(items) = value else {
                return Err(QueryError::InvalidDescriptor(format!(
                    "'in' needs a value list, got {value}"
                )));
            };
            Ok(Filter::In {
                path: path.to_owned(),
                values: items.clone(),
            })
        }
        // Anything else is a nested property path.
        _ => parse_entry(key, value, path, false),
    }
}

fn collapse(filter: Filter) -> Filter {
    match filter {
        Filter::And(mut children) | Filter::Or(mut children) if children.len() == 1 => {
            children.remove(0)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(descriptor: Json) -> String {
        let mut aliases = Aliases::new();
        Filter::from_value(&descriptor)
            .unwrap()
            .render(&mut aliases)
            .unwrap()
    }

    #[test]
    fn string_passthrough_is_idempotent() {
        assert_eq!(render(json!("foo eq 1 and bar ne 2")), "foo eq 1 and bar ne 2");
    }

    #[test]
    fn primitive_becomes_equality() {
        assert_eq!(render(json!({"property": "value"})), "property eq 'value'");
        assert_eq!(render(json!({"age": 21})), "age eq 21");
        assert_eq!(render(json!({"deleted": null})), "deleted eq null");
    }

    #[test]
    fn comparison_operators() {
        assert_eq!(render(json!({"property": {"ne": "value"}})), "property ne 'value'");
        assert_eq!(render(json!({"age": {"gt": 18, "le": 65}})), "(age gt 18 and age le 65)");
    }

    #[test]
    fn top_level_value_list_ors() {
        assert_eq!(
            render(json!({"city": ["Boise", "Reno"]})),
            "(city eq 'Boise' or city eq 'Reno')"
        );
    }

    #[test]
    fn logical_connectives() {
        assert_eq!(
            render(json!({"or": [{"a": 1}, {"b": 2}]})),
            "(a eq 1 or b eq 2)"
        );
        assert_eq!(
            render(json!({"not": [{"a": 1}, {"b": 2}]})),
            "not(a eq 1 and b eq 2)"
        );
    }

    #[test]
    fn lambda_with_filter_body() {
        assert_eq!(
            render(json!({"Friends": {"any": {"FirstName": "Scott"}}})),
            "Friends/any(x:x/FirstName eq 'Scott')"
        );
    }

    #[test]
    fn lambda_bare_value_shorthand() {
        assert_eq!(
            render(json!({"Emails": {"any": "scott@example.org"}})),
            "Emails/any(x:x eq 'scott@example.org')"
        );
        assert_eq!(
            render(json!({"Emails": {"all": "spam@example.org"}})),
            "Emails/all(x:x ne 'spam@example.org')"
        );
    }

    #[test]
    fn nested_lambda_vars_do_not_shadow() {
        assert_eq!(
            render(json!({"Trips": {"any": {"PlanItems": {"any": {"Done": true}}}}})),
            "Trips/any(x:x/PlanItems/any(y:y/Done eq true))"
        );
    }

    #[test]
    fn string_functions() {
        assert_eq!(
            render(json!({"Name": {"startswith": "Rus"}})),
            "startswith(Name,'Rus')"
        );
        assert_eq!(
            render(json!({"Name": {"contains": "ssel"}})),
            "contains(Name,'ssel')"
        );
    }

    #[test]
    fn in_list_escapes_each() {
        assert_eq!(
            render(json!({"city": {"in": ["O'Fallon", "Reno"]}})),
            "city in ('O''Fallon','Reno')"
        );
    }

    #[test]
    fn nested_object_prefixes_path() {
        assert_eq!(
            render(json!({"Address": {"City": {"Name": "Boise"}}})),
            "Address/City/Name eq 'Boise'"
        );
    }

    #[test]
    fn combinators_match_descriptors() {
        let mut aliases = Aliases::new();
        let combined = field("age").gt(json!(18)).and(field("name").ne(json!("x")));
        assert_eq!(
            combined.render(&mut aliases).unwrap(),
            "(age gt 18 and name ne 'x')"
        );
    }

    #[test]
    fn alias_side_parameter_propagates() {
        let mut aliases = Aliases::new();
        let filter = Filter::from_value(&json!({
            "City": crate::literal::alias("city", json!("Redmond"))
        }))
        .unwrap();
        assert_eq!(filter.render(&mut aliases).unwrap(), "City eq @city");
        assert_eq!(aliases, vec![("@city".to_owned(), "'Redmond'".to_owned())]);
    }
}
