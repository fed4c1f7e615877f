//! Request planning and response capture.
//!
//! A [`HttpPlan`] is everything a transport needs to issue one request; the
//! crate never performs I/O itself. [`HttpOutcome`] is the transport's
//! answer in the shape the batch codec and callers consume.

use http::Method;
use serde_json::Value as Json;

use crate::errors::QueryResult;
use crate::resource::ODataResource;
use crate::segments::SegmentKind;

pub const ODATA_VERSION: &str = "4.0";

/// What the response body is expected to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Entity,
    Collection,
    Property,
    /// Raw media or property value, no JSON wrapper.
    Value,
    Count,
    None,
}

/// One planned request.
#[derive(Debug, Clone)]
pub struct HttpPlan {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Json>,
    pub response_kind: ResponseKind,
}

/// One captured response.
#[derive(Debug, Clone)]
pub struct HttpOutcome {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Json>,
}

impl HttpOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

fn base_headers(with_body: bool) -> Vec<(String, String)> {
    let mut headers = vec![
        ("OData-Version".to_owned(), ODATA_VERSION.to_owned()),
        ("Accept".to_owned(), "application/json".to_owned()),
    ];
    if with_body {
        headers.push(("Content-Type".to_owned(), "application/json".to_owned()));
    }
    headers
}

fn response_kind_for(resource: &ODataResource) -> ResponseKind {
    let Some(last) = resource.last_segment() else {
        return ResponseKind::None;
    };
    match last.kind {
        SegmentKind::Count => ResponseKind::Count,
        SegmentKind::Value | SegmentKind::Metadata => ResponseKind::Value,
        SegmentKind::Property => ResponseKind::Property,
        SegmentKind::Singleton | SegmentKind::Action => ResponseKind::Entity,
        SegmentKind::EntitySet | SegmentKind::Navigation | SegmentKind::Function => {
            if last.has_key() {
                ResponseKind::Entity
            } else {
                ResponseKind::Collection
            }
        }
        _ => ResponseKind::Entity,
    }
}

impl ODataResource {
    /// Plan a GET for this resource.
    ///
    /// # Errors
    /// Propagates URL compilation failures.
    pub fn get_plan(&self) -> QueryResult<HttpPlan> {
        Ok(HttpPlan {
            method: Method::GET,
            url: self.url()?,
            headers: base_headers(false),
            body: None,
            response_kind: response_kind_for(self),
        })
    }

    /// Plan a POST creating an entity or invoking an action.
    ///
    /// # Errors
    /// Propagates URL compilation failures.
    pub fn post_plan(&self, body: Json) -> QueryResult<HttpPlan> {
        Ok(HttpPlan {
            method: Method::POST,
            url: self.url()?,
            headers: base_headers(true),
            body: Some(body),
            response_kind: response_kind_for(self),
        })
    }

    /// Plan a PATCH merging fields into an existing entity.
    ///
    /// # Errors
    /// Propagates URL compilation failures.
    pub fn patch_plan(&self, body: Json) -> QueryResult<HttpPlan> {
        Ok(HttpPlan {
            method: Method::PATCH,
            url: self.url()?,
            headers: base_headers(true),
            body: Some(body),
            response_kind: ResponseKind::None,
        })
    }

    /// Plan a PUT replacing an existing entity.
    ///
    /// # Errors
    /// Propagates URL compilation failures.
    pub fn put_plan(&self, body: Json) -> QueryResult<HttpPlan> {
        Ok(HttpPlan {
            method: Method::PUT,
            url: self.url()?,
            headers: base_headers(true),
            body: Some(body),
            response_kind: ResponseKind::None,
        })
    }

    /// Plan a DELETE.
    ///
    /// # Errors
    /// Propagates URL compilation failures.
    pub fn delete_plan(&self) -> QueryResult<HttpPlan> {
        Ok(HttpPlan {
            method: Method::DELETE,
            url: self.url()?,
            headers: base_headers(false),
            body: None,
            response_kind: ResponseKind::None,
        })
    }
}
