//! Batch queue and payload rendering.

use http::Method;
use odata_query::HttpPlan;

use crate::boundary::BoundarySource;

const CRLF: &str = "\r\n";

/// A rendered multipart payload ready for POST to `$batch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPayload {
    pub content_type: String,
    pub body: String,
}

/// An ordered queue of planned sub-requests.
///
/// Rendering groups consecutive non-GET requests into one changeset; a GET
/// closes any open changeset and becomes its own top-level part. Boundary
/// tokens come from the instance's own [`BoundarySource`].
#[derive(Debug, Clone, Default)]
pub struct Batch {
    items: Vec<HttpPlan>,
    boundaries: BoundarySource,
}

impl Batch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A batch with a caller-provided boundary source.
    #[must_use]
    pub fn with_boundary_source(boundaries: BoundarySource) -> Self {
        Self {
            items: Vec::new(),
            boundaries,
        }
    }

    pub fn add(&mut self, plan: HttpPlan) -> &mut Self {
        self.items.push(plan);
        self
    }

    #[must_use]
    pub fn items(&self) -> &[HttpPlan] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Render the queue into one multipart payload.
    pub fn render(&mut self) -> BatchPayload {
        let batch_boundary = self.boundaries.next("batch");
        let mut body = String::new();

        let mut index = 0;
        while index < self.items.len() {
            if self.items[index].method == Method::GET {
                body.push_str(&format!("--{batch_boundary}{CRLF}"));
                write_http_part(&mut body, &self.items[index], None);
                index += 1;
            } else {
                let start = index;
                while index < self.items.len() && self.items[index].method != Method::GET {
                    index += 1;
                }
                let changeset_boundary = self.boundaries.next("changeset");
                body.push_str(&format!("--{batch_boundary}{CRLF}"));
                body.push_str(&format!(
                    "Content-Type: multipart/mixed; boundary={changeset_boundary}{CRLF}{CRLF}"
                ));
                for (content_id, item) in self.items[start..index].iter().enumerate() {
                    body.push_str(&format!("--{changeset_boundary}{CRLF}"));
                    write_http_part(&mut body, item, Some(content_id + 1));
                }
                body.push_str(&format!("--{changeset_boundary}--{CRLF}"));
            }
        }
        body.push_str(&format!("--{batch_boundary}--{CRLF}"));

        tracing::debug!(
            items = self.items.len(),
            boundary = %batch_boundary,
            "rendered batch payload"
        );
        BatchPayload {
            content_type: format!("multipart/mixed; boundary={batch_boundary}"),
            body,
        }
    }
}

fn write_http_part(out: &mut String, plan: &HttpPlan, content_id: Option<usize>) {
    out.push_str(&format!("Content-Type: application/http{CRLF}"));
    out.push_str(&format!("Content-Transfer-Encoding: binary{CRLF}"));
    if let Some(id) = content_id {
        out.push_str(&format!("Content-ID: {id}{CRLF}"));
    }
    out.push_str(CRLF);

    out.push_str(&format!("{} {} HTTP/1.1{CRLF}", plan.method, plan.url));
    for (name, value) in &plan.headers {
        out.push_str(&format!("{name}: {value}{CRLF}"));
    }
    out.push_str(CRLF);

    if plan.method != Method::GET && plan.method != Method::DELETE {
        if let Some(body) = &plan.body {
            out.push_str(&body.to_string());
            out.push_str(CRLF);
        }
    }
}
