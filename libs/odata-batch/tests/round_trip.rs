//! Render/decode round trips over the full codec surface.

use http::Method;
use odata_batch::{Batch, BoundarySource, parse_response};
use odata_query::{HttpPlan, ResponseKind};
use serde_json::json;

fn plan(method: Method, path: &str, body: Option<serde_json::Value>) -> HttpPlan {
    HttpPlan {
        method,
        url: path.to_owned(),
        headers: vec![
            ("OData-Version".to_owned(), "4.0".to_owned()),
            ("Accept".to_owned(), "application/json".to_owned()),
        ],
        body,
        response_kind: ResponseKind::Entity,
    }
}

#[test]
fn two_gets_then_patch_render_shape() {
    let mut batch = Batch::with_boundary_source(BoundarySource::with_seed("seed"));
    batch.add(plan(Method::GET, "People('a')", None));
    batch.add(plan(Method::GET, "People('b')", None));
    batch.add(plan(
        Method::PATCH,
        "People('c')",
        Some(json!({"FirstName": "Scott"})),
    ));
    let payload = batch.render();

    // Both GETs are top-level parts, the PATCH opens a changeset numbered
    // from Content-ID 1.
    assert_eq!(payload.body.matches("--batch_seed_1\r\n").count(), 3);
    assert!(payload.body.contains("GET People('a') HTTP/1.1"));
    assert!(payload.body.contains("GET People('b') HTTP/1.1"));
    assert!(
        payload
            .body
            .contains("Content-Type: multipart/mixed; boundary=changeset_seed_2")
    );
    assert!(payload.body.contains("Content-ID: 1"));
    assert!(payload.body.contains("PATCH People('c') HTTP/1.1"));
    let get_b = payload.body.find("GET People('b')").unwrap();
    let patch_c = payload.body.find("PATCH People('c')").unwrap();
    assert!(get_b < patch_c);
}

#[test]
fn three_part_response_decodes_in_original_order() {
    let body = concat!(
        "--b\r\n",
        "Content-Type: application/http\r\n",
        "\r\n",
        "HTTP/1.1 200 OK\r\n",
        "Content-Type: application/json\r\n",
        "\r\n",
        "{\"UserName\":\"a\"}\r\n",
        "--b\r\n",
        "Content-Type: application/http\r\n",
        "\r\n",
        "HTTP/1.1 200 OK\r\n",
        "Content-Type: application/json\r\n",
        "\r\n",
        "{\"UserName\":\"b\"}\r\n",
        "--b\r\n",
        "Content-Type: multipart/mixed; boundary=cs\r\n",
        "\r\n",
        "--cs\r\n",
        "Content-Type: application/http\r\n",
        "Content-ID: 1\r\n",
        "\r\n",
        "HTTP/1.1 204 No Content\r\n",
        "\r\n",
        "--cs--\r\n",
        "--b--\r\n",
    );
    let outcomes = parse_response("multipart/mixed; boundary=b", body).unwrap();
    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0].body, Some(json!({"UserName": "a"})));
    assert_eq!(outcomes[1].body, Some(json!({"UserName": "b"})));
    assert_eq!(outcomes[2].status, 204);
    assert!(outcomes[2].body.is_none());
}

#[test]
fn mixed_success_and_failure_items_complete_independently() {
    let body = concat!(
        "--b\r\n",
        "Content-Type: application/http\r\n",
        "\r\n",
        "HTTP/1.1 200 OK\r\n",
        "\r\n",
        "{\"ok\":true}\r\n",
        "--b\r\n",
        "Content-Type: application/http\r\n",
        "\r\n",
        "HTTP/1.1 400 Bad Request\r\n",
        "Content-Type: application/json\r\n",
        "\r\n",
        "{\"error\":{\"code\":\"BadRequest\"}}\r\n",
        "--b--\r\n",
    );
    let outcomes = parse_response("multipart/mixed; boundary=b", body).unwrap();
    assert!(outcomes[0].is_success());
    assert!(!outcomes[1].is_success());
    assert_eq!(
        outcomes[1].body,
        Some(json!({"error": {"code": "BadRequest"}}))
    );
}
