// ABOUTME: Integration tests for the HTTP API router.
// ABOUTME: Drives the router in-process and checks envelopes, SSE framing, and health.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use httpmock::prelude::*;
use pretty_assertions::assert_eq;
use redline_service::{router, Client};
use serde_json::{json, Value};
use tower::ServiceExt;

const BILL_HTML: &str = "<html><body><table><tr><td><u>added clause</u> existing text <del>removed clause</del></td></tr></table><p>Padding so the document clears the minimum length check for retrieval.</p></body></html>";

fn app(client: Client) -> Router {
    router(Arc::new(client))
}

fn local_client() -> Client {
    Client::builder()
        .allowed_host(None)
        .allow_private_networks(true)
        .build()
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, axum::http::HeaderMap, String) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn health_reports_ok() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app(local_client()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value, json!({"status": "ok"}));
}

#[tokio::test]
async fn parse_returns_segments_and_stats() {
    let (status, _, body) = post_json(
        app(local_client()),
        "/api/v1/bills/parse",
        json!({"html": BILL_HTML}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let value: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["success"], json!(true));
    assert_eq!(
        value["segments"][0],
        json!({"type": "new", "text": "added clause"})
    );
    assert_eq!(
        value["stats"],
        json!({"new_count": 1, "new_words": 2, "deleted_count": 1, "deleted_words": 2})
    );
    assert!(value["taggedText"]
        .as_str()
        .unwrap()
        .starts_with("[NEW] added clause [/NEW] existing text [DELETED] removed clause [/DELETED]"));
    assert!(value.get("error").is_none());
}

#[tokio::test]
async fn parse_failure_is_reported_in_envelope() {
    let (status, _, body) = post_json(
        app(local_client()),
        "/api/v1/bills/parse",
        json!({"html": "<p>plain text only</p>"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let value: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["success"], json!(false));
    assert_eq!(value["segments"], json!([]));
    assert_eq!(value["taggedText"], json!(""));
    assert_eq!(value["stats"]["new_count"], json!(0));
    assert!(value["error"]
        .as_str()
        .unwrap()
        .starts_with("No legislative formatting detected."));
}

#[tokio::test]
async fn fetch_returns_markup() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/bill");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body(BILL_HTML);
    });

    let (status, _, body) = post_json(
        app(local_client()),
        "/api/v1/bills/fetch",
        json!({"url": server.url("/bill")}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["success"], json!(true));
    assert_eq!(value["html"], json!(BILL_HTML));
}

#[tokio::test]
async fn fetch_failure_is_reported_in_envelope() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/missing");
        then.status(404);
    });

    let (status, _, body) = post_json(
        app(local_client()),
        "/api/v1/bills/fetch",
        json!({"url": server.url("/missing")}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["success"], json!(false));
    assert_eq!(value["html"], json!(""));
    assert_eq!(
        value["error"],
        json!("HTTP error 404. The bill page may not exist.")
    );
}

#[tokio::test]
async fn fetch_rejects_non_ilga_urls_by_default() {
    let (_, _, body) = post_json(
        app(Client::builder().build()),
        "/api/v1/bills/fetch",
        json!({"url": "https://example.com/bill"}),
    )
    .await;
    let value: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["success"], json!(false));
    assert_eq!(
        value["error"],
        json!("Invalid URL. Please provide a valid ILGA.gov bill URL.")
    );
}

#[tokio::test]
async fn analyze_streams_sse_fragments() {
    let server = MockServer::start();
    let sse = "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"First.\"}}\n\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Second.\"}}\n\ndata: {\"type\":\"message_stop\"}\n\n";
    server.mock(|when, then| {
        when.method(POST).path("/v1/messages");
        then.status(200)
            .header("content-type", "text/event-stream")
            .body(sse);
    });

    let client = Client::builder()
        .api_key("test-key")
        .api_base(server.base_url())
        .build();
    let (status, headers, body) = post_json(
        app(client),
        "/api/v1/bills/analyze",
        json!({"taggedText": "[NEW] a [/NEW]"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));
    assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
    assert_eq!(body, "data: First.\n\ndata: Second.\n\n");
}

#[tokio::test]
async fn analyze_without_key_sends_error_event() {
    let (status, _, body) = post_json(
        app(local_client()),
        "/api/v1/bills/analyze",
        json!({"taggedText": "[NEW] a [/NEW]"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        "data: Error: Anthropic API key not configured. Please set ANTHROPIC_API_KEY environment variable.\n\n"
    );
}

#[tokio::test]
async fn serves_over_a_real_listener() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app(local_client())).await.unwrap();
    });

    let http = reqwest::Client::new();
    let health: Value = http
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health, json!({"status": "ok"}));

    let parsed: Value = http
        .post(format!("http://{}/api/v1/bills/parse", addr))
        .json(&json!({"html": BILL_HTML}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(parsed["stats"]["deleted_words"], json!(2));
}

#[tokio::test]
async fn analyze_failure_event_points_to_copy_fallback() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/messages");
        then.status(500)
            .body(r#"{"type":"error","error":{"type":"api_error","message":"boom"}}"#);
    });

    let client = Client::builder()
        .api_key("test-key")
        .api_base(server.base_url())
        .build();
    let (status, _, body) = post_json(
        app(client),
        "/api/v1/bills/analyze",
        json!({"taggedText": "[NEW] a [/NEW]"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("data: Error: Could not connect to Claude API. HTTP 500: boom"));
    assert!(body.contains("Use the 'Copy for Any AI' button to paste the tagged text into any AI chat."));
}
