// ABOUTME: axum HTTP transport exposing fetch, parse and streaming analysis under /api/v1/bills.
// ABOUTME: Includes request logging middleware and a serve() entry point with Ctrl-C shutdown.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::{self, Next};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::{future, StreamExt};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::api::{
    AnalyzeBillRequest, FetchBillRequest, FetchBillResponse, ParseBillRequest, ParseBillResponse,
};
use crate::client::Client;

/// Prefix all bill routes are mounted under.
pub const API_PREFIX: &str = "/api/v1/bills";

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

    if status >= 500 {
        error!("{} {} {} {:.1}ms", method, path, status, latency_ms);
    } else if status >= 400 {
        warn!("{} {} {} {:.1}ms", method, path, status, latency_ms);
    } else {
        info!("{} {} {} {:.1}ms", method, path, status, latency_ms);
    }

    response
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn fetch_bill(
    State(client): State<Arc<Client>>,
    Json(request): Json<FetchBillRequest>,
) -> Json<FetchBillResponse> {
    match client.fetch_bill(&request.url).await {
        Ok(html) => Json(FetchBillResponse::ok(html)),
        Err(e) => {
            warn!("fetch failed: {}", e);
            Json(FetchBillResponse::failed(e.message()))
        }
    }
}

async fn parse_bill(
    State(client): State<Arc<Client>>,
    Json(request): Json<ParseBillRequest>,
) -> Json<ParseBillResponse> {
    match client.parse_bill(&request.html) {
        Ok(parsed) => Json(parsed.into()),
        Err(e) => {
            warn!("parse failed: {}", e);
            Json(ParseBillResponse::failed(e.message()))
        }
    }
}

async fn analyze_bill(
    State(client): State<Arc<Client>>,
    Json(request): Json<AnalyzeBillRequest>,
) -> impl IntoResponse {
    let events = client
        .analyze(&request.tagged_text)
        .scan(false, |ended, item| {
            if *ended {
                return future::ready(None);
            }
            let data = match item {
                Ok(fragment) => fragment,
                Err(e) => {
                    error!("analysis stream failed: {}", e);
                    *ended = true;
                    format!("Error: {}", e.message())
                }
            };
            // Event::data panics on carriage returns.
            let event = Event::default().data(data.replace('\r', ""));
            future::ready(Some(Ok::<_, Infallible>(event)))
        });

    ([(header::CACHE_CONTROL, "no-cache")], Sse::new(events))
}

/// Builds the application router around a shared client.
pub fn router(client: Arc<Client>) -> Router {
    let bills = Router::new()
        .route("/fetch", post(fetch_bill))
        .route("/parse", post(parse_bill))
        .route("/analyze", post(analyze_bill));

    Router::new()
        .route("/health", get(health))
        .nest(API_PREFIX, bills)
        .with_state(client)
        .layer(middleware::from_fn(log_requests))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to install Ctrl+C handler: {}", e);
        future::pending::<()>().await;
    }
    info!("shutting down server");
}

/// Serves the API on `addr` until Ctrl-C.
pub async fn serve(addr: SocketAddr, client: Arc<Client>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(client))
        .with_graceful_shutdown(shutdown_signal())
        .await
}
