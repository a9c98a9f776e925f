//! The HTTP server front end
//!
//! A deliberately small hand-rolled server: static chat page, health
//! probe, and one relay endpoint that runs a full engine turn per request.
//! Requests are handled on their own threads; the async core is driven
//! through the runtime handle, so a failing turn never takes the serving
//! process down.

mod html;

use std::io::Read;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde_json::{json, Value};
use tiny_http::{Header, Method, Request, Response, Server};
use tracing::{debug, error, info};

use adk_chat_core::engine::ReasoningEngineClient;
use adk_chat_core::Config;

/// Accept loop. Blocks until the listener fails; individual requests are
/// dispatched to short-lived threads.
pub fn run(
    config: &Config,
    client: Arc<ReasoningEngineClient>,
    handle: tokio::runtime::Handle,
) -> Result<()> {
    let server = Server::http(("0.0.0.0", config.port))
        .map_err(|e| anyhow!("binding port {}: {}", config.port, e))?;
    info!("Listening on http://0.0.0.0:{}", config.port);

    let index_page = Arc::new(html::render_index(&config.default_engine));

    for request in server.incoming_requests() {
        let client = client.clone();
        let handle = handle.clone();
        let index_page = index_page.clone();
        std::thread::spawn(move || handle_request(request, &client, &handle, &index_page));
    }

    Ok(())
}

fn handle_request(
    mut request: Request,
    client: &ReasoningEngineClient,
    handle: &tokio::runtime::Handle,
    index_page: &str,
) {
    let method = request.method().clone();
    // Route on the bare path
    let path = request.url().split('?').next().unwrap_or("").to_string();
    debug!("{} {}", method, path);

    let response = if path == "/healthz" {
        plain_response(200, "ok")
    } else if method == Method::Get && path == "/" {
        html_response(200, index_page)
    } else if method == Method::Post && path == "/chat" {
        let mut body = Vec::new();
        if request.as_reader().read_to_end(&mut body).is_err() {
            json_response(400, &json!({"error": "Failed to read request body."}))
        } else {
            let (status, payload) = handle.block_on(chat_turn(client, &body));
            json_response(status, &payload)
        }
    } else {
        json_response(404, &json!({"error": "Not found."}))
    };

    if let Err(e) = request.respond(response) {
        error!("Failed to send response: {}", e);
    }
}

/// One relay turn: validate the request, run the engine query, map the
/// outcome to a status and JSON payload.
async fn chat_turn(client: &ReasoningEngineClient, body: &[u8]) -> (u16, Value) {
    // Unparseable bodies behave like empty ones and fail field validation
    let body: Value = serde_json::from_slice(body).unwrap_or_else(|_| json!({}));

    let message = string_field(&body, "message");
    let engine = string_field(&body, "engine");
    let user_id = match string_field(&body, "user_id") {
        id if id.is_empty() => fallback_user_id(),
        id => id,
    };

    if engine.is_empty() || message.is_empty() {
        return (
            400,
            json!({"error": "Both 'engine' and 'message' are required."}),
        );
    }

    match client.query(&engine, &message, &user_id).await {
        Ok(response) => (200, json!({"response": response})),
        Err(e) if e.is_upstream() => (502, json!({"error": format!("HTTP error: {e}")})),
        Err(e) => (500, json!({"error": format!("Error: {e}")})),
    }
}

fn string_field(body: &Value, field: &str) -> String {
    body.get(field)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .trim()
        .to_string()
}

/// Generated identifier for clients that did not send one.
fn fallback_user_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

type ByteResponse = Response<std::io::Cursor<Vec<u8>>>;

fn json_response(status: u16, payload: &Value) -> ByteResponse {
    with_headers(
        Response::from_data(payload.to_string().into_bytes()).with_status_code(status),
        "application/json; charset=utf-8",
    )
}

fn html_response(status: u16, page: &str) -> ByteResponse {
    with_headers(
        Response::from_data(page.as_bytes().to_vec()).with_status_code(status),
        "text/html; charset=utf-8",
    )
}

fn plain_response(status: u16, body: &str) -> ByteResponse {
    let mut response = Response::from_data(body.as_bytes().to_vec()).with_status_code(status);
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], &b"text/plain"[..]) {
        response.add_header(header);
    }
    response
}

fn with_headers(mut response: ByteResponse, content_type: &str) -> ByteResponse {
    for (name, value) in [("Content-Type", content_type), ("Cache-Control", "no-store")] {
        if let Ok(header) = Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            response.add_header(header);
        }
    }
    response
}
