//! HTTP responses. Every body is JSON.

use anyhow::Result;
use serde::Serialize;
use serde_json::{Value, json};
use tiny_http::{Header, Method, Request, Response, StatusCode};

const JSON: &str = "application/json; charset=utf-8";

/// Status and body of a response, independent of the connection.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
}

impl Reply {
    pub fn ok(body: &impl Serialize) -> Self {
        match serde_json::to_value(body) {
            Ok(body) => Self { status: 200, body },
            Err(e) => Self::error(500, format!("failed to encode response: {e}")),
        }
    }

    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::error(400, message)
    }

    pub fn not_found() -> Self {
        Self::error(404, "not found")
    }
}

/// Write `reply` to the client. HEAD requests get the headers only.
pub fn send(request: Request, reply: Reply) -> Result<()> {
    let status = StatusCode(reply.status);

    if is_head_request(&request) {
        let response = Response::empty(status).with_header(make_header("Content-Type", JSON));
        request.respond(response)?;
        return Ok(());
    }

    let body = serde_json::to_vec(&reply.body)?;
    let response = Response::from_data(body)
        .with_status_code(status)
        .with_header(make_header("Content-Type", JSON));
    request.respond(response)?;
    Ok(())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    send(request, Reply::error(503, "shutting down"))
}

pub fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn make_header(key: &'static str, value: &'static str) -> Header {
    Header::from_bytes(key, value).unwrap()
}
