//! Outbound call description and its normalized result.

use axum::http::StatusCode;
use bytes::Bytes;
use serde_json::Value;

use crate::gateway::operation::{Upstream, Verb};

/// Body of the single outbound call.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundBody {
    Empty,
    Json(Value),
    Binary {
        content_type: String,
        extension: String,
        bytes: Bytes,
    },
}

/// A fully reshaped upstream call, ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub verb: Verb,
    pub upstream: Upstream,
    /// Unencoded path segments appended to the upstream base URL.
    pub segments: Vec<String>,
    /// Unencoded query pairs, in declaration order.
    pub query: Vec<(String, String)>,
    pub body: OutboundBody,
}

impl OutboundRequest {
    /// JSON payload, if any.
    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            OutboundBody::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// What happened to the outbound call.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundResult {
    /// 2xx: status, content type and body verbatim.
    Success {
        status: StatusCode,
        content_type: Option<String>,
        body: Bytes,
    },
    /// Non-2xx with the message extracted from the upstream body.
    UpstreamError { status: StatusCode, message: String },
    /// Sent, but nothing came back.
    NoResponse,
    /// Could not be built or sent at all.
    RequestSetupFailure(String),
}

/// Pull `message` out of an upstream error body, falling back to the
/// status' reason phrase.
pub fn extract_message(status: StatusCode, body: &[u8]) -> String {
    let message = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").cloned())
        .filter(|m| !m.is_null());

    match message {
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
        None => status
            .canonical_reason()
            .unwrap_or("upstream error")
            .to_string(),
    }
}
