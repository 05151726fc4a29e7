//! Rendering of outbound results into caller responses.

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde_json::{Map, Value};

use crate::gateway::error::GatewayError;
use crate::gateway::operation::Reply;
use crate::gateway::outbound::{OutboundRequest, OutboundResult};

/// Caller-supplied entry fields echoed back in the entry summary.
const ENTRY_SUMMARY_FIELDS: &[&str] = &[
    "LocatarioId",
    "LocatarioNombre",
    "EntradaFechaCap",
    "EntradaHoraCita",
    "EntradaTipoDuracion",
    "EntradaObserv",
];

/// Normalize a transport result into `Ok(success body)` or a gateway error.
pub fn into_result(result: OutboundResult) -> Result<(StatusCode, Option<String>, Bytes), GatewayError> {
    match result {
        OutboundResult::Success { status, content_type, body } => Ok((status, content_type, body)),
        OutboundResult::UpstreamError { status, message } => {
            Err(GatewayError::Upstream { status, message })
        }
        OutboundResult::NoResponse => Err(GatewayError::NoResponse),
        OutboundResult::RequestSetupFailure(detail) => Err(GatewayError::RequestSetup(detail)),
    }
}

/// Render the caller response for `reply`.
pub fn render(
    reply: Reply,
    outbound: &OutboundRequest,
    result: OutboundResult,
) -> Result<Response, GatewayError> {
    let (status, content_type, body) = into_result(result)?;

    match reply {
        Reply::PassThrough => Ok(pass_through(status, content_type, body)),
        Reply::EntrySummary => {
            let upstream = serde_json::from_slice::<Value>(&body).unwrap_or(Value::Null);
            Ok((StatusCode::OK, Json(entry_summary(outbound, &upstream))).into_response())
        }
        Reply::Unwrap { field, not_found } => {
            let value = serde_json::from_slice::<Value>(&body)
                .ok()
                .and_then(|v| match v {
                    Value::Object(mut map) => map.remove(field),
                    _ => None,
                })
                .filter(|v| !v.is_null())
                .ok_or_else(|| GatewayError::NotFound(not_found.to_string()))?;
            Ok((status, Json(value)).into_response())
        }
    }
}

fn pass_through(status: StatusCode, content_type: Option<String>, body: Bytes) -> Response {
    let content_type = content_type
        .and_then(|ct| HeaderValue::from_str(&ct).ok())
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response.headers_mut().insert(header::CONTENT_TYPE, content_type);
    response
}

/// Build the entry-creation response from the stamped outbound envelope and
/// the upstream body.
pub fn entry_summary(outbound: &OutboundRequest, upstream: &Value) -> Value {
    let entry = outbound
        .json()
        .and_then(Value::as_object)
        .and_then(|outer| outer.values().next())
        .and_then(Value::as_object);

    let mut summary = Map::new();
    summary.insert(
        "EntradaId".to_string(),
        upstream.get("EntradaId").cloned().unwrap_or(Value::Null),
    );
    if let Some(entry) = entry {
        for field in ENTRY_SUMMARY_FIELDS {
            if let Some(value) = entry.get(*field) {
                summary.insert(field.to_string(), value.clone());
            }
        }
    }
    summary.insert("Part".to_string(), Value::Array(Vec::new()));
    Value::Object(summary)
}
