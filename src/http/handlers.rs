//! Axum handlers binding operations to routes.
//!
//! JSON and query operations share one generic handler; the image upload
//! has its own because it reads a multipart form.

use std::collections::HashMap;
use std::time::Instant;

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{PathRejection, QueryRejection},
        Multipart, Path, Query, State,
    },
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::{get, post, MethodRouter},
};
use bytes::Bytes;
use serde_json::Value;

use crate::gateway::operation::{Operation, Verb};
use crate::gateway::{Attachment, GatewayError, InboundRequest};
use crate::http::server::AppState;
use crate::observability::metrics;

/// Multipart field that carries the uploaded image.
pub const IMAGE_FIELD: &str = "imagen";

/// Method router for a JSON/query operation.
pub fn operation_route(op: &'static Operation) -> MethodRouter<AppState> {
    let handler = move |State(state): State<AppState>,
                        path: Result<Option<Path<HashMap<String, String>>>, PathRejection>,
                        query: Result<Query<HashMap<String, String>>, QueryRejection>,
                        headers: HeaderMap,
                        body: Bytes| async move {
        let start = Instant::now();
        let request_id = request_id(&headers);

        let inbound = match read_inbound(op, path, query, &body) {
            Ok(mut inbound) => {
                inbound.request_id = request_id.clone();
                inbound
            }
            Err(e) => return finish(op, request_id.as_deref(), start, Err(e)),
        };
        let body_text = inbound
            .body
            .as_ref()
            .map(Value::to_string)
            .unwrap_or_default();

        tracing::debug!(
            operation = op.name,
            request_id = request_id.as_deref().unwrap_or("unknown"),
            path_params = ?inbound.path_params,
            query = ?inbound.query,
            body = %body_text,
            "Inbound request"
        );

        let result = state.gateway.execute(op, inbound).await;
        finish(op, request_id.as_deref(), start, result)
    };

    match op.verb {
        Verb::Get => get(handler),
        Verb::Post => post(handler),
    }
}

/// Method router for the multipart image upload.
pub fn upload_route(op: &'static Operation) -> MethodRouter<AppState> {
    post(
        move |State(state): State<AppState>,
              headers: HeaderMap,
              multipart: Result<Multipart, MultipartRejection>| async move {
            let start = Instant::now();
            let request_id = request_id(&headers);

            let attachment = match read_image(multipart).await {
                Ok(attachment) => attachment,
                Err(e) => return finish(op, request_id.as_deref(), start, Err(e)),
            };

            tracing::debug!(
                operation = op.name,
                request_id = request_id.as_deref().unwrap_or("unknown"),
                content_type = attachment.as_ref().map(|a| a.content_type.as_str()).unwrap_or("none"),
                bytes = attachment.as_ref().map(|a| a.bytes.len()).unwrap_or(0),
                "Inbound upload"
            );

            let inbound = InboundRequest {
                attachment,
                request_id: request_id.clone(),
                ..InboundRequest::default()
            };
            let result = state.gateway.execute(op, inbound).await;
            finish(op, request_id.as_deref(), start, result)
        },
    )
}

fn request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Collect path, query and body into an [`InboundRequest`]. Undecodable
/// path or query strings are validation errors.
fn read_inbound(
    op: &Operation,
    path: Result<Option<Path<HashMap<String, String>>>, PathRejection>,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
    body: &Bytes,
) -> Result<InboundRequest, GatewayError> {
    let path_params = path
        .map_err(|e| GatewayError::validation(format!("invalid path: {}", e.body_text())))?
        .map(|Path(params)| params)
        .unwrap_or_default();
    let Query(query) =
        query.map_err(|e| GatewayError::validation(format!("invalid query string: {}", e.body_text())))?;

    Ok(InboundRequest {
        path_params,
        query,
        body: parse_body(op, body)?,
        ..InboundRequest::default()
    })
}

/// Parse the JSON body of POST operations. An empty body reads as absent.
fn parse_body(op: &Operation, body: &Bytes) -> Result<Option<Value>, GatewayError> {
    if op.verb == Verb::Get || body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| GatewayError::validation(format!("malformed JSON body: {}", e)))
}

/// Buffer the `imagen` field. A missing field yields `None`; the gateway
/// turns that into a validation error.
async fn read_image(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Option<Attachment>, GatewayError> {
    let mut multipart = multipart.map_err(|_| GatewayError::validation("no image was provided"))?;

    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| GatewayError::validation(format!("malformed upload: {}", e.body_text())))?;

        let Some(field) = field else {
            return Ok(None);
        };
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| GatewayError::validation(format!("malformed upload: {}", e.body_text())))?;

        return Ok(Some(Attachment { content_type, bytes }));
    }
}

fn finish(
    op: &Operation,
    request_id: Option<&str>,
    start: Instant,
    result: Result<Response, GatewayError>,
) -> Response {
    let response = match result {
        Ok(response) => response,
        Err(e) => {
            match &e {
                GatewayError::Validation(_) | GatewayError::NotFound(_) => {
                    tracing::info!(operation = op.name, request_id, error = %e, "Request rejected");
                }
                GatewayError::Upstream { status, .. } => {
                    tracing::warn!(operation = op.name, request_id, status = %status, error = %e, "Upstream returned an error");
                }
                GatewayError::NoResponse => {
                    tracing::error!(operation = op.name, request_id, "No response from upstream");
                }
                GatewayError::RequestSetup(detail) => {
                    tracing::error!(operation = op.name, request_id, detail = %detail, "Failed to configure upstream request");
                }
            }
            metrics::record_failure(op.name, e.kind());
            e.into_response()
        }
    };

    metrics::record_request(op.name, response.status().as_u16(), start);
    response
}
