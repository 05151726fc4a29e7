//! HTTP client for the two upstream APIs.
//!
//! # Responsibilities
//! - Resolve the base URL for an operation's upstream
//! - Encode path segments and query pairs
//! - Send exactly one request (no retries)
//! - Classify the outcome into an [`OutboundResult`]

use std::time::Duration;

use axum::http::StatusCode;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use url::Url;

use crate::config::UpstreamConfig;
use crate::gateway::error::GatewayError;
use crate::gateway::operation::{Upstream, Verb};
use crate::gateway::outbound::{extract_message, OutboundBody, OutboundRequest, OutboundResult};

/// Header carrying the file extension of uploaded images.
pub const FILE_EXTENSION_HEADER: &str = "File-Extension";
/// Correlation header forwarded upstream.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Pooled client bound to the configured upstream base URLs.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    data_url: String,
    catalog_url: String,
}

impl UpstreamClient {
    /// Create a new upstream client.
    pub fn new(config: &UpstreamConfig) -> Result<Self, GatewayError> {
        let mut builder = Client::builder();
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let client = builder
            .build()
            .map_err(|e| GatewayError::setup(format!("failed to create client: {}", e)))?;

        Ok(Self {
            client,
            data_url: config.data_url.clone(),
            catalog_url: config.catalog_url.clone(),
        })
    }

    fn base(&self, upstream: Upstream) -> &str {
        match upstream {
            Upstream::Data => &self.data_url,
            Upstream::Catalog => &self.catalog_url,
        }
    }

    /// Absolute URL for `request`.
    pub fn url_for(&self, request: &OutboundRequest) -> Result<Url, GatewayError> {
        let base = self.base(request.upstream);
        let mut url = Url::parse(base)
            .map_err(|e| GatewayError::setup(format!("invalid upstream URL '{}': {}", base, e)))?;

        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| GatewayError::setup(format!("upstream URL '{}' cannot be a base", base)))?;
            segments.pop_if_empty();
            for segment in &request.segments {
                segments.push(segment);
            }
        }

        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }

        Ok(url)
    }

    /// Issue the call and classify the outcome.
    pub async fn send(&self, request: &OutboundRequest, request_id: Option<&str>) -> OutboundResult {
        let url = match self.url_for(request) {
            Ok(url) => url,
            Err(GatewayError::RequestSetup(detail)) => return OutboundResult::RequestSetupFailure(detail),
            Err(other) => return OutboundResult::RequestSetupFailure(other.to_string()),
        };

        let mut builder = match request.verb {
            Verb::Get => self.client.get(url.clone()),
            Verb::Post => self.client.post(url.clone()),
        };

        if let Some(id) = request_id.and_then(|id| HeaderValue::from_str(id).ok()) {
            builder = builder.header(REQUEST_ID_HEADER, id);
        }

        builder = match &request.body {
            OutboundBody::Empty => builder,
            OutboundBody::Json(value) => builder.json(value),
            OutboundBody::Binary { content_type, extension, bytes } => builder
                .header(CONTENT_TYPE, content_type.as_str())
                .header(FILE_EXTENSION_HEADER, extension.as_str())
                .body(bytes.clone()),
        };

        tracing::debug!(
            upstream = request.upstream.as_str(),
            method = request.verb.as_str(),
            url = %url,
            "Calling upstream"
        );

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) if e.is_builder() => {
                tracing::error!(url = %url, error = %e, "Failed to build upstream request");
                return OutboundResult::RequestSetupFailure(e.to_string());
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "No response from upstream");
                return OutboundResult::NoResponse;
            }
        };

        let status: StatusCode = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(url = %url, status = %status, error = %e, "Upstream body was cut off");
                return OutboundResult::NoResponse;
            }
        };

        tracing::debug!(url = %url, status = %status, bytes = body.len(), "Upstream responded");

        if status.is_success() {
            OutboundResult::Success { status, content_type, body }
        } else {
            OutboundResult::UpstreamError {
                status,
                message: extract_message(status, &body),
            }
        }
    }
}
