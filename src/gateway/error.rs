//! Gateway error taxonomy and its HTTP rendering.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Fixed message returned when the upstream never answered.
pub const NO_RESPONSE_MESSAGE: &str = "no response from backend";
/// Fixed message returned when the outbound call could not be built.
pub const REQUEST_SETUP_MESSAGE: &str = "error configuring the request";

/// Every way a gateway operation can fail.
///
/// Rendered to the caller as `{"message": "..."}` with the status from
/// [`GatewayError::status`].
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A required field is missing or the inbound payload is malformed.
    /// The upstream is never contacted.
    #[error("{0}")]
    Validation(String),

    /// The upstream answered with a non-2xx status.
    #[error("{message}")]
    Upstream { status: StatusCode, message: String },

    /// The request was sent but no response arrived (refused, reset, timeout).
    #[error("no response from backend")]
    NoResponse,

    /// The outbound call could not be constructed. The detail is logged only.
    #[error("error configuring the request")]
    RequestSetup(String),

    /// The upstream answered but the expected data was not in its body.
    #[error("{0}")]
    NotFound(String),
}

impl GatewayError {
    pub fn validation(message: impl Into<String>) -> Self {
        GatewayError::Validation(message.into())
    }

    pub fn setup(detail: impl Into<String>) -> Self {
        GatewayError::RequestSetup(detail.into())
    }

    /// Status code sent back to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::Upstream { status, .. } => *status,
            GatewayError::NoResponse | GatewayError::RequestSetup(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Validation(_) => "validation",
            GatewayError::Upstream { .. } => "upstream",
            GatewayError::NoResponse => "no_response",
            GatewayError::RequestSetup(_) => "request_setup",
            GatewayError::NotFound(_) => "not_found",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "message": self.to_string() }))).into_response()
    }
}
