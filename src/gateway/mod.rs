//! Translation gateway subsystem.
//!
//! # Data Flow
//! ```text
//! InboundRequest + Operation
//!     → reshape.rs (required-field check, path/query, payload table)
//!     → upstream::client (exactly one outbound call)
//!     → reply.rs (pass through, entry summary, or unwrap)
//!     → HTTP response | GatewayError
//! ```
//!
//! # Design Decisions
//! - Operations are static data (operation.rs); one generic engine runs them
//! - Validation failures never reach the upstream
//! - The gateway is immutable after construction and shared via Arc

pub mod clock;
pub mod error;
pub mod inbound;
pub mod operation;
pub mod outbound;
pub mod reply;
pub mod reshape;

use std::sync::Arc;

use axum::response::Response;

use crate::config::UpstreamConfig;
use crate::upstream::UpstreamClient;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::GatewayError;
pub use inbound::{Attachment, InboundRequest};
pub use operation::{Operation, OPERATIONS};
pub use outbound::{OutboundRequest, OutboundResult};

/// Executes operations against the configured upstreams.
pub struct Gateway {
    client: UpstreamClient,
    clock: Arc<dyn Clock>,
}

impl Gateway {
    /// Create a gateway using the host clock.
    pub fn new(config: &UpstreamConfig) -> Result<Self, GatewayError> {
        Ok(Self {
            client: UpstreamClient::new(config)?,
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the clock used for entry time stamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run one operation: validate and reshape, call upstream once, render.
    pub async fn execute(
        &self,
        op: &Operation,
        inbound: InboundRequest,
    ) -> Result<Response, GatewayError> {
        let outbound = reshape::prepare(op, &inbound, self.clock.as_ref())?;

        if let Some(payload) = outbound.json() {
            tracing::debug!(operation = op.name, payload = %payload, "Outbound payload");
        }

        let result = self
            .client
            .send(&outbound, inbound.request_id.as_deref())
            .await;

        reply::render(op.reply, &outbound, result)
    }
}
