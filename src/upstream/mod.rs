//! Upstream transport subsystem.
//!
//! # Data Flow
//! ```text
//! OutboundRequest (from gateway::reshape)
//!     → client.rs (base URL + encoded path/query, one reqwest call)
//!     → OutboundResult (Success | UpstreamError | NoResponse | RequestSetupFailure)
//! ```
//!
//! # Design Decisions
//! - One pooled client shared by every request
//! - Never retries; the transport's own timeout applies unless configured
//! - Network failures after the request is sent are reported as NoResponse

pub mod client;

pub use client::UpstreamClient;
