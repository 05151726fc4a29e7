//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, body limit, CORS)
//!     → handlers.rs (extract path/query/body or multipart → InboundRequest)
//!     → gateway (reshape, single upstream call, render)
//!     → Send to client
//! ```

pub mod handlers;
pub mod server;

pub use server::{AppState, HttpServer};
