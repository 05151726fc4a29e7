//! Locatario gateway library.
//!
//! Translates browser requests into calls against the data and catalog
//! upstream APIs and normalizes their answers.

pub mod config;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod upstream;

pub use config::GatewayConfig;
pub use gateway::Gateway;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
