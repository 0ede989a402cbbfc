//! Dual-protocol (HTTP/HTTPS) service bootstrap.
//!
//! Reads its configuration from the environment, serves a static page on up
//! to two listeners, and turns OS signals or listener failures into a
//! deadline-bounded graceful shutdown with a `sysexits` exit code.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod security;

pub use config::schema::Config;
pub use error::ServiceError;
pub use lifecycle::Coordinator;
