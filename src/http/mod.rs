//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection (net::listener)
//!     → middleware/request_log.rs (optional, DEBUG record per request)
//!     → server.rs panic guard (500 + error log)
//!     → server.rs handler timeout (empty body on trip)
//!     → routes.rs (GET /)
//!     → Send to client
//! ```
//!
//! # Design Decisions
//! - Logging wraps the timeout guard, so logged durations include it
//! - The listener kind is threaded in explicitly for log scoping

pub mod middleware;
pub mod routes;
pub mod server;

pub use server::build_router;
