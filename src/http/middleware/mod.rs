//! Request-scoped middleware.

pub mod request_log;

pub use request_log::{log_requests, RequestLog};
