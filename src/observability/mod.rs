//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (level, message, key/value fields)
//!     → inside the `service` span (name, node, env, version)
//!     → inside a `listener` span (handler = http | https) where applicable
//!
//! logging.rs turns them into:
//!     → text lines with source locations (development)
//!     → JSON lines (production)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing in production
//! - Listener kind is passed explicitly, never looked up from ambient state
//! - Timestamps are UTC

pub mod logging;

#[cfg(test)]
pub(crate) mod capture;
