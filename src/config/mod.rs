//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! process environment (SERVICE_*, HOST, *_PORT, CERT_PATH, KEY_PATH)
//!     → env.rs (EnvSource: read, unset)
//!     → loader.rs (defaults, parsing, HTTPS enablement)
//!     → validation.rs (environment tag, port ranges, file checks)
//!     → Config (validated, immutable)
//!     → handed by value to the lifecycle coordinator
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - All fields have defaults so an empty environment is valid
//! - Every failure is classified as a usage or a configuration error
//! - Secret paths are unset from the environment as soon as they are read

pub mod env;
pub mod loader;
pub mod schema;
pub mod validation;

pub use env::{EnvSource, ProcessEnv};
pub use schema::{Config, Environment, ListenerConfig, ServiceConfig, TlsListenerConfig};
