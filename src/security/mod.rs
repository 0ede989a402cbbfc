//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Secret-bearing environment values (CERT_PATH, KEY_PATH):
//!     → config loader reads and unsets the variable
//!     → sensitive.rs wraps the value in Sensitive<T>
//!     → Display / Debug / Serialize / tracing fields see "[REDACTED]"
//!     → net::tls calls expose() only to open the file
//! ```
//!
//! # Design Decisions
//! - Redaction is a property of the type, not of the call site
//! - The raw value is reachable only through an explicit `expose()`

pub mod sensitive;

pub use sensitive::{Sensitive, REDACTED};
