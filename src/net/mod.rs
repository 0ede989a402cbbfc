//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ListenerSpec (kind + listener config + optional TLS paths)
//!     → listener.rs (resolve host, bind, serve until told to stop)
//!     → idle.rs (closes connections with no traffic for idle_timeout)
//!     → tls.rs (TLS 1.3 acceptor for HTTPS)
//!     → Hand off to HTTP layer (http::build_router)
//!
//! Listener task states:
//!     Resolving → Serving → Draining → Closed
//!                      ↘ Failed (posts ListenerFailed on the control channel)
//! ```
//!
//! # Design Decisions
//! - Each listener is an independent task with its own axum-server handle
//! - Bind and TLS errors surface inside the task, never at spawn time
//! - TLS material is read through `Sensitive::expose` only

pub mod idle;
pub mod listener;
pub mod tls;

pub use listener::{ActiveListener, ListenerError, ListenerKind, ListenerSpec};
pub use tls::{load_tls_config, TlsError};
