//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (coordinator.rs):
//!     Register signals → Spawn listeners (HTTP, then HTTPS) → Running
//!
//! Control channel (signals.rs):
//!     SIGINT/SIGHUP/SIGQUIT/SIGTERM ─┐
//!     listener failure ──────────────┴→ mpsc → coordinator
//!
//! Shutdown (shutdown.rs):
//!     First control signal → Stop all listeners concurrently → Deadline → Exit
//! ```
//!
//! # Design Decisions
//! - One consumer, many producers: every trigger goes through the same queue
//! - Listener failures are never retried; they shut the process down
//! - Shutdown has a deadline; stragglers are abandoned, not escalated
//! - A second signal during shutdown is only logged

pub mod coordinator;
pub mod shutdown;
pub mod signals;

pub use coordinator::{Coordinator, Phase};
pub use shutdown::{shutdown_all, ShutdownReport, StopError, Stoppable};
pub use signals::{control_channel, ControlSender, ControlSignal, SignalSource};
