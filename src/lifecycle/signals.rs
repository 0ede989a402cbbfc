//! OS signal handling and the control channel.
//!
//! # Responsibilities
//! - Register signal handlers (SIGINT, SIGHUP, SIGQUIT, SIGTERM)
//! - Translate signals to [`ControlSignal`] values
//! - Forward every signal, not just the first, so repeats can be observed
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Registration happens synchronously so failures surface before serving
//! - One unbounded channel carries both OS signals and listener failures

use std::fmt;
use std::io;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::sysexits;
use crate::net::ListenerKind;

/// A termination trigger delivered to the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    /// SIGINT or Ctrl-C.
    Interrupt,
    /// SIGHUP.
    Hangup,
    /// SIGQUIT.
    Quit,
    /// SIGTERM.
    Terminate,
    /// A listener stopped serving on its own.
    ListenerFailed(ListenerKind),
}

impl ControlSignal {
    pub fn is_listener_failure(&self) -> bool {
        matches!(self, ControlSignal::ListenerFailed(_))
    }

    /// Process exit code when this signal started the shutdown.
    pub fn exit_code(&self) -> u8 {
        if self.is_listener_failure() {
            sysexits::SOFTWARE
        } else {
            sysexits::OK
        }
    }
}

impl fmt::Display for ControlSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlSignal::Interrupt => f.write_str("interrupt"),
            ControlSignal::Hangup => f.write_str("hangup"),
            ControlSignal::Quit => f.write_str("quit"),
            ControlSignal::Terminate => f.write_str("terminated"),
            ControlSignal::ListenerFailed(kind) => write!(f, "{kind} listener failed"),
        }
    }
}

pub type ControlSender = mpsc::UnboundedSender<ControlSignal>;
pub type ControlReceiver = mpsc::UnboundedReceiver<ControlSignal>;

/// Multi-producer, single-consumer control channel.
pub fn control_channel() -> (ControlSender, ControlReceiver) {
    mpsc::unbounded_channel()
}

/// Registered OS signal streams.
#[cfg(unix)]
pub struct SignalSource {
    interrupt: tokio::signal::unix::Signal,
    hangup: tokio::signal::unix::Signal,
    quit: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl SignalSource {
    /// Install handlers. Must be called from within a Tokio runtime.
    pub fn register() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            hangup: signal(SignalKind::hangup())?,
            quit: signal(SignalKind::quit())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    async fn next(&mut self) -> ControlSignal {
        tokio::select! {
            _ = self.interrupt.recv() => ControlSignal::Interrupt,
            _ = self.hangup.recv() => ControlSignal::Hangup,
            _ = self.quit.recv() => ControlSignal::Quit,
            _ = self.terminate.recv() => ControlSignal::Terminate,
        }
    }
}

#[cfg(not(unix))]
pub struct SignalSource {
    _private: (),
}

#[cfg(not(unix))]
impl SignalSource {
    pub fn register() -> io::Result<Self> {
        Ok(Self { _private: () })
    }

    async fn next(&mut self) -> ControlSignal {
        match tokio::signal::ctrl_c().await {
            Ok(()) => ControlSignal::Interrupt,
            Err(e) => {
                tracing::error!(error = %e, "Ctrl-C handler failed");
                std::future::pending().await
            }
        }
    }
}

impl SignalSource {
    /// Forward signals to `control` until the receiver goes away.
    pub fn forward(mut self, control: ControlSender) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let signal = self.next().await;
                tracing::debug!(%signal, "signal received");
                if control.send(signal).is_err() {
                    break;
                }
            }
        })
    }
}
