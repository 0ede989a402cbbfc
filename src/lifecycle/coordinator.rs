//! Lifecycle coordinator.
//!
//! ```text
//! Idle → Starting → Running → ShuttingDown → Terminated
//! ```
//!
//! The coordinator owns the single consumer end of the control channel. The
//! first control signal of any kind moves it to `ShuttingDown`; which signal
//! it was decides the exit code.

use futures_util::future::join_all;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::Instrument;

use crate::config::Config;
use crate::error::{sysexits, ServiceError};
use crate::lifecycle::shutdown::shutdown_all;
use crate::lifecycle::signals::{
    control_channel, ControlReceiver, ControlSender, ControlSignal, SignalSource,
};
use crate::net::{ActiveListener, ListenerSpec};

/// Coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Starting,
    Running,
    ShuttingDown,
    Terminated,
}

/// Starts the configured listeners and shuts them down on the first control
/// signal.
pub struct Coordinator {
    config: Config,
    control_tx: ControlSender,
    control_rx: ControlReceiver,
    phase: watch::Sender<Phase>,
}

impl Coordinator {
    pub fn new(config: Config) -> Self {
        let (control_tx, control_rx) = control_channel();
        let (phase, _) = watch::channel(Phase::Idle);
        Self {
            config,
            control_tx,
            control_rx,
            phase,
        }
    }

    /// Extra producer for the control channel.
    pub fn control(&self) -> ControlSender {
        self.control_tx.clone()
    }

    /// Observe state transitions.
    pub fn phase(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    /// Run until shutdown completes.
    ///
    /// Returns `Ok(())` when shutdown was requested by the operating system
    /// and [`ServiceError::Software`] when a listener failed.
    pub async fn run(self) -> Result<(), ServiceError> {
        let Coordinator {
            config,
            control_tx,
            mut control_rx,
            phase,
        } = self;

        phase.send_replace(Phase::Starting);

        let signals = SignalSource::register().map_err(|e| {
            ServiceError::Software(format!("cannot register signal handlers: {e}"))
        })?;
        let forwarder = signals.forward(control_tx.clone());

        let mut active = Vec::with_capacity(2);
        if config.http.is_enabled() {
            active.push(ActiveListener::spawn(
                ListenerSpec::http(&config.http),
                control_tx.clone(),
            ));
        }
        if config.https.is_enabled() {
            active.push(ActiveListener::spawn(
                ListenerSpec::https(&config.https),
                control_tx.clone(),
            ));
        }
        drop(control_tx);

        // A listener that fails before binding reports on the control channel.
        let early = tokio::select! {
            bound = all_listening(&active) => {
                if bound {
                    phase.send_replace(Phase::Running);
                    tracing::debug!(listeners = active.len(), "running");
                }
                None
            }
            signal = control_rx.recv() => Some(signal),
        };
        let first = match early {
            Some(signal) => signal,
            None => control_rx.recv().await,
        };

        phase.send_replace(Phase::ShuttingDown);
        match first {
            Some(signal) => tracing::info!(%signal, "shutting down..."),
            None => tracing::error!("control channel closed, shutting down..."),
        }

        let escalation = tokio::spawn(watch_escalation(control_rx).in_current_span());

        let deadline = Instant::now() + config.service.shutdown_timeout;
        let aborts: Vec<_> = active.iter().map(ActiveListener::abort_handle).collect();
        let report = shutdown_all(deadline, active).await;
        for abort in aborts {
            abort.abort();
        }
        if report.is_clean() {
            tracing::debug!(stopped = report.stopped, "listeners stopped");
        } else {
            tracing::warn!(
                stopped = report.stopped,
                failed = report.failed,
                timed_out = report.timed_out,
                "listeners stopped uncleanly"
            );
        }

        forwarder.abort();
        escalation.abort();
        phase.send_replace(Phase::Terminated);

        match first {
            Some(signal) if signal.exit_code() == sysexits::OK => {
                tracing::info!("shutdown");
                Ok(())
            }
            Some(signal) => Err(ServiceError::Software(signal.to_string())),
            None => Err(ServiceError::Software("control channel closed".into())),
        }
    }
}

/// Wait until every listener accepts connections. `false` if any of them
/// failed to bind.
async fn all_listening(active: &[ActiveListener]) -> bool {
    join_all(active.iter().map(ActiveListener::local_addr))
        .await
        .iter()
        .all(Option::is_some)
}

/// Log a repeated termination request. The running shutdown is not affected.
async fn watch_escalation(mut control_rx: mpsc::UnboundedReceiver<ControlSignal>) {
    if let Some(signal) = control_rx.recv().await {
        tracing::error!(%signal, "terminating...");
    }
}
