//! Protocol listeners.
//!
//! # Responsibilities
//! - Resolve the configured host and bind the port
//! - Serve the router over plain TCP or TLS
//! - Apply connection-level timeouts (header read, idle)
//! - Report unexpected bind/serve failures on the control channel
//! - Drain and stop on request

use std::fmt;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use axum_server::accept::DefaultAcceptor;
use axum_server::tls_rustls::RustlsAcceptor;
use axum_server::Handle;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use hyper_util::server::conn::auto::Builder;
use thiserror::Error;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::Instrument;

use crate::config::{ListenerConfig, TlsListenerConfig};
use crate::http::build_router;
use crate::lifecycle::shutdown::{StopError, Stoppable};
use crate::lifecycle::signals::{ControlSender, ControlSignal};
use crate::net::idle::IdleTimeoutAcceptor;
use crate::net::tls::{load_tls_config, TlsError};
use crate::security::Sensitive;

/// Protocol served by a listener. Used as the `handler` tag in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    Http,
    Https,
}

impl ListenerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListenerKind::Http => "http",
            ListenerKind::Https => "https",
        }
    }
}

impl fmt::Display for ListenerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Host name resolution failed.
    #[error("cannot resolve {addr}: {source}")]
    Resolve {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Resolution succeeded but returned nothing.
    #[error("no address found for {0}")]
    NoAddress(String),

    /// Certificate or key could not be loaded.
    #[error(transparent)]
    Tls(#[from] TlsError),

    /// Bind or accept failed.
    #[error("failed to serve on {addr}: {source}")]
    Serve {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

#[derive(Clone)]
struct TlsMaterial {
    cert_path: Sensitive<PathBuf>,
    key_path: Sensitive<PathBuf>,
}

/// Everything needed to start one listener.
#[derive(Clone)]
pub struct ListenerSpec {
    kind: ListenerKind,
    config: ListenerConfig,
    tls: Option<TlsMaterial>,
}

impl ListenerSpec {
    pub fn http(config: &ListenerConfig) -> Self {
        Self {
            kind: ListenerKind::Http,
            config: config.clone(),
            tls: None,
        }
    }

    pub fn https(config: &TlsListenerConfig) -> Self {
        Self {
            kind: ListenerKind::Https,
            config: config.listener.clone(),
            tls: Some(TlsMaterial {
                cert_path: config.cert_path.clone(),
                key_path: config.key_path.clone(),
            }),
        }
    }

    pub fn kind(&self) -> ListenerKind {
        self.kind
    }

    pub fn addr(&self) -> String {
        self.config.addr()
    }
}

/// Bind and serve until `handle` requests shutdown.
///
/// Returns `Ok(())` after an orderly shutdown; any error means the listener
/// died on its own.
pub async fn serve(spec: ListenerSpec, handle: Handle) -> Result<(), ListenerError> {
    let addr = resolve(&spec.config).await?;
    let app = build_router(spec.kind, &spec.config).into_make_service();

    tracing::info!(
        read_timeout = ?spec.config.read_timeout,
        write_timeout = ?spec.config.write_timeout,
        handler_timeout = ?spec.config.handler_timeout,
        idle_timeout = ?spec.config.idle_timeout,
        "Listen local: {}://{}",
        spec.kind,
        spec.config.addr()
    );

    let idle = IdleTimeoutAcceptor::new(DefaultAcceptor::new(), spec.config.idle_timeout);
    let result = match &spec.tls {
        None => {
            let mut server = axum_server::bind(addr).acceptor(idle).handle(handle);
            apply_timeouts(server.http_builder(), &spec.config);
            server.serve(app).await
        }
        Some(tls) => {
            let tls_config = load_tls_config(tls.cert_path.expose(), tls.key_path.expose())?;
            let acceptor = RustlsAcceptor::new(tls_config).acceptor(idle);
            let mut server = axum_server::bind(addr).acceptor(acceptor).handle(handle);
            apply_timeouts(server.http_builder(), &spec.config);
            server.serve(app).await
        }
    };

    result.map_err(|source| ListenerError::Serve { addr, source })
}

/// Header read limit for HTTP/1. Idle connections of both protocols are
/// closed by [`IdleTimeoutAcceptor`].
fn apply_timeouts(builder: &mut Builder<TokioExecutor>, config: &ListenerConfig) {
    builder
        .http1()
        .timer(TokioTimer::new())
        .header_read_timeout(config.read_timeout);
    builder.http2().timer(TokioTimer::new());
}

async fn resolve(config: &ListenerConfig) -> Result<SocketAddr, ListenerError> {
    let addr = config.addr();
    let mut addrs = tokio::net::lookup_host(addr.clone())
        .await
        .map_err(|source| ListenerError::Resolve {
            addr: addr.clone(),
            source,
        })?;
    addrs.next().ok_or(ListenerError::NoAddress(addr))
}

/// A listener task that has been started.
pub struct ActiveListener {
    kind: ListenerKind,
    addr: String,
    handle: Handle,
    task: JoinHandle<()>,
}

impl ActiveListener {
    /// Spawn the serving task.
    ///
    /// If the task fails for any reason other than an orderly shutdown it
    /// logs the error and posts [`ControlSignal::ListenerFailed`].
    pub fn spawn(spec: ListenerSpec, control: ControlSender) -> Self {
        let kind = spec.kind;
        let addr = spec.addr();
        let handle = Handle::new();
        let span = tracing::info_span!("listener", handler = %kind);

        let task = tokio::spawn(
            {
                let handle = handle.clone();
                async move {
                    match serve(spec, handle).await {
                        Ok(()) => tracing::debug!("listener closed"),
                        Err(e) => {
                            tracing::error!(error = %e, "listener failed");
                            // The coordinator may already be shutting down.
                            let _ = control.send(ControlSignal::ListenerFailed(kind));
                        }
                    }
                }
            }
            .instrument(span),
        );

        Self {
            kind,
            addr,
            handle,
            task,
        }
    }

    pub fn kind(&self) -> ListenerKind {
        self.kind
    }

    /// Bound address, once the listener is accepting connections.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.handle.listening().await
    }

    /// Handle for forcibly cancelling the task after the shutdown deadline.
    pub fn abort_handle(&self) -> AbortHandle {
        self.task.abort_handle()
    }
}

impl Stoppable for ActiveListener {
    fn label(&self) -> String {
        format!("{}://{}", self.kind, self.addr)
    }

    fn stop(self, grace: Duration) -> impl Future<Output = Result<(), StopError>> + Send {
        async move {
            tracing::debug!(
                handler = %self.kind,
                connections = self.handle.connection_count(),
                "draining connections"
            );
            self.handle.graceful_shutdown(Some(grace));

            match self.task.await {
                Ok(()) => Ok(()),
                // Already gone; nothing left to stop.
                Err(e) if e.is_cancelled() => Ok(()),
                Err(e) => Err(StopError::Panicked(e.to_string())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::signals::control_channel;

    fn http_config(port: u16) -> ListenerConfig {
        ListenerConfig {
            host: "127.0.0.1".into(),
            port,
            ..ListenerConfig::default()
        }
    }

    #[test]
    fn kind_tags() {
        assert_eq!(ListenerKind::Http.to_string(), "http");
        assert_eq!(ListenerKind::Https.to_string(), "https");
    }

    #[tokio::test]
    async fn bind_conflict_posts_listener_failed() {
        let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = occupied.local_addr().unwrap().port();

        let (tx, mut rx) = control_channel();
        let listener = ActiveListener::spawn(ListenerSpec::http(&http_config(port)), tx);

        let signal = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap();
        assert_eq!(signal, Some(ControlSignal::ListenerFailed(ListenerKind::Http)));

        // The task has already exited; stopping it is not an error.
        listener.stop(Duration::from_millis(100)).await.unwrap();
    }

    #[tokio::test]
    async fn graceful_stop_is_clean() {
        let port = {
            let reserved = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            reserved.local_addr().unwrap().port()
        };

        let (tx, mut rx) = control_channel();
        let listener = ActiveListener::spawn(ListenerSpec::http(&http_config(port)), tx);
        let addr = listener.local_addr().await.unwrap();
        assert_eq!(addr.port(), port);

        listener.stop(Duration::from_secs(1)).await.unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn idle_keep_alive_connection_is_closed() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let port = {
            let reserved = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            reserved.local_addr().unwrap().port()
        };
        let config = ListenerConfig {
            idle_timeout: Duration::from_millis(300),
            ..http_config(port)
        };
        let (tx, _rx) = control_channel();
        let listener = ActiveListener::spawn(ListenerSpec::http(&config), tx);
        listener.local_addr().await.unwrap();

        let mut stream = tokio::net::TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        stream
            .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();

        let mut response = Vec::new();
        let mut buf = [0u8; 1024];
        while !String::from_utf8_lossy(&response).contains("</h1>") {
            let n = stream.read(&mut buf).await.unwrap();
            assert!(n > 0, "connection closed before the response");
            response.extend_from_slice(&buf[..n]);
        }
        assert!(String::from_utf8_lossy(&response).starts_with("HTTP/1.1 200 OK"));

        // Kept alive, then dropped by the server once idle.
        let closed = tokio::time::timeout(Duration::from_secs(3), stream.read(&mut buf))
            .await
            .expect("idle connection was not closed");
        assert!(matches!(closed, Ok(0) | Err(_)), "{closed:?}");

        listener.stop(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn unreadable_tls_material_is_a_listener_failure() {
        let dir = tempfile::tempdir().unwrap();
        let cert = dir.path().join("cert.pem");
        std::fs::write(&cert, b"garbage").unwrap();

        let config = TlsListenerConfig {
            listener: http_config(1),
            cert_path: Sensitive::new(cert.clone()),
            key_path: Sensitive::new(cert),
        };
        let (tx, mut rx) = control_channel();
        let _listener = ActiveListener::spawn(ListenerSpec::https(&config), tx);

        let signal = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap();
        assert_eq!(signal, Some(ControlSignal::ListenerFailed(ListenerKind::Https)));
    }
}
