//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::TcpListener;
use std::time::Duration;

use service_template::lifecycle::Phase;
use service_template::Config;
use tokio::sync::watch;

/// Reserve a port that is free right now.
pub fn free_port() -> u16 {
    let reserved = TcpListener::bind("127.0.0.1:0").unwrap();
    reserved.local_addr().unwrap().port()
}

/// A configuration with only the HTTP listener, bound to loopback.
pub fn http_config(port: u16) -> Config {
    let mut config = Config::default();
    config.service.name = "it".into();
    config.service.node = "test-node".into();
    config.service.shutdown_timeout = Duration::from_secs(2);
    config.http.host = "127.0.0.1".into();
    config.http.port = port;
    config
}

/// Wait for the coordinator to reach `target`.
pub async fn wait_for_phase(phase: &mut watch::Receiver<Phase>, target: Phase) {
    tokio::time::timeout(Duration::from_secs(5), phase.wait_for(|p| *p == target))
        .await
        .expect("phase not reached in time")
        .expect("coordinator dropped");
}

/// Poll until `addr` accepts TCP connections.
pub async fn wait_until_listening(port: u16) {
    for _ in 0..100 {
        if tokio::net::TcpStream::connect(("127.0.0.1", port)).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("port {port} never started listening");
}

/// Bound a test future.
pub async fn within<F: Future>(secs: u64, fut: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(secs), fut)
        .await
        .expect("timed out")
}
