//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive `Serialize` so the effective configuration can be logged;
//! secret fields serialize as `[REDACTED]`.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::security::Sensitive;

/// Service name used when `SERVICE_NAME` is unset.
pub const DEFAULT_SERVICE_NAME: &str = "service-template";
/// Bind host used when `HOST` is unset.
pub const DEFAULT_HOST: &str = "localhost";
/// HTTP port used when neither `HTTP_PORT` nor HTTPS resolves.
pub const DEFAULT_PORT: u16 = 3000;

/// Root configuration for the service.
#[derive(Debug, Clone, Serialize, Default)]
pub struct Config {
    /// Identity and shutdown settings.
    pub service: ServiceConfig,

    /// Plain HTTP listener. Disabled when `port` is 0.
    pub http: ListenerConfig,

    /// TLS listener. Disabled when `port` is 0.
    pub https: TlsListenerConfig,
}

/// Deployment environment tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// All accepted values, in their canonical lowercase form.
    pub const ALL: [Environment; 2] = [Environment::Development, Environment::Production];

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ();

    /// Case-insensitive match against [`Environment::ALL`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Environment::ALL
            .into_iter()
            .find(|env| env.as_str() == lower)
            .ok_or(())
    }
}

/// Service identity and process-wide settings.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceConfig {
    /// Service name reported in every log record.
    pub name: String,

    /// Node identifier, defaults to the host name.
    pub node: String,

    /// Deployment environment.
    pub environment: Environment,

    /// Upper bound for the graceful shutdown of all listeners.
    #[serde(with = "duration_secs")]
    pub shutdown_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_SERVICE_NAME.to_string(),
            node: String::new(),
            environment: Environment::default(),
            shutdown_timeout: Duration::from_secs(60),
        }
    }
}

/// Listener configuration shared by both protocols.
#[derive(Debug, Clone, Serialize)]
pub struct ListenerConfig {
    /// Host name or IP address to bind.
    pub host: String,

    /// TCP port, 0 when the listener is disabled.
    pub port: u16,

    /// Time allowed to read request headers.
    #[serde(with = "duration_secs")]
    pub read_timeout: Duration,

    /// Time allowed to write a response.
    #[serde(with = "duration_secs")]
    pub write_timeout: Duration,

    /// Hard limit on a single request's handler, must be below `write_timeout`.
    #[serde(with = "duration_secs")]
    pub handler_timeout: Duration,

    /// Keep-alive idle limit.
    #[serde(with = "duration_secs")]
    pub idle_timeout: Duration,

    /// Emit a DEBUG record per request.
    pub log_requests: bool,
}

impl ListenerConfig {
    pub fn is_enabled(&self) -> bool {
        self.port != 0
    }

    /// `host:port`, with IPv6 literals bracketed.
    pub fn addr(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

// https://blog.cloudflare.com/the-complete-guide-to-golang-net-http-timeouts/
impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: 0,
            read_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(10),
            handler_timeout: Duration::from_secs(9),
            idle_timeout: Duration::from_secs(30),
            log_requests: false,
        }
    }
}

/// TLS listener configuration.
#[derive(Debug, Clone, Serialize, Default)]
pub struct TlsListenerConfig {
    #[serde(flatten)]
    pub listener: ListenerConfig,

    /// PEM certificate chain.
    pub cert_path: Sensitive<PathBuf>,

    /// PEM private key.
    pub key_path: Sensitive<PathBuf>,
}

impl TlsListenerConfig {
    pub fn is_enabled(&self) -> bool {
        self.listener.is_enabled()
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parses_case_insensitively() {
        assert_eq!("Production".parse::<Environment>(), Ok(Environment::Production));
        assert_eq!("production".parse::<Environment>(), Ok(Environment::Production));
        assert_eq!("DEVELOPMENT".parse::<Environment>(), Ok(Environment::Development));
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn addr_brackets_ipv6() {
        let mut cfg = ListenerConfig {
            port: 8443,
            ..ListenerConfig::default()
        };
        assert_eq!(cfg.addr(), "localhost:8443");

        cfg.host = "::1".into();
        assert_eq!(cfg.addr(), "[::1]:8443");
    }

    #[test]
    fn serialized_config_redacts_tls_paths() {
        let mut cfg = Config::default();
        cfg.https.cert_path = Sensitive::new(PathBuf::from("/run/secrets/cert.pem"));
        cfg.https.key_path = Sensitive::new(PathBuf::from("/run/secrets/key.pem"));

        let json = serde_json::to_value(&cfg).unwrap();
        assert_eq!(json["https"]["cert_path"], "[REDACTED]");
        assert_eq!(json["https"]["key_path"], "[REDACTED]");
        assert_eq!(json["https"]["read_timeout"], 5.0);
        assert_eq!(json["service"]["environment"], "development");
        assert!(!json.to_string().contains("/run/secrets"));
    }
}
