//! Configuration loading from the environment.

use std::io;
use std::path::PathBuf;

use crate::config::env::{EnvSource, ProcessEnv};
use crate::config::schema::{
    Config, Environment, ListenerConfig, ServiceConfig, TlsListenerConfig, DEFAULT_HOST,
    DEFAULT_PORT, DEFAULT_SERVICE_NAME,
};
use crate::config::validation::{
    ensure_distinct_ports, file_exists, parse_bool, parse_environment, parse_port,
};
use crate::error::ServiceError;
use crate::security::Sensitive;

/// Read the `SERVICE_ENV` tag, defaulting to development.
///
/// Shared with the logger, which needs the tag before the full config loads.
pub fn load_environment(env: &impl EnvSource) -> Result<Environment, ServiceError> {
    match env.var("SERVICE_ENV") {
        Some(raw) => parse_environment(&raw),
        None => Ok(Environment::default()),
    }
}

/// `SERVICE_NAME` and `SERVICE_NODE`, the latter falling back to the host name.
pub fn load_identity<H>(env: &impl EnvSource, hostname: H) -> Result<(String, String), ServiceError>
where
    H: FnOnce() -> io::Result<String>,
{
    let name = env
        .var("SERVICE_NAME")
        .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string());

    let node = match env.var("SERVICE_NODE") {
        Some(node) => node,
        None => hostname().map_err(|_| ServiceError::Config("cannot determine host name".into()))?,
    };

    Ok((name, node))
}

/// Load and validate configuration.
///
/// `CERT_PATH` and `KEY_PATH` are removed from `env` once read, whether or
/// not they turn out to be valid.
pub fn load_config<E, H>(env: &mut E, hostname: H) -> Result<Config, ServiceError>
where
    E: EnvSource,
    H: FnOnce() -> io::Result<String>,
{
    let environment = load_environment(&*env)?;
    let (name, node) = load_identity(&*env, hostname)?;

    let log_requests = match env.var("LOG_REQUESTS") {
        Some(raw) => parse_bool("LOG_REQUESTS", &raw)?,
        None => false,
    };

    let host = env.var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

    let mut http_port = optional_port(&*env, "HTTP_PORT")?;
    let mut https_port = optional_port(&*env, "HTTPS_PORT")?;

    let cert_path = take_secret_path(env, "CERT_PATH")?;
    let key_path = take_secret_path(env, "KEY_PATH")?;

    let (cert_path, key_path) = match (https_port, cert_path, key_path) {
        (0, _, _) | (_, None, _) | (_, _, None) => {
            https_port = 0;
            (PathBuf::new(), PathBuf::new())
        }
        (_, Some(cert), Some(key)) => (cert, key),
    };

    if http_port == 0 && https_port == 0 {
        http_port = DEFAULT_PORT;
    }

    ensure_distinct_ports(http_port, https_port)?;

    let listener = |port| ListenerConfig {
        host: host.clone(),
        port,
        log_requests,
        ..ListenerConfig::default()
    };

    Ok(Config {
        service: ServiceConfig {
            name,
            node,
            environment,
            ..ServiceConfig::default()
        },
        http: listener(http_port),
        https: TlsListenerConfig {
            listener: listener(https_port),
            cert_path: Sensitive::new(cert_path),
            key_path: Sensitive::new(key_path),
        },
    })
}

impl Config {
    /// See [`load_config`].
    pub fn load<E, H>(env: &mut E, hostname: H) -> Result<Self, ServiceError>
    where
        E: EnvSource,
        H: FnOnce() -> io::Result<String>,
    {
        load_config(env, hostname)
    }

    /// Load from the process environment, using the OS host name.
    pub fn from_env() -> Result<Self, ServiceError> {
        Self::load(&mut ProcessEnv, || {
            hostname::get()?
                .into_string()
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "host name is not UTF-8"))
        })
    }
}

fn optional_port(env: &impl EnvSource, var: &str) -> Result<u16, ServiceError> {
    match env.var(var) {
        Some(raw) => parse_port(var, &raw),
        None => Ok(0),
    }
}

/// Read a secret path, unset it, and keep it only if the file exists.
fn take_secret_path(env: &mut impl EnvSource, var: &str) -> Result<Option<PathBuf>, ServiceError> {
    let raw = env.var(var);
    env.remove_var(var);

    let Some(raw) = raw else {
        return Ok(None);
    };
    let path = PathBuf::from(raw);
    if file_exists(var, &path)? {
        Ok(Some(path))
    } else {
        tracing::debug!(var, "secret path does not exist, ignoring");
        Ok(None)
    }
}
