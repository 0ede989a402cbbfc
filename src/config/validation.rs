//! Configuration validation.
//!
//! # Responsibilities
//! - Validate the environment tag against the fixed set
//! - Parse booleans and ports, checking the 1–65535 range
//! - Check secret file paths on disk
//!
//! # Design Decisions
//! - Each check is a pure function returning the classified error
//! - Messages name the offending variable and echo its raw value

use std::io;
use std::path::Path;

use crate::config::schema::Environment;
use crate::error::ServiceError;

/// Validate `SERVICE_ENV`, normalizing to lowercase.
pub fn parse_environment(raw: &str) -> Result<Environment, ServiceError> {
    raw.parse().map_err(|_| {
        let allowed: Vec<&str> = Environment::ALL.iter().map(Environment::as_str).collect();
        ServiceError::Usage(format!(
            "invalid value {raw:?} for SERVICE_ENV: must be one of {}",
            allowed.join(",")
        ))
    })
}

/// Parse a boolean flag. Accepts 1, t, T, TRUE, true, True and their false
/// counterparts.
pub fn parse_bool(var: &str, raw: &str) -> Result<bool, ServiceError> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(ServiceError::Usage(format!("invalid value {raw:?} for {var}"))),
    }
}

/// Parse a TCP port in the range 1–65535.
pub fn parse_port(var: &str, raw: &str) -> Result<u16, ServiceError> {
    let port: i64 = raw
        .parse()
        .map_err(|_| ServiceError::Usage(format!("invalid value {raw:?} for {var}: parse error")))?;

    if !(1..=65535).contains(&port) {
        return Err(ServiceError::Usage(format!(
            "invalid value {port} for {var}: must be between 1 and 65535"
        )));
    }

    Ok(port as u16)
}

/// Whether a secret file exists.
///
/// A missing file is not an error: the caller disables the feature that
/// needs it. Any other failure to stat the path is a usage error.
pub fn file_exists(var: &str, path: &Path) -> Result<bool, ServiceError> {
    match std::fs::metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        // The path itself is secret and stays out of the message.
        Err(e) => Err(ServiceError::Usage(format!("cannot access {var}: {e}"))),
    }
}

/// HTTP and HTTPS must not share a port.
pub fn ensure_distinct_ports(http: u16, https: u16) -> Result<(), ServiceError> {
    if http == https {
        return Err(ServiceError::Usage(format!(
            "HTTP_PORT {http} equal to HTTPS_PORT {https}"
        )));
    }
    Ok(())
}
