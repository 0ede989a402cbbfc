//! Structured logging.
//!
//! # Responsibilities
//! - Parse `LOG_LEVEL`
//! - Build the subscriber for the deployment environment
//! - Provide the root `service` span carrying identity fields
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, human-readable format with source
//!   locations for development
//! - The subscriber is built explicitly and returned as a `Dispatch`;
//!   installing it is the binary's decision

use std::time::Duration;

use tracing::level_filters::LevelFilter;
use tracing::{Dispatch, Span};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

use crate::config::{Environment, ServiceConfig};
use crate::error::ServiceError;

/// Level used when `LOG_LEVEL` is unset.
pub const DEFAULT_LOG_LEVEL: &str = "INFO";

/// Parse a `LOG_LEVEL` value, case-insensitively.
pub fn parse_level(raw: Option<&str>) -> Result<LevelFilter, ServiceError> {
    let raw = raw.unwrap_or(DEFAULT_LOG_LEVEL);
    match raw.to_ascii_uppercase().as_str() {
        "TRACE" => Ok(LevelFilter::TRACE),
        "DEBUG" => Ok(LevelFilter::DEBUG),
        "INFO" => Ok(LevelFilter::INFO),
        "WARN" => Ok(LevelFilter::WARN),
        "ERROR" => Ok(LevelFilter::ERROR),
        _ => Err(ServiceError::Config(format!("invalid value {raw:?} for LOG_LEVEL"))),
    }
}

/// Build a subscriber writing to `writer`.
pub fn build<W>(level: LevelFilter, environment: Environment, writer: W) -> Dispatch
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let filter =
        EnvFilter::builder().parse_lossy(format!("{level},h2=warn,hyper=warn,hyper_util=warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer);

    match environment {
        Environment::Development => Dispatch::new(
            builder
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .finish(),
        ),
        Environment::Production => Dispatch::new(
            builder
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .finish(),
        ),
    }
}

/// Root span attached to everything the service logs.
pub fn service_span(service: &ServiceConfig, version: &str) -> Span {
    tracing::info_span!(
        "service",
        service.name = %service.name,
        service.node = %service.node,
        service.env = %service.environment,
        service.version = version,
    )
}

/// ISO-8601 duration, truncated to milliseconds (`PT1.234S`, `PT2M3.5S`).
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let seconds = (total_ms / 1000) % 60;
    let millis = total_ms % 1000;

    let mut out = String::from("PT");
    if hours > 0 {
        out.push_str(&format!("{hours}H"));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}M"));
    }
    if millis > 0 {
        let fraction = format!("{millis:03}");
        out.push_str(&format!("{seconds}.{}S", fraction.trim_end_matches('0')));
    } else if seconds > 0 || out.len() == 2 {
        out.push_str(&format!("{seconds}S"));
    }
    out
}
