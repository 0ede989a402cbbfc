//! Process-level error taxonomy and `sysexits(3)` exit codes.

use std::process::ExitCode;

use thiserror::Error;

/// Exit codes from `sysexits.h`.
pub mod sysexits {
    /// Successful termination.
    pub const OK: u8 = 0;
    /// Command was used incorrectly (bad flag, malformed environment value).
    pub const USAGE: u8 = 64;
    /// Internal software error (a listener died while serving).
    pub const SOFTWARE: u8 = 70;
    /// Something was found in an unconfigured or misconfigured state.
    pub const CONFIG: u8 = 78;
}

/// Errors that terminate the process with a specific exit code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Malformed or out-of-range input from the environment or command line.
    #[error("{0}")]
    Usage(String),

    /// The host environment cannot support the requested configuration.
    #[error("{0}")]
    Config(String),

    /// Internal failure after startup.
    #[error("{0}")]
    Software(String),
}

impl ServiceError {
    /// The `sysexits` code this error maps to.
    pub fn code(&self) -> u8 {
        match self {
            ServiceError::Usage(_) => sysexits::USAGE,
            ServiceError::Config(_) => sysexits::CONFIG,
            ServiceError::Software(_) => sysexits::SOFTWARE,
        }
    }

    /// Whether the error is reported on stderr instead of through the logger.
    ///
    /// Usage and configuration errors happen before logging is useful.
    pub fn is_startup_error(&self) -> bool {
        matches!(self, ServiceError::Usage(_) | ServiceError::Config(_))
    }
}

impl From<ServiceError> for ExitCode {
    fn from(err: ServiceError) -> Self {
        ExitCode::from(err.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_sysexits() {
        assert_eq!(ServiceError::Usage("x".into()).code(), 64);
        assert_eq!(ServiceError::Software("x".into()).code(), 70);
        assert_eq!(ServiceError::Config("x".into()).code(), 78);
    }

    #[test]
    fn message_is_shown_verbatim() {
        let err = ServiceError::Usage("HTTP_PORT 3000 equal to HTTPS_PORT 3000".into());
        assert_eq!(err.to_string(), "HTTP_PORT 3000 equal to HTTPS_PORT 3000");
    }

    #[test]
    fn software_errors_are_logged_not_printed() {
        assert!(ServiceError::Usage(String::new()).is_startup_error());
        assert!(ServiceError::Config(String::new()).is_startup_error());
        assert!(!ServiceError::Software(String::new()).is_startup_error());
    }
}
