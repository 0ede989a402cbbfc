//! Access to environment variables.

use std::collections::HashMap;

/// Read and unset environment variables.
///
/// The loader is written against this trait so tests can run against an
/// in-memory map instead of the process environment.
pub trait EnvSource {
    /// Value of `key`, or `None` when unset or empty.
    fn var(&self, key: &str) -> Option<String>;

    /// Remove `key`. Best effort: failures are ignored.
    fn remove_var(&mut self, key: &str);
}

/// The real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }

    fn remove_var(&mut self, key: &str) {
        // Only called from the main thread before the runtime spawns listeners.
        std::env::remove_var(key);
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).filter(|v| !v.is_empty()).cloned()
    }

    fn remove_var(&mut self, key: &str) {
        self.remove(key);
    }
}
