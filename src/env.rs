//! Environment lookup for configuration resolution.
//!
//! Resolution reads variables through [`EnvSource`] so tests can inject an
//! in-memory map instead of mutating the process environment.

use anyhow::{anyhow, Result};
use std::collections::HashMap;

/// A read-only view of environment variables.
pub trait EnvSource {
    /// Returns the raw value of `name`, or `None` when it is unset.
    fn var(&self, name: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl EnvSource for HashMap<&str, &str> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).map(|value| value.to_string())
    }
}

/// Returns the value of `name` unmodified, treating blank values as unset.
pub fn non_empty<E: EnvSource + ?Sized>(env: &E, name: &str) -> Option<String> {
    env.var(name).filter(|value| !value.trim().is_empty())
}

/// Reads `name` from `env` and parses it, falling back to `default` only when
/// the variable is absent.
///
/// A present but unparsable value, blank included, is an error naming the
/// variable and the `expected` type; it never silently degrades to the default.
pub fn resolve<E, T, F>(env: &E, name: &str, expected: &str, parse: F, default: T) -> Result<T>
where
    E: EnvSource + ?Sized,
    F: FnOnce(&str) -> Option<T>,
{
    match env.var(name) {
        Some(raw) => parse(raw.trim())
            .ok_or_else(|| anyhow!("{name} must be {expected}, got {raw:?}")),
        None => Ok(default),
    }
}
