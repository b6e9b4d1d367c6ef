//! Environment-based configuration.

use std::collections::HashMap;
use std::time::Duration;

use super::{LineEnding, SessionConfig};
use crate::error::{DriverError, Result};

/// Environment configuration prefix.
pub const DEFAULT_PREFIX: &str = "PTY_DRIVER";

/// Variable names understood by [`SessionConfig::apply_env`], without prefix.
pub mod vars {
    /// Idle timeout for `read`, in seconds.
    pub const TIMEOUT: &str = "TIMEOUT";
    /// Per-wake-up byte cap for `read`.
    pub const MAX_BYTES: &str = "MAX_BYTES";
    /// Total timeout for `expect`, in seconds.
    pub const EXPECT_TIMEOUT: &str = "EXPECT_TIMEOUT";
    /// Per-character echo wait for `type_in`, in seconds.
    pub const ECHO_TIMEOUT: &str = "ECHO_TIMEOUT";
    /// Attempt count for `send_and_expect_until`.
    pub const RETRY_LIMIT: &str = "RETRY_LIMIT";
    /// Pause between attempts, in seconds.
    pub const RETRY_INTERVAL: &str = "RETRY_INTERVAL";
    /// Initial debug mirror state.
    pub const DEBUG: &str = "DEBUG";
    /// Line ending: `lf`, `crlf` or `cr`.
    pub const LINE_ENDING: &str = "LINE_ENDING";
}

/// Environment variable reader.
///
/// Reads the process environment unless built with
/// [`EnvConfig::from_vars`], which pins the lookups to a fixed map.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// Prefix for environment variables.
    prefix: String,
    /// Fixed lookup table instead of the process environment.
    source: Option<HashMap<String, String>>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl EnvConfig {
    /// Create a new environment config reader.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            source: None,
        }
    }

    /// Create a reader over a fixed set of variables (full names).
    #[must_use]
    pub fn from_vars<I, K, V>(prefix: impl Into<String>, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            prefix: prefix.into(),
            source: Some(
                vars.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Build the full environment variable name.
    fn var_name(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_uppercase()
        } else {
            format!("{}_{}", self.prefix, name.to_uppercase())
        }
    }

    /// Get a string value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        let var_name = self.var_name(name);
        match &self.source {
            Some(vars) => vars.get(&var_name).cloned(),
            None => std::env::var(&var_name).ok(),
        }
    }

    /// Check if a variable is set.
    #[must_use]
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Get a parsed value; a set but unparseable value is an error.
    pub fn parse<T>(&self, name: &str) -> Result<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(name)
            .map(|raw| {
                raw.trim().parse().map_err(|e| {
                    DriverError::config(format!("{}={raw:?}: {e}", self.var_name(name)))
                })
            })
            .transpose()
    }

    /// Get a boolean value.
    #[must_use]
    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).map(|v| {
            matches!(
                v.to_lowercase().as_str(),
                "1" | "true" | "yes" | "on" | "enabled"
            )
        })
    }

    /// Get a duration in (possibly fractional) seconds.
    pub fn duration_secs(&self, name: &str) -> Result<Option<Duration>> {
        self.parse::<f64>(name)?
            .map(|secs| {
                Duration::try_from_secs_f64(secs).map_err(|e| {
                    DriverError::config(format!("{}={secs}: {e}", self.var_name(name)))
                })
            })
            .transpose()
    }
}

impl SessionConfig {
    /// Defaults overlaid with `PTY_DRIVER_*` variables from the environment.
    pub fn from_env() -> Result<Self> {
        Self::default().apply_env(&EnvConfig::default())
    }

    /// Overlay whatever `env` sets onto this configuration.
    pub fn apply_env(mut self, env: &EnvConfig) -> Result<Self> {
        if let Some(timeout) = env.duration_secs(vars::TIMEOUT)? {
            self.read_timeout = timeout;
        }
        if let Some(max) = env.parse::<usize>(vars::MAX_BYTES)? {
            self.max_read_bytes = max;
        }
        if let Some(timeout) = env.duration_secs(vars::EXPECT_TIMEOUT)? {
            self.expect_timeout = timeout;
        }
        if let Some(timeout) = env.duration_secs(vars::ECHO_TIMEOUT)? {
            self.echo_timeout = timeout;
        }
        if let Some(limit) = env.parse::<u32>(vars::RETRY_LIMIT)? {
            self.retry_limit = limit;
        }
        if let Some(interval) = env.duration_secs(vars::RETRY_INTERVAL)? {
            self.retry_interval = interval;
        }
        if let Some(debug) = env.bool(vars::DEBUG) {
            self.debug = debug;
        }
        if let Some(line_ending) = env.parse::<LineEnding>(vars::LINE_ENDING)? {
            self.line_ending = line_ending;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_config_prefix() {
        let config = EnvConfig::new("TEST");
        assert_eq!(config.var_name("foo"), "TEST_FOO");
        assert_eq!(config.var_name("bar_baz"), "TEST_BAR_BAZ");
    }

    #[test]
    fn env_config_no_prefix() {
        let config = EnvConfig::new("");
        assert_eq!(config.var_name("foo"), "FOO");
    }

    #[test]
    fn env_bool_parsing() {
        let config = EnvConfig::from_vars("T", [("T_ENABLED", "yes"), ("T_DISABLED", "off")]);
        assert_eq!(config.bool("ENABLED"), Some(true));
        assert_eq!(config.bool("DISABLED"), Some(false));
        assert_eq!(config.bool("MISSING"), None);
    }

    #[test]
    fn fractional_seconds() {
        let config = EnvConfig::from_vars("T", [("T_WAIT", "0.25")]);
        assert_eq!(
            config.duration_secs("WAIT").unwrap(),
            Some(Duration::from_millis(250))
        );
    }

    #[test]
    fn negative_duration_rejected() {
        let config = EnvConfig::from_vars("T", [("T_WAIT", "-1")]);
        assert!(config.duration_secs("WAIT").is_err());
    }

    #[test]
    fn overlay_onto_session_config() {
        let env = EnvConfig::from_vars(
            DEFAULT_PREFIX,
            [
                ("PTY_DRIVER_TIMEOUT", "0.5"),
                ("PTY_DRIVER_MAX_BYTES", "128"),
                ("PTY_DRIVER_RETRY_LIMIT", "4"),
                ("PTY_DRIVER_DEBUG", "1"),
                ("PTY_DRIVER_LINE_ENDING", "crlf"),
            ],
        );
        let config = SessionConfig::default().apply_env(&env).unwrap();

        assert_eq!(config.read_timeout, Duration::from_millis(500));
        assert_eq!(config.max_read_bytes, 128);
        assert_eq!(config.retry_limit, 4);
        assert!(config.debug);
        assert_eq!(config.line_ending, LineEnding::CrLf);
        assert_eq!(config.expect_timeout, super::super::DEFAULT_EXPECT_TIMEOUT);
    }

    #[test]
    fn bad_value_names_variable() {
        let env = EnvConfig::from_vars(DEFAULT_PREFIX, [("PTY_DRIVER_MAX_BYTES", "lots")]);
        let err = SessionConfig::default().apply_env(&env).unwrap_err();
        assert!(err.to_string().contains("PTY_DRIVER_MAX_BYTES"));
    }
}
