//! File-based configuration loading.
//!
//! ```toml
//! read_timeout = 2.0      # seconds, fractional allowed
//! max_read_bytes = 4096
//! expect_timeout = 10
//! echo_timeout = 1
//! retry_limit = 3
//! retry_interval = 0.5
//! line_ending = "crlf"
//! debug = false
//! ```
//!
//! Every key is optional; missing keys keep their defaults.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{LineEnding, SessionConfig};
use crate::error::{DriverError, Result};

/// On-disk shape of a [`SessionConfig`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Idle timeout for `read`.
    #[serde(default, with = "secs", skip_serializing_if = "Option::is_none")]
    pub read_timeout: Option<Duration>,

    /// Per-wake-up byte cap for `read`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_read_bytes: Option<usize>,

    /// Total timeout for `expect`.
    #[serde(default, with = "secs", skip_serializing_if = "Option::is_none")]
    pub expect_timeout: Option<Duration>,

    /// Per-character echo wait for `type_in`.
    #[serde(default, with = "secs", skip_serializing_if = "Option::is_none")]
    pub echo_timeout: Option<Duration>,

    /// Attempt count for `send_and_expect_until`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_limit: Option<u32>,

    /// Pause between attempts.
    #[serde(default, with = "secs", skip_serializing_if = "Option::is_none")]
    pub retry_interval: Option<Duration>,

    /// Terminator appended by `write_line`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_ending: Option<LineEnding>,

    /// Initial debug mirror state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
}

impl FileConfig {
    /// Overlay the keys present in this file onto `base`.
    #[must_use]
    pub fn apply(&self, mut base: SessionConfig) -> SessionConfig {
        if let Some(v) = self.read_timeout {
            base.read_timeout = v;
        }
        if let Some(v) = self.max_read_bytes {
            base.max_read_bytes = v;
        }
        if let Some(v) = self.expect_timeout {
            base.expect_timeout = v;
        }
        if let Some(v) = self.echo_timeout {
            base.echo_timeout = v;
        }
        if let Some(v) = self.retry_limit {
            base.retry_limit = v;
        }
        if let Some(v) = self.retry_interval {
            base.retry_interval = v;
        }
        if let Some(v) = self.line_ending {
            base.line_ending = v;
        }
        if let Some(v) = self.debug {
            base.debug = v;
        }
        base
    }
}

impl From<&SessionConfig> for FileConfig {
    fn from(config: &SessionConfig) -> Self {
        Self {
            read_timeout: Some(config.read_timeout),
            max_read_bytes: Some(config.max_read_bytes),
            expect_timeout: Some(config.expect_timeout),
            echo_timeout: Some(config.echo_timeout),
            retry_limit: Some(config.retry_limit),
            retry_interval: Some(config.retry_interval),
            line_ending: Some(config.line_ending),
            debug: Some(config.debug),
        }
    }
}

impl SessionConfig {
    /// Parse a TOML document over the defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let file: FileConfig =
            toml::from_str(source).map_err(|e| DriverError::config(e.to_string()))?;
        Ok(file.apply(Self::default()))
    }

    /// Load a TOML file over the defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = DriverError::with_io_context(
            std::fs::read_to_string(path),
            format!("reading config file {}", path.display()),
        )?;
        Self::from_toml_str(&source)
            .map_err(|e| DriverError::config(format!("{}: {e}", path.display())))
    }

    /// Load a TOML file, then overlay `PTY_DRIVER_*` environment variables.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_file(path)?.apply_env(&super::env::EnvConfig::default())
    }

    /// Render as a TOML document.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(&FileConfig::from(self)).map_err(|e| DriverError::config(e.to_string()))
    }
}

/// Durations as fractional seconds.
mod secs {
    use super::{Deserialize, Deserializer, Duration, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_f64(d.as_secs_f64()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let Some(secs) = Option::<f64>::deserialize(d)? else {
            return Ok(None);
        };
        Duration::try_from_secs_f64(secs)
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("invalid duration {secs}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(SessionConfig::from_toml_str("").unwrap(), SessionConfig::default());
    }

    #[test]
    fn parses_every_key() {
        let config = SessionConfig::from_toml_str(
            r#"
            read_timeout = 0.5
            max_read_bytes = 64
            expect_timeout = 3
            echo_timeout = 0.1
            retry_limit = 5
            retry_interval = 2.5
            line_ending = "crlf"
            debug = true
            "#,
        )
        .unwrap();

        assert_eq!(config.read_timeout, Duration::from_millis(500));
        assert_eq!(config.max_read_bytes, 64);
        assert_eq!(config.expect_timeout, Duration::from_secs(3));
        assert_eq!(config.echo_timeout, Duration::from_millis(100));
        assert_eq!(config.retry_limit, 5);
        assert_eq!(config.retry_interval, Duration::from_millis(2500));
        assert_eq!(config.line_ending, LineEnding::CrLf);
        assert!(config.debug);
    }

    #[test]
    fn unknown_key_rejected() {
        let err = SessionConfig::from_toml_str("colour = true").unwrap_err();
        assert!(matches!(err, DriverError::Config { .. }));
    }

    #[test]
    fn negative_duration_rejected() {
        assert!(SessionConfig::from_toml_str("read_timeout = -1.0").is_err());
    }

    #[test]
    fn render_and_reparse() {
        let config = SessionConfig::default()
            .retry_limit(7)
            .read_timeout(Duration::from_millis(250));
        let text = config.to_toml_string().unwrap();
        assert_eq!(SessionConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn missing_file_has_context() {
        let err = SessionConfig::from_file("/no/such/pty-driver.toml").unwrap_err();
        assert!(err.to_string().contains("reading config file"));
    }
}
