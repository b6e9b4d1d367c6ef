//! Configuration types for pty-driver.
//!
//! [`SessionConfig`] carries the per-session defaults every operation falls
//! back to. It can be built in code, read from the environment
//! ([`env`]) or loaded from a TOML file ([`file`]). The option structs
//! ([`ReadOptions`], [`ExpectOptions`], [`SendOptions`], [`RetryOptions`])
//! are the per-call knobs; their `Default`s are the library-wide constants,
//! and a session hands out config-derived ones through
//! [`Session::read_options`](crate::Session::read_options) and friends.

pub mod env;
pub mod file;

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::DriverError;

/// Default idle timeout for `read` (2 seconds).
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(2);

/// Default maximum bytes taken per readiness wake-up in `read`.
pub const DEFAULT_MAX_READ_BYTES: usize = 4096;

/// Default total timeout for `expect` (10 seconds).
pub const DEFAULT_EXPECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default per-character echo wait in `type_in` (1 second).
pub const DEFAULT_ECHO_TIMEOUT: Duration = Duration::from_secs(1);

/// Default attempt count for `send_and_expect_until`.
pub const DEFAULT_RETRY_LIMIT: u32 = 1;

/// Default pause between attempts in `send_and_expect_until` (10 seconds).
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(10);

/// Session-wide defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Idle timeout for `read`.
    pub read_timeout: Duration,

    /// Maximum bytes taken per readiness wake-up in `read`.
    pub max_read_bytes: usize,

    /// Total timeout for `expect` and the prompt-driven operations.
    pub expect_timeout: Duration,

    /// How long `type_in` waits for each character's echo.
    pub echo_timeout: Duration,

    /// Attempt count for `send_and_expect_until`.
    pub retry_limit: u32,

    /// Pause between attempts in `send_and_expect_until`.
    pub retry_interval: Duration,

    /// Terminator appended by `write_line`.
    pub line_ending: LineEnding,

    /// Initial state of the debug mirror.
    pub debug: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT,
            max_read_bytes: DEFAULT_MAX_READ_BYTES,
            expect_timeout: DEFAULT_EXPECT_TIMEOUT,
            echo_timeout: DEFAULT_ECHO_TIMEOUT,
            retry_limit: DEFAULT_RETRY_LIMIT,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            line_ending: LineEnding::default(),
            debug: false,
        }
    }
}

impl SessionConfig {
    /// Create a configuration with the default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the idle timeout for `read`.
    #[must_use]
    pub const fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the per-wake-up byte cap for `read`.
    #[must_use]
    pub const fn max_read_bytes(mut self, max: usize) -> Self {
        self.max_read_bytes = max;
        self
    }

    /// Set the total timeout for `expect`.
    #[must_use]
    pub const fn expect_timeout(mut self, timeout: Duration) -> Self {
        self.expect_timeout = timeout;
        self
    }

    /// Set the per-character echo wait for `type_in`.
    #[must_use]
    pub const fn echo_timeout(mut self, timeout: Duration) -> Self {
        self.echo_timeout = timeout;
        self
    }

    /// Set the attempt count for `send_and_expect_until`.
    #[must_use]
    pub const fn retry_limit(mut self, limit: u32) -> Self {
        self.retry_limit = limit;
        self
    }

    /// Set the pause between attempts.
    #[must_use]
    pub const fn retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Set the line ending style.
    #[must_use]
    pub const fn line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Set the initial debug mirror state.
    #[must_use]
    pub const fn debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    /// Defaults for `read` and `type_in`.
    #[must_use]
    pub const fn read_options(&self) -> ReadOptions {
        ReadOptions {
            timeout: self.read_timeout,
            max_bytes: self.max_read_bytes,
        }
    }

    /// Defaults for `expect`.
    #[must_use]
    pub const fn expect_options(&self) -> ExpectOptions {
        ExpectOptions {
            timeout: self.expect_timeout,
        }
    }

    /// Defaults for `send_and_expect`.
    #[must_use]
    pub const fn send_options(&self) -> SendOptions {
        SendOptions {
            timeout: self.expect_timeout,
            keep_prompt: false,
        }
    }

    /// Defaults for `send_and_expect_until`.
    #[must_use]
    pub const fn retry_options(&self) -> RetryOptions {
        RetryOptions {
            limit: self.retry_limit,
            interval: self.retry_interval,
            timeout: self.expect_timeout,
        }
    }
}

/// Line ending style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    /// Unix-style line ending (LF).
    #[default]
    Lf,

    /// Windows-style line ending (CRLF).
    CrLf,

    /// Classic Mac line ending (CR).
    Cr,
}

impl LineEnding {
    /// Get the line ending as a string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
            Self::Cr => "\r",
        }
    }

    /// Get the line ending as bytes.
    #[must_use]
    pub const fn as_bytes(self) -> &'static [u8] {
        self.as_str().as_bytes()
    }
}

impl FromStr for LineEnding {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "\n" => return Ok(Self::Lf),
            "\r\n" => return Ok(Self::CrLf),
            "\r" => return Ok(Self::Cr),
            _ => {}
        }
        match s.trim().to_ascii_lowercase().as_str() {
            "lf" => Ok(Self::Lf),
            "crlf" => Ok(Self::CrLf),
            "cr" => Ok(Self::Cr),
            other => Err(DriverError::config(format!(
                "unknown line ending '{other}' (expected lf, crlf or cr)"
            ))),
        }
    }
}

/// Options for `read` and the stale-input flush in `type_in`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// How long to wait for more input before returning.
    pub timeout: Duration,
    /// Maximum bytes taken per wake-up.
    pub max_bytes: usize,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_READ_TIMEOUT,
            max_bytes: DEFAULT_MAX_READ_BYTES,
        }
    }
}

impl ReadOptions {
    /// Set the idle timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the per-wake-up byte cap.
    #[must_use]
    pub const fn max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }
}

/// Options for `expect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectOptions {
    /// Total time allowed, measured from the start of the call.
    pub timeout: Duration,
}

impl Default for ExpectOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_EXPECT_TIMEOUT,
        }
    }
}

impl ExpectOptions {
    /// Set the total timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Options for `send_and_expect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendOptions {
    /// Total time allowed for the prompt to reappear.
    pub timeout: Duration,
    /// Leave the trailing prompt in the returned text.
    pub keep_prompt: bool,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_EXPECT_TIMEOUT,
            keep_prompt: false,
        }
    }
}

impl SendOptions {
    /// Set the total timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Keep or strip the trailing prompt.
    #[must_use]
    pub const fn keep_prompt(mut self, keep: bool) -> Self {
        self.keep_prompt = keep;
        self
    }
}

/// Options for `send_and_expect_until`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryOptions {
    /// Maximum number of attempts.
    pub limit: u32,
    /// Pause between attempts.
    pub interval: Duration,
    /// Per-attempt timeout for the prompt to reappear.
    pub timeout: Duration,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_RETRY_LIMIT,
            interval: DEFAULT_RETRY_INTERVAL,
            timeout: DEFAULT_EXPECT_TIMEOUT,
        }
    }
}

impl RetryOptions {
    /// Set the attempt count.
    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Set the pause between attempts.
    #[must_use]
    pub const fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the per-attempt timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The `send_and_expect` options used for each attempt.
    #[must_use]
    pub const fn send_options(&self) -> SendOptions {
        SendOptions {
            timeout: self.timeout,
            keep_prompt: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let config = SessionConfig::default();
        assert_eq!(config.read_timeout, Duration::from_secs(2));
        assert_eq!(config.max_read_bytes, 4096);
        assert_eq!(config.expect_timeout, Duration::from_secs(10));
        assert_eq!(config.echo_timeout, Duration::from_secs(1));
        assert_eq!(config.retry_limit, 1);
        assert_eq!(config.retry_interval, Duration::from_secs(10));
        assert_eq!(config.line_ending, LineEnding::Lf);
        assert!(!config.debug);
    }

    #[test]
    fn option_defaults_agree_with_config() {
        let config = SessionConfig::default();
        assert_eq!(config.read_options(), ReadOptions::default());
        assert_eq!(config.expect_options(), ExpectOptions::default());
        assert_eq!(config.send_options(), SendOptions::default());
        assert_eq!(config.retry_options(), RetryOptions::default());
    }

    #[test]
    fn builder_flows_into_options() {
        let config = SessionConfig::new()
            .read_timeout(Duration::from_millis(300))
            .max_read_bytes(16)
            .expect_timeout(Duration::from_secs(3))
            .retry_limit(5)
            .retry_interval(Duration::from_millis(50));

        assert_eq!(config.read_options().timeout, Duration::from_millis(300));
        assert_eq!(config.read_options().max_bytes, 16);
        assert_eq!(config.expect_options().timeout, Duration::from_secs(3));
        assert_eq!(config.send_options().timeout, Duration::from_secs(3));
        assert_eq!(config.retry_options().limit, 5);
        assert_eq!(config.retry_options().send_options().timeout, Duration::from_secs(3));
    }

    #[test]
    fn line_ending_parse() {
        assert_eq!("lf".parse::<LineEnding>().unwrap(), LineEnding::Lf);
        assert_eq!("CRLF".parse::<LineEnding>().unwrap(), LineEnding::CrLf);
        assert_eq!(" cr ".parse::<LineEnding>().unwrap(), LineEnding::Cr);
        assert!("nl".parse::<LineEnding>().is_err());
    }

    #[test]
    fn line_ending_parse_literal_characters() {
        assert_eq!("\n".parse::<LineEnding>().unwrap(), LineEnding::Lf);
        assert_eq!("\r\n".parse::<LineEnding>().unwrap(), LineEnding::CrLf);
        assert_eq!("\r".parse::<LineEnding>().unwrap(), LineEnding::Cr);
        assert!(" ".parse::<LineEnding>().is_err());
    }

    #[test]
    fn line_ending_bytes() {
        assert_eq!(LineEnding::Lf.as_bytes(), b"\n");
        assert_eq!(LineEnding::CrLf.as_bytes(), b"\r\n");
        assert_eq!(LineEnding::Cr.as_str(), "\r");
    }
}
