//! The interaction capability.
//!
//! [`Interaction`] is the operation surface of a session as a trait, so that
//! binding layers ([`SyncSession`](crate::SyncSession), the
//! [`adapter`](crate::adapter)) and caller code can be written once against
//! any implementation: a PTY-backed session, a session over in-memory pipes,
//! or a caller's own double.

use std::future::Future;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::config::{ExpectOptions, ReadOptions, RetryOptions, SendOptions, SessionConfig};
use crate::error::Result;
use crate::pattern::PatternEngine;
use crate::session::Session;

/// Everything a caller can do with an interactive session.
pub trait Interaction: Send {
    /// Compiled pattern type.
    type Pattern: Clone + Send + Sync;

    /// Session-wide defaults.
    fn config(&self) -> &SessionConfig;

    /// Write `message` as-is; returns the byte count.
    fn write(&mut self, message: &str) -> impl Future<Output = Result<usize>> + Send;

    /// Write `message` and the line ending.
    fn write_line(&mut self, message: &str) -> impl Future<Output = Result<()>> + Send;

    /// Read until the child goes quiet.
    fn read(&mut self, options: ReadOptions) -> impl Future<Output = Result<String>> + Send;

    /// Compile and store the expected prompt.
    fn set_expected_prompt(&mut self, source: &str) -> Result<&Self::Pattern>;

    /// Wait for `pattern`.
    fn expect(
        &mut self,
        pattern: &str,
        options: ExpectOptions,
    ) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Send a line and wait for the prompt.
    fn send_and_expect(
        &mut self,
        message: &str,
        options: SendOptions,
    ) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Re-send until the reply contains `pattern`.
    fn send_and_expect_until(
        &mut self,
        message: &str,
        pattern: &str,
        options: RetryOptions,
    ) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Type with per-character echo confirmation.
    fn type_in(
        &mut self,
        message: &str,
        options: ReadOptions,
    ) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Raw terminal mode.
    fn set_raw(&mut self) -> Result<()>;

    /// Cooked terminal mode.
    fn set_cooked(&mut self) -> Result<()>;

    /// Local echo on or off.
    fn set_echo(&mut self, enabled: bool) -> Result<bool>;

    /// Debug mirror on or off.
    fn set_debug(&mut self, enabled: bool) -> bool;
}

impl<R, W, E> Interaction for Session<R, W, E>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
    E: PatternEngine,
{
    type Pattern = E::Pattern;

    fn config(&self) -> &SessionConfig {
        Self::config(self)
    }

    fn write(&mut self, message: &str) -> impl Future<Output = Result<usize>> + Send {
        Self::write(self, message)
    }

    fn write_line(&mut self, message: &str) -> impl Future<Output = Result<()>> + Send {
        Self::write_line(self, message)
    }

    fn read(&mut self, options: ReadOptions) -> impl Future<Output = Result<String>> + Send {
        Self::read(self, options)
    }

    fn set_expected_prompt(&mut self, source: &str) -> Result<&E::Pattern> {
        Self::set_expected_prompt(self, source)
    }

    fn expect(
        &mut self,
        pattern: &str,
        options: ExpectOptions,
    ) -> impl Future<Output = Result<Option<String>>> + Send {
        Self::expect(self, pattern, options)
    }

    fn send_and_expect(
        &mut self,
        message: &str,
        options: SendOptions,
    ) -> impl Future<Output = Result<Option<String>>> + Send {
        Self::send_and_expect(self, message, options)
    }

    fn send_and_expect_until(
        &mut self,
        message: &str,
        pattern: &str,
        options: RetryOptions,
    ) -> impl Future<Output = Result<Option<String>>> + Send {
        Self::send_and_expect_until(self, message, pattern, options)
    }

    fn type_in(
        &mut self,
        message: &str,
        options: ReadOptions,
    ) -> impl Future<Output = Result<Option<String>>> + Send {
        Self::type_in(self, message, options)
    }

    fn set_raw(&mut self) -> Result<()> {
        Self::set_raw(self)
    }

    fn set_cooked(&mut self) -> Result<()> {
        Self::set_cooked(self)
    }

    fn set_echo(&mut self, enabled: bool) -> Result<bool> {
        Self::set_echo(self, enabled)
    }

    fn set_debug(&mut self, enabled: bool) -> bool {
        Self::set_debug(self, enabled)
    }
}
