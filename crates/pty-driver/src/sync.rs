//! Blocking binding for any [`Interaction`].
//!
//! [`SyncSession`] owns a current-thread tokio runtime and drives each
//! operation to completion with `block_on`, for callers that are not async.

use std::future::Future;

use tokio::runtime::{Builder, Runtime};

use crate::capability::Interaction;
use crate::config::{ExpectOptions, ReadOptions, RetryOptions, SendOptions, SessionConfig};
use crate::error::{DriverError, Result};

/// A synchronous session wrapper.
pub struct SyncSession<S> {
    // Declared before the runtime so its I/O resources are released while
    // the reactor still exists.
    inner: S,
    #[cfg(unix)]
    child: Option<pty_spawn::UnixPtyChild>,
    runtime: Runtime,
}

impl<S> std::fmt::Debug for SyncSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSession").finish_non_exhaustive()
    }
}

fn new_runtime() -> Result<Runtime> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| DriverError::io_context("creating tokio runtime", e))
}

#[cfg(unix)]
impl SyncSession<crate::session::PtySession> {
    /// Spawn `command` on a new PTY.
    ///
    /// The child is killed when the wrapper is dropped, if it is still
    /// running.
    pub fn spawn(
        command: &str,
        args: &[&str],
        spawn_config: &pty_spawn::SpawnConfig,
        config: SessionConfig,
    ) -> Result<Self> {
        let runtime = new_runtime()?;
        let (inner, child) = runtime.block_on(crate::session::Session::spawn(
            command,
            args,
            spawn_config,
            config,
        ))?;
        Ok(Self {
            inner,
            child: Some(child),
            runtime,
        })
    }

    /// The child's process id.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().map(pty_spawn::UnixPtyChild::pid)
    }

    /// Wait for the child to exit.
    pub fn wait(&mut self) -> Result<Option<pty_spawn::ExitStatus>> {
        let Some(child) = self.child.as_mut() else {
            return Ok(None);
        };
        Ok(Some(self.runtime.block_on(child.wait())?))
    }
}

impl<S: Interaction> SyncSession<S> {
    /// Wrap an existing session.
    ///
    /// The session must not depend on another runtime's reactor; sessions
    /// over PTYs should be created with [`SyncSession::spawn`].
    pub fn new(inner: S) -> Result<Self> {
        Ok(Self {
            inner,
            #[cfg(unix)]
            child: None,
            runtime: new_runtime()?,
        })
    }

    /// The wrapped session.
    pub const fn get_ref(&self) -> &S {
        &self.inner
    }

    /// The wrapped session, mutably.
    pub const fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Session-wide defaults.
    pub fn config(&self) -> &SessionConfig {
        self.inner.config()
    }

    /// Run a future on this wrapper's runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// See [`Session::write`](crate::Session::write).
    pub fn write(&mut self, message: &str) -> Result<usize> {
        self.runtime.block_on(self.inner.write(message))
    }

    /// See [`Session::write_line`](crate::Session::write_line).
    pub fn write_line(&mut self, message: &str) -> Result<()> {
        self.runtime.block_on(self.inner.write_line(message))
    }

    /// See [`Session::read`](crate::Session::read).
    pub fn read(&mut self, options: ReadOptions) -> Result<String> {
        self.runtime.block_on(self.inner.read(options))
    }

    /// See [`Session::set_expected_prompt`](crate::Session::set_expected_prompt).
    pub fn set_expected_prompt(&mut self, source: &str) -> Result<&S::Pattern> {
        self.inner.set_expected_prompt(source)
    }

    /// See [`Session::expect`](crate::Session::expect).
    pub fn expect(&mut self, pattern: &str, options: ExpectOptions) -> Result<Option<String>> {
        self.runtime.block_on(self.inner.expect(pattern, options))
    }

    /// See [`Session::send_and_expect`](crate::Session::send_and_expect).
    pub fn send_and_expect(&mut self, message: &str, options: SendOptions) -> Result<Option<String>> {
        self.runtime
            .block_on(self.inner.send_and_expect(message, options))
    }

    /// See [`Session::send_and_expect_until`](crate::Session::send_and_expect_until).
    pub fn send_and_expect_until(
        &mut self,
        message: &str,
        pattern: &str,
        options: RetryOptions,
    ) -> Result<Option<String>> {
        self.runtime
            .block_on(self.inner.send_and_expect_until(message, pattern, options))
    }

    /// See [`Session::type_in`](crate::Session::type_in).
    pub fn type_in(&mut self, message: &str, options: ReadOptions) -> Result<Option<String>> {
        self.runtime.block_on(self.inner.type_in(message, options))
    }

    /// Raw terminal mode.
    pub fn set_raw(&mut self) -> Result<()> {
        self.inner.set_raw()
    }

    /// Cooked terminal mode.
    pub fn set_cooked(&mut self) -> Result<()> {
        self.inner.set_cooked()
    }

    /// Local echo on or off.
    pub fn set_echo(&mut self, enabled: bool) -> Result<bool> {
        self.inner.set_echo(enabled)
    }

    /// Debug mirror on or off.
    pub fn set_debug(&mut self, enabled: bool) -> bool {
        self.inner.set_debug(enabled)
    }
}

impl<S> SyncSession<S> {
    #[cfg(unix)]
    fn reap(&mut self) {
        if let Some(mut child) = self.child.take()
            && matches!(child.try_wait(), Ok(None))
        {
            tracing::debug!(pid = child.pid(), "killing child on drop");
            if child.kill().is_ok() {
                let _ = self.runtime.block_on(child.wait());
            }
        }
    }

    #[cfg(not(unix))]
    const fn reap(&mut self) {}
}

impl<S> Drop for SyncSession<S> {
    fn drop(&mut self) {
        self.reap();
    }
}

/// Run a future to completion on a fresh current-thread runtime.
pub fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| DriverError::io_context("creating tokio runtime for block_on", e))?;

    Ok(runtime.block_on(future))
}
