//! Invocation adapter.
//!
//! Turns "run this command and talk to it like so" into one call: check a
//! precondition, spawn the command on a PTY, hand a [`PtySession`] to the
//! caller's interaction, then make sure the child is gone.
//!
//! The precondition is an explicit parameter rather than ambient state. The
//! usual one is [`RequireMode`], which refuses to run unless the caller is in
//! the right [`ExecutionMode`]; any `Fn() -> Result<(), String>` works too.
//!
//! ```ignore
//! use futures::FutureExt;
//! use pty_driver::adapter::{ExecutionMode, Invocation, RequireMode};
//!
//! let guard = RequireMode::new(ExecutionMode::Orchestrated, current_mode);
//! let invocation = Invocation::new(guard);
//! let done = invocation
//!     .run("/usr/bin/racadm", &["-r", host], |session| {
//!         async move {
//!             session.set_expected_prompt("racadm>> ")?;
//!             session.send_and_expect("getsysinfo", session.send_options()).await
//!         }
//!         .boxed()
//!     })
//!     .await?;
//! ```

use std::fmt;

#[cfg(unix)]
use std::time::Duration;

#[cfg(unix)]
use futures::future::BoxFuture;

#[cfg(unix)]
use pty_spawn::{ExitStatus, SpawnConfig, UnixPtyChild};

#[cfg(unix)]
use crate::config::SessionConfig;
use crate::error::{DriverError, Result};
#[cfg(unix)]
use crate::session::{PtySession, Session};

/// A check that must pass before anything is spawned.
pub trait Precondition {
    /// `Err(reason)` refuses the invocation.
    fn check(&self) -> std::result::Result<(), String>;
}

impl<F> Precondition for F
where
    F: Fn() -> std::result::Result<(), String>,
{
    fn check(&self) -> std::result::Result<(), String> {
        self()
    }
}

/// No precondition.
#[derive(Debug, Clone, Copy, Default)]
pub struct Always;

impl Precondition for Always {
    fn check(&self) -> std::result::Result<(), String> {
        Ok(())
    }
}

/// How the calling tool is being driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Step-by-step, against a plan an operator reviewed.
    Orchestrated,
    /// Converging declared state, possibly unattended.
    Declarative,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Orchestrated => "orchestrated",
            Self::Declarative => "declarative",
        })
    }
}

/// Passes only when the current mode is the required one.
#[derive(Debug, Clone, Copy)]
pub struct RequireMode {
    required: ExecutionMode,
    current: ExecutionMode,
}

impl RequireMode {
    /// Require `required`; the caller is running in `current`.
    #[must_use]
    pub const fn new(required: ExecutionMode, current: ExecutionMode) -> Self {
        Self { required, current }
    }
}

impl Precondition for RequireMode {
    fn check(&self) -> std::result::Result<(), String> {
        if self.required == self.current {
            Ok(())
        } else {
            Err(format!(
                "interactive sessions are only available in {} mode (running in {} mode)",
                self.required, self.current
            ))
        }
    }
}

/// Run `precondition`, mapping a refusal to [`DriverError::Precondition`].
pub fn ensure(precondition: &impl Precondition) -> Result<()> {
    precondition.check().map_err(|reason| {
        tracing::warn!(%reason, "invocation refused");
        DriverError::precondition(reason)
    })
}

/// How long a child gets to exit on its own after the interaction ends.
#[cfg(unix)]
pub const DEFAULT_REAP_GRACE: Duration = Duration::from_secs(1);

/// Outcome of [`Invocation::run`].
#[cfg(unix)]
#[derive(Debug, Clone)]
pub struct Completed<T> {
    /// The child's process id.
    pub pid: u32,
    /// What the interaction returned.
    pub value: T,
    /// How the child ended.
    pub exit_status: ExitStatus,
}

/// Spawns a command per call and runs an interaction against it.
#[cfg(unix)]
#[derive(Debug, Clone)]
pub struct Invocation<P> {
    precondition: P,
    spawn_config: SpawnConfig,
    session_config: SessionConfig,
    reap_grace: Duration,
}

#[cfg(unix)]
impl<P: Precondition> Invocation<P> {
    /// An invocation guarded by `precondition`.
    pub fn new(precondition: P) -> Self {
        Self {
            precondition,
            spawn_config: SpawnConfig::default(),
            session_config: SessionConfig::default(),
            reap_grace: DEFAULT_REAP_GRACE,
        }
    }

    /// How children are spawned.
    #[must_use]
    pub fn spawn_config(mut self, config: SpawnConfig) -> Self {
        self.spawn_config = config;
        self
    }

    /// Defaults for the sessions handed to interactions.
    #[must_use]
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// How long to wait for a child to exit before killing it.
    #[must_use]
    pub const fn reap_grace(mut self, grace: Duration) -> Self {
        self.reap_grace = grace;
        self
    }

    /// Check the precondition, spawn `command`, run `interaction`, reap.
    ///
    /// Nothing is spawned if the precondition fails. The child is reaped
    /// whether or not the interaction succeeds; an interaction error is
    /// returned after the child is gone, and takes precedence over a
    /// failure to reap.
    pub async fn run<T, F>(&self, command: &str, args: &[&str], interaction: F) -> Result<Completed<T>>
    where
        F: for<'s> FnOnce(&'s mut PtySession) -> BoxFuture<'s, Result<T>>,
    {
        ensure(&self.precondition)?;

        let (mut session, mut child) = Session::spawn(
            command,
            args,
            &self.spawn_config,
            self.session_config.clone(),
        )
        .await?;
        let pid = child.pid();
        tracing::debug!(pid, command, "invocation started");

        let outcome = interaction(&mut session).await;
        // Closing the master hangs up the child's terminal.
        drop(session);

        let reaped = reap(&mut child, self.reap_grace).await;
        let (value, exit_status) = settle(pid, outcome, reaped)?;
        tracing::debug!(pid, ?exit_status, "invocation finished");

        Ok(Completed {
            pid,
            value,
            exit_status,
        })
    }
}

/// Combine the interaction's outcome with the reap result.
#[cfg(unix)]
fn settle<T>(pid: u32, outcome: Result<T>, reaped: Result<ExitStatus>) -> Result<(T, ExitStatus)> {
    match (outcome, reaped) {
        (Ok(value), Ok(status)) => Ok((value, status)),
        (Err(err), Ok(_)) | (Ok(_), Err(err)) => Err(err),
        (Err(err), Err(reap_err)) => {
            tracing::warn!(pid, error = %reap_err, "failed to reap child after interaction error");
            Err(err)
        }
    }
}

#[cfg(unix)]
async fn reap(child: &mut UnixPtyChild, grace: Duration) -> Result<ExitStatus> {
    if let Ok(status) = tokio::time::timeout(grace, child.wait()).await {
        return Ok(status?);
    }
    tracing::debug!(pid = child.pid(), "child outlived grace period, killing");
    child.kill()?;
    Ok(child.wait().await?)
}
