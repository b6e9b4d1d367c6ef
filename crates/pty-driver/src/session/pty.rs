//! Sessions over a real PTY.

use std::ffi::OsStr;

use pty_spawn::{PtyReader, PtyWriter, SpawnConfig, UnixPtyChild};

use super::Session;
use crate::config::SessionConfig;
use crate::error::Result;
use crate::pattern::{PatternEngine, RegexEngine};

/// A session talking to a child through a PTY master.
pub type PtySession<E = RegexEngine> = Session<PtyReader, PtyWriter, E>;

impl Session<PtyReader, PtyWriter> {
    /// Spawn `program` on a new PTY and wrap it in a session.
    ///
    /// The session gets the PTY's terminal handle, so mode control works.
    /// The child handle is returned separately; the session never waits for
    /// or kills the process.
    pub async fn spawn<S, I>(
        program: S,
        args: I,
        spawn_config: &SpawnConfig,
        config: SessionConfig,
    ) -> Result<(Self, UnixPtyChild)>
    where
        S: AsRef<OsStr>,
        I: IntoIterator,
        I::Item: AsRef<OsStr>,
    {
        Self::spawn_with_engine(program, args, spawn_config, RegexEngine::default(), config).await
    }
}

impl<E: PatternEngine> Session<PtyReader, PtyWriter, E> {
    /// [`Session::spawn`] with a custom pattern engine.
    pub async fn spawn_with_engine<S, I>(
        program: S,
        args: I,
        spawn_config: &SpawnConfig,
        engine: E,
        config: SessionConfig,
    ) -> Result<(Self, UnixPtyChild)>
    where
        S: AsRef<OsStr>,
        I: IntoIterator,
        I::Item: AsRef<OsStr>,
    {
        let program = program.as_ref();
        let process = pty_spawn::spawn(program, args, spawn_config).await?;
        let (reader, writer, termios, child) = process.into_parts()?;
        tracing::debug!(
            pid = child.pid(),
            program = %program.to_string_lossy(),
            "session started"
        );

        let session = Self::with_engine(reader, writer, engine, config).with_terminal(termios);
        Ok((session, child))
    }
}
