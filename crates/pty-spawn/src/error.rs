//! Error types for the pty-spawn crate.

use std::io;

/// The error type for PTY allocation, spawning and control.
#[derive(Debug, thiserror::Error)]
pub enum PtyError {
    /// Failed to allocate the PTY pair.
    #[error("failed to create PTY: {0}")]
    Create(#[source] io::Error),

    /// Failed to start the child process.
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        /// The program that was being started.
        program: String,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// An I/O error on the master side.
    #[error("PTY I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failed to read terminal attributes.
    #[error("failed to get terminal attributes: {0}")]
    GetAttributes(#[source] io::Error),

    /// Failed to change terminal attributes.
    #[error("failed to set terminal attributes: {0}")]
    SetAttributes(#[source] io::Error),

    /// Failed to resize the PTY.
    #[error("failed to resize PTY: {0}")]
    Resize(#[source] io::Error),

    /// The master side has been closed.
    #[error("PTY has been closed")]
    Closed,

    /// The child has already exited.
    #[error("child process has already exited")]
    NotRunning,

    /// Failed to deliver a signal.
    #[error("failed to send signal: {0}")]
    Signal(#[source] io::Error),

    /// Failed to reap the child.
    #[error("failed to wait for child: {0}")]
    Wait(#[source] io::Error),

    /// A program name or argument cannot be passed to exec.
    #[error("invalid {kind} {value:?}: {reason}")]
    InvalidArgument {
        /// What was invalid ("program", "argument[1]", ...).
        kind: String,
        /// The offending value.
        value: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}

/// Result alias for PTY operations.
pub type Result<T> = std::result::Result<T, PtyError>;

impl From<rustix::io::Errno> for PtyError {
    fn from(errno: rustix::io::Errno) -> Self {
        Self::Io(errno_to_io(errno))
    }
}

/// Convert a rustix errno into a std I/O error.
pub(crate) fn errno_to_io(errno: rustix::io::Errno) -> io::Error {
    io::Error::from_raw_os_error(errno.raw_os_error())
}
