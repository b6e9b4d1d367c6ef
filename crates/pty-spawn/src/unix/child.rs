//! Child process spawning and lifecycle for PTY sessions.

use std::ffi::OsStr;
use std::io;
use std::os::unix::io::{AsRawFd, FromRawFd, OwnedFd};
use std::process::Stdio;

use rustix::process::{Pid, Signal, kill_process};
use tokio::process::{Child, Command};

use crate::config::{PtySignal, SpawnConfig};
use crate::error::{PtyError, Result, errno_to_io};

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Normal exit with the given code.
    Exited(i32),
    /// Terminated by the given signal.
    Signaled(i32),
}

impl ExitStatus {
    /// Exited with code 0.
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self, Self::Exited(0))
    }

    /// The exit code, if the process exited normally.
    #[must_use]
    pub const fn code(&self) -> Option<i32> {
        match self {
            Self::Exited(code) => Some(*code),
            Self::Signaled(_) => None,
        }
    }

    /// The terminating signal, if any.
    #[must_use]
    pub const fn signal(&self) -> Option<i32> {
        match self {
            Self::Signaled(sig) => Some(*sig),
            Self::Exited(_) => None,
        }
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        use std::os::unix::process::ExitStatusExt;

        match (status.code(), status.signal()) {
            (Some(code), _) => Self::Exited(code),
            (None, Some(signal)) => Self::Signaled(signal),
            (None, None) => Self::Exited(-1),
        }
    }
}

/// Handle to a child running on a PTY.
pub struct UnixPtyChild {
    child: Child,
    pid: u32,
    exit_status: Option<ExitStatus>,
}

impl std::fmt::Debug for UnixPtyChild {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnixPtyChild")
            .field("pid", &self.pid)
            .field("exit_status", &self.exit_status)
            .finish_non_exhaustive()
    }
}

impl UnixPtyChild {
    fn new(child: Child, pid: u32) -> Self {
        Self {
            child,
            pid,
            exit_status: None,
        }
    }

    /// The child's process id.
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// True until an exit status has been observed.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.exit_status.is_none()
    }

    /// Wait for the child to exit.
    pub async fn wait(&mut self) -> Result<ExitStatus> {
        if let Some(status) = self.exit_status {
            return Ok(status);
        }

        let status = ExitStatus::from(self.child.wait().await.map_err(PtyError::Wait)?);
        tracing::debug!(pid = self.pid, ?status, "child exited");
        self.exit_status = Some(status);
        Ok(status)
    }

    /// Poll for an exit status without blocking.
    pub fn try_wait(&mut self) -> Result<Option<ExitStatus>> {
        if let Some(status) = self.exit_status {
            return Ok(Some(status));
        }

        let status = self
            .child
            .try_wait()
            .map_err(PtyError::Wait)?
            .map(ExitStatus::from);
        if status.is_some() {
            self.exit_status = status;
        }
        Ok(status)
    }

    /// Deliver a signal to the child.
    pub fn signal(&self, signal: PtySignal) -> Result<()> {
        if !self.is_running() {
            return Err(PtyError::NotRunning);
        }

        let pid = i32::try_from(self.pid)
            .ok()
            .and_then(Pid::from_raw)
            .ok_or_else(|| PtyError::Signal(io::Error::new(io::ErrorKind::InvalidInput, "invalid pid")))?;
        let raw = Signal::from_named_raw(signal.as_raw())
            .ok_or_else(|| PtyError::Signal(io::Error::new(io::ErrorKind::InvalidInput, "invalid signal")))?;

        kill_process(pid, raw).map_err(|e| PtyError::Signal(errno_to_io(e)))
    }

    /// Kill the child with SIGKILL.
    pub fn kill(&mut self) -> Result<()> {
        self.signal(PtySignal::Kill)
    }
}

/// Start `program` with the PTY slave as its stdin, stdout and stderr.
pub(crate) fn spawn_child<S, I>(
    slave_fd: &OwnedFd,
    program: S,
    args: I,
    config: &SpawnConfig,
) -> Result<UnixPtyChild>
where
    S: AsRef<OsStr>,
    I: IntoIterator,
    I::Item: AsRef<OsStr>,
{
    let program = program.as_ref();
    let slave_raw = slave_fd.as_raw_fd();

    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.env_clear();
    cmd.envs(config.effective_env());
    cmd.kill_on_drop(config.kill_on_drop);

    if let Some(dir) = &config.working_directory {
        cmd.current_dir(dir);
    }

    // SAFETY: each dup'd descriptor is owned by exactly one Stdio.
    unsafe {
        cmd.stdin(Stdio::from_raw_fd(dup(slave_raw)?));
        cmd.stdout(Stdio::from_raw_fd(dup(slave_raw)?));
        cmd.stderr(Stdio::from_raw_fd(dup(slave_raw)?));
    }

    if config.controlling_terminal {
        // SAFETY: setsid and ioctl are async-signal-safe.
        unsafe {
            cmd.pre_exec(move || {
                if libc::setsid() == -1 {
                    return Err(io::Error::last_os_error());
                }
                if libc::ioctl(libc::STDIN_FILENO, libc::TIOCSCTTY, 0) == -1 {
                    return Err(io::Error::last_os_error());
                }
                Ok(())
            });
        }
    }

    let child = cmd.spawn().map_err(|source| PtyError::Spawn {
        program: program.to_string_lossy().into_owned(),
        source,
    })?;
    let pid = child.id().ok_or_else(|| PtyError::Spawn {
        program: program.to_string_lossy().into_owned(),
        source: io::Error::other("child exited before its pid was read"),
    })?;

    tracing::debug!(pid, program = %program.to_string_lossy(), "spawned child on pty");

    Ok(UnixPtyChild::new(child, pid))
}

fn dup(fd: std::os::unix::io::RawFd) -> Result<std::os::unix::io::RawFd> {
    // SAFETY: dup on a descriptor we hold open.
    let new_fd = unsafe { libc::dup(fd) };
    if new_fd == -1 {
        return Err(PtyError::Create(io::Error::last_os_error()));
    }
    Ok(new_fd)
}
