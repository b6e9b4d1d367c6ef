//! Unix PTY spawning.
//!
//! Allocates the pair with `openpt`/`grantpt`/`unlockpt`, drives the master
//! through tokio's `AsyncFd`, and starts the child in a new session with the
//! slave as its controlling terminal.

mod child;
mod pty;
mod termios;

use std::ffi::OsStr;

use tokio::io::{ReadHalf, WriteHalf};

pub use child::{ExitStatus, UnixPtyChild};
pub use pty::{UnixPtyMaster, open_slave};
pub use termios::PtyTermios;

use crate::config::SpawnConfig;
use crate::error::{PtyError, Result};

/// Read half of a PTY master: what the child writes.
pub type PtyReader = ReadHalf<UnixPtyMaster>;

/// Write half of a PTY master: what the child reads.
pub type PtyWriter = WriteHalf<UnixPtyMaster>;

/// A freshly spawned child and the master side of its PTY.
#[derive(Debug)]
pub struct PtyProcess {
    master: UnixPtyMaster,
    child: UnixPtyChild,
}

impl PtyProcess {
    /// The child's process id.
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.child.pid()
    }

    /// The master side.
    #[must_use]
    pub const fn master(&self) -> &UnixPtyMaster {
        &self.master
    }

    /// The child handle.
    pub fn child_mut(&mut self) -> &mut UnixPtyChild {
        &mut self.child
    }

    /// Split into the two streams, a mode handle and the child handle.
    pub fn into_parts(self) -> Result<(PtyReader, PtyWriter, PtyTermios, UnixPtyChild)> {
        let termios = self.master.termios()?;
        let (reader, writer) = tokio::io::split(self.master);
        Ok((reader, writer, termios, self.child))
    }
}

/// Spawn `program` with `args` on a new PTY.
///
/// Must be called from within a tokio runtime.
///
/// # Example
///
/// ```ignore
/// use pty_spawn::{SpawnConfig, spawn};
///
/// let process = spawn("/bin/sh", ["-i"], &SpawnConfig::default()).await?;
/// let (reader, writer, termios, child) = process.into_parts()?;
/// ```
#[allow(clippy::unused_async)]
pub async fn spawn<S, I>(program: S, args: I, config: &SpawnConfig) -> Result<PtyProcess>
where
    S: AsRef<OsStr>,
    I: IntoIterator,
    I::Item: AsRef<OsStr>,
{
    let program = program.as_ref();
    validate(program, "program")?;
    let args: Vec<_> = args
        .into_iter()
        .map(|arg| arg.as_ref().to_os_string())
        .collect();
    for (idx, arg) in args.iter().enumerate() {
        validate(arg, &format!("argument[{idx}]"))?;
    }

    let (master, slave_path) = UnixPtyMaster::open()?;
    master.set_window_size(config.window_size)?;

    let slave_fd = open_slave(&slave_path)?;
    let child = child::spawn_child(&slave_fd, program, &args, config)?;
    // The child holds its own copies; the parent's slave must go so that
    // the master sees EOF once the child exits.
    drop(slave_fd);

    Ok(PtyProcess { master, child })
}

fn validate(value: &OsStr, kind: &str) -> Result<()> {
    use std::os::unix::ffi::OsStrExt;

    if kind == "program" && value.is_empty() {
        return Err(PtyError::InvalidArgument {
            kind: kind.to_string(),
            value: String::new(),
            reason: "program must not be empty",
        });
    }
    if value.as_bytes().contains(&0) {
        return Err(PtyError::InvalidArgument {
            kind: kind.to_string(),
            value: value.to_string_lossy().into_owned(),
            reason: "contains a NUL byte",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn spawn_echo_and_read_output() {
        let process = spawn("echo", ["hello"], &SpawnConfig::default())
            .await
            .unwrap();
        let (mut reader, _writer, _termios, mut child) = process.into_parts().unwrap();

        let mut output = Vec::new();
        reader.read_to_end(&mut output).await.unwrap();
        assert!(String::from_utf8_lossy(&output).contains("hello"));

        let status = child.wait().await.unwrap();
        assert!(status.success());
    }

    #[tokio::test]
    async fn spawn_cat_round_trip() {
        let process = spawn("cat", std::iter::empty::<&str>(), &SpawnConfig::default())
            .await
            .unwrap();
        let pid = process.pid();
        assert!(pid > 0);

        let (mut reader, mut writer, _termios, mut child) = process.into_parts().unwrap();
        writer.write_all(b"ping\n").await.unwrap();

        let mut seen = String::new();
        let mut buf = [0u8; 256];
        while !seen.matches("ping").count().ge(&2) {
            let n = reader.read(&mut buf).await.unwrap();
            assert!(n > 0, "unexpected EOF, saw {seen:?}");
            seen.push_str(&String::from_utf8_lossy(&buf[..n]));
        }

        child.kill().unwrap();
        let status = child.wait().await.unwrap();
        assert_eq!(status.signal(), Some(libc::SIGKILL));
    }

    #[tokio::test]
    async fn input_written_before_exec_is_buffered() {
        let process = spawn(
            "/bin/sh",
            ["-c", "read line; echo \"got:$line\""],
            &SpawnConfig::default(),
        )
        .await
        .unwrap();
        let (mut reader, mut writer, _termios, mut child) = process.into_parts().unwrap();
        writer.write_all(b"early\n").await.unwrap();

        let mut output = Vec::new();
        reader.read_to_end(&mut output).await.unwrap();
        assert!(String::from_utf8_lossy(&output).contains("got:early"));
        assert!(child.wait().await.unwrap().success());
    }

    #[tokio::test]
    async fn rejects_nul_in_argument() {
        let err = spawn("echo", ["a\0b"], &SpawnConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PtyError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let err = spawn(
            "/definitely/not/here",
            std::iter::empty::<&str>(),
            &SpawnConfig::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PtyError::Spawn { .. }));
    }
}
