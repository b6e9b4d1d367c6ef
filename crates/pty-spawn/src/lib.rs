//! pty-spawn: async PTY allocation and child spawning for Unix.
//!
//! Opens a pseudo-terminal pair, starts a child attached to the slave side
//! and hands back the master as tokio read/write halves together with a
//! terminal-mode handle and a child handle.
//!
//! # Quick Start
//!
//! ```ignore
//! use pty_spawn::{SpawnConfig, spawn};
//! use tokio::io::{AsyncReadExt, AsyncWriteExt};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let process = spawn("/bin/sh", ["-i"], &SpawnConfig::default()).await?;
//!     let (mut reader, mut writer, mut termios, mut child) = process.into_parts()?;
//!
//!     termios.set_echo(false)?;
//!     writer.write_all(b"echo hello\n").await?;
//!
//!     let mut buf = [0u8; 1024];
//!     let n = reader.read(&mut buf).await?;
//!     println!("{}", String::from_utf8_lossy(&buf[..n]));
//!
//!     child.kill()?;
//!     Ok(())
//! }
//! ```

#![cfg(unix)]

pub mod config;
pub mod error;
pub mod unix;

pub use config::{
    DEFAULT_COLS, DEFAULT_ROWS, EnvPolicy, PtySignal, SpawnConfig, SpawnConfigBuilder, WindowSize,
};
pub use error::{PtyError, Result};
pub use unix::{
    ExitStatus, PtyProcess, PtyReader, PtyTermios, PtyWriter, UnixPtyChild, UnixPtyMaster, spawn,
};

/// Spawn the user's shell (`$SHELL`, falling back to `/bin/sh`) with the
/// default configuration.
pub async fn spawn_shell() -> Result<PtyProcess> {
    let shell = std::env::var_os("SHELL").unwrap_or_else(|| "/bin/sh".into());
    spawn(shell, std::iter::empty::<&str>(), &SpawnConfig::default()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = SpawnConfig::default();
        assert_eq!(config.window_size, WindowSize::new(DEFAULT_COLS, DEFAULT_ROWS));
        assert!(config.controlling_terminal);
    }

    #[tokio::test]
    async fn spawn_shell_starts() {
        let process = spawn_shell().await.unwrap();
        let (_reader, _writer, _termios, mut child) = process.into_parts().unwrap();
        assert!(child.is_running());
        child.kill().unwrap();
        child.wait().await.unwrap();
    }
}
