//! Terminal mode control.
//!
//! A session changes the line discipline of its terminal but never reads it
//! back, so the seam is three setters.

use std::io;

/// Line-discipline control for the terminal a session talks through.
pub trait TerminalControl: Send {
    /// Switch to raw mode.
    fn set_raw(&mut self) -> io::Result<()>;

    /// Switch to cooked (canonical) mode.
    fn set_cooked(&mut self) -> io::Result<()>;

    /// Turn local echo on or off.
    fn set_echo(&mut self, enabled: bool) -> io::Result<()>;
}

#[cfg(unix)]
impl TerminalControl for pty_spawn::PtyTermios {
    fn set_raw(&mut self) -> io::Result<()> {
        Self::set_raw(self).map_err(into_io)
    }

    fn set_cooked(&mut self) -> io::Result<()> {
        Self::set_cooked(self).map_err(into_io)
    }

    fn set_echo(&mut self, enabled: bool) -> io::Result<()> {
        Self::set_echo(self, enabled).map_err(into_io)
    }
}

#[cfg(unix)]
fn into_io(err: pty_spawn::PtyError) -> io::Error {
    match err {
        pty_spawn::PtyError::GetAttributes(e)
        | pty_spawn::PtyError::SetAttributes(e)
        | pty_spawn::PtyError::Io(e) => e,
        other => io::Error::other(other),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn non_terminal_error_keeps_os_code() {
        let file = std::fs::File::open("/dev/null").unwrap();
        let mut termios = pty_spawn::PtyTermios::new(file.into());
        let err = TerminalControl::set_raw(&mut termios).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::ENOTTY));
    }
}
