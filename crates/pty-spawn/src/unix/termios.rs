//! Terminal line-discipline control for a PTY.

use std::os::unix::io::{AsFd, OwnedFd};

use rustix::termios::{
    InputModes, LocalModes, OptionalActions, OutputModes, Termios, tcgetattr, tcsetattr,
};

use crate::error::{PtyError, Result, errno_to_io};

/// Mode handle for one PTY.
///
/// The settings live in the PTY's line discipline, so they apply to both
/// directions of the pair at once.
#[derive(Debug)]
pub struct PtyTermios {
    fd: OwnedFd,
}

impl PtyTermios {
    /// Wrap a descriptor that refers to a terminal.
    #[must_use]
    pub const fn new(fd: OwnedFd) -> Self {
        Self { fd }
    }

    /// Byte-at-a-time input with no echo, signals or output processing.
    pub fn set_raw(&mut self) -> Result<()> {
        self.update(Termios::make_raw)
    }

    /// Line-buffered input with editing, signals, echo and newline translation.
    pub fn set_cooked(&mut self) -> Result<()> {
        self.update(|termios| {
            termios.local_modes |= LocalModes::ICANON
                | LocalModes::ECHO
                | LocalModes::ECHOE
                | LocalModes::ECHOK
                | LocalModes::ISIG
                | LocalModes::IEXTEN;
            termios.input_modes |= InputModes::ICRNL | InputModes::BRKINT | InputModes::IXON;
            termios.output_modes |= OutputModes::OPOST | OutputModes::ONLCR;
        })
    }

    /// Turn local echo on or off, leaving every other setting alone.
    pub fn set_echo(&mut self, enabled: bool) -> Result<()> {
        self.update(|termios| {
            termios.local_modes.set(LocalModes::ECHO, enabled);
        })
    }

    /// Whether local echo is currently on.
    pub fn echo(&self) -> Result<bool> {
        Ok(self.attributes()?.local_modes.contains(LocalModes::ECHO))
    }

    /// Whether canonical (line-buffered) input is currently on.
    pub fn canonical(&self) -> Result<bool> {
        Ok(self.attributes()?.local_modes.contains(LocalModes::ICANON))
    }

    fn attributes(&self) -> Result<Termios> {
        tcgetattr(self.fd.as_fd()).map_err(|e| PtyError::GetAttributes(errno_to_io(e)))
    }

    fn update(&mut self, change: impl FnOnce(&mut Termios)) -> Result<()> {
        let mut termios = self.attributes()?;
        change(&mut termios);
        tcsetattr(self.fd.as_fd(), OptionalActions::Now, &termios)
            .map_err(|e| PtyError::SetAttributes(errno_to_io(e)))
    }
}
