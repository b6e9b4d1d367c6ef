//! PTY master allocation and async I/O.

use std::ffi::OsStr;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::{AsRawFd, OwnedFd, RawFd};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};

use rustix::fs::{Mode, OFlags, fcntl_setfl, open};
use rustix::pty::{OpenptFlags, grantpt, openpt, ptsname, unlockpt};
use rustix::termios::{Winsize, tcgetwinsize, tcsetwinsize};
use tokio::io::unix::AsyncFd;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use super::termios::PtyTermios;
use crate::config::WindowSize;
use crate::error::{PtyError, Result, errno_to_io};

/// The controller side of a Unix pseudo-terminal.
///
/// Reads yield what the child writes to its terminal; writes are delivered
/// to the child's terminal input. Once the child side is gone (Linux reports
/// `EIO`), reads return end of file.
pub struct UnixPtyMaster {
    async_fd: AsyncFd<OwnedFd>,
    open: Arc<AtomicBool>,
}

impl std::fmt::Debug for UnixPtyMaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnixPtyMaster")
            .field("fd", &self.async_fd.as_raw_fd())
            .field("open", &self.open.load(Ordering::SeqCst))
            .finish()
    }
}

impl UnixPtyMaster {
    /// Allocate a PTY pair, returning the master and the slave device path.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open() -> Result<(Self, PathBuf)> {
        let master_fd = openpt(OpenptFlags::RDWR | OpenptFlags::NOCTTY)
            .map_err(|e| PtyError::Create(errno_to_io(e)))?;
        grantpt(&master_fd).map_err(|e| PtyError::Create(errno_to_io(e)))?;
        unlockpt(&master_fd).map_err(|e| PtyError::Create(errno_to_io(e)))?;

        let slave_name =
            ptsname(&master_fd, Vec::new()).map_err(|e| PtyError::Create(errno_to_io(e)))?;
        let slave_path = PathBuf::from(OsStr::from_bytes(slave_name.as_bytes()));

        fcntl_setfl(&master_fd, OFlags::NONBLOCK).map_err(|e| PtyError::Create(errno_to_io(e)))?;

        let async_fd = AsyncFd::new(master_fd).map_err(PtyError::Create)?;

        tracing::trace!(slave = %slave_path.display(), "allocated pty");

        Ok((
            Self {
                async_fd,
                open: Arc::new(AtomicBool::new(true)),
            },
            slave_path,
        ))
    }

    /// Whether the master is still open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Set the window size seen by the child.
    pub fn set_window_size(&self, size: WindowSize) -> Result<()> {
        if !self.is_open() {
            return Err(PtyError::Closed);
        }

        let winsize = Winsize {
            ws_row: size.rows,
            ws_col: size.cols,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };
        tcsetwinsize(self.async_fd.get_ref(), winsize).map_err(|e| PtyError::Resize(errno_to_io(e)))
    }

    /// Current window size.
    pub fn window_size(&self) -> Result<WindowSize> {
        if !self.is_open() {
            return Err(PtyError::Closed);
        }

        let winsize = tcgetwinsize(self.async_fd.get_ref())
            .map_err(|e| PtyError::GetAttributes(errno_to_io(e)))?;
        Ok(WindowSize::new(winsize.ws_col, winsize.ws_row))
    }

    /// A terminal-mode handle for this PTY.
    ///
    /// The handle owns a duplicate of the master descriptor, so it stays
    /// usable after the master is split into read and write halves.
    pub fn termios(&self) -> Result<PtyTermios> {
        let fd = self.async_fd.get_ref().try_clone()?;
        Ok(PtyTermios::new(fd))
    }

    /// Mark the master closed; later reads return EOF and writes fail.
    pub fn close(&mut self) {
        self.open.store(false, Ordering::SeqCst);
    }
}

impl AsRawFd for UnixPtyMaster {
    fn as_raw_fd(&self) -> RawFd {
        self.async_fd.as_raw_fd()
    }
}

impl AsyncRead for UnixPtyMaster {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if !self.open.load(Ordering::SeqCst) {
            return Poll::Ready(Ok(()));
        }

        loop {
            let mut guard = match self.async_fd.poll_read_ready(cx) {
                Poll::Ready(Ok(guard)) => guard,
                Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                Poll::Pending => return Poll::Pending,
            };

            let unfilled = buf.initialize_unfilled();
            match rustix::io::read(self.async_fd.get_ref(), unfilled) {
                Ok(n) => {
                    buf.advance(n);
                    return Poll::Ready(Ok(()));
                }
                Err(rustix::io::Errno::AGAIN) => {
                    guard.clear_ready();
                }
                // Linux signals a hung-up slave with EIO rather than a zero read.
                Err(rustix::io::Errno::IO) => return Poll::Ready(Ok(())),
                Err(e) => return Poll::Ready(Err(errno_to_io(e))),
            }
        }
    }
}

impl AsyncWrite for UnixPtyMaster {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if !self.open.load(Ordering::SeqCst) {
            return Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "PTY closed")));
        }

        loop {
            let mut guard = match self.async_fd.poll_write_ready(cx) {
                Poll::Ready(Ok(guard)) => guard,
                Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                Poll::Pending => return Poll::Pending,
            };

            match rustix::io::write(self.async_fd.get_ref(), buf) {
                Ok(n) => return Poll::Ready(Ok(n)),
                Err(rustix::io::Errno::AGAIN) => {
                    guard.clear_ready();
                }
                Err(e) => return Poll::Ready(Err(errno_to_io(e))),
            }
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.open.store(false, Ordering::SeqCst);
        Poll::Ready(Ok(()))
    }
}

/// Open the slave side of a PTY for the child.
pub fn open_slave(path: &Path) -> Result<OwnedFd> {
    open(path, OFlags::RDWR | OFlags::NOCTTY, Mode::empty())
        .map_err(|e| PtyError::Create(errno_to_io(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_pty() {
        let (master, slave_path) = UnixPtyMaster::open().unwrap();
        assert!(master.is_open());
        let path = slave_path.to_string_lossy();
        assert!(path.starts_with("/dev/pts/") || path.starts_with("/dev/tty"));
    }

    #[tokio::test]
    async fn window_size_round_trip() {
        let (master, _) = UnixPtyMaster::open().unwrap();
        master.set_window_size(WindowSize::new(120, 40)).unwrap();
        assert_eq!(master.window_size().unwrap(), WindowSize::new(120, 40));
    }

    #[tokio::test]
    async fn closed_master_rejects_resize() {
        let (mut master, _) = UnixPtyMaster::open().unwrap();
        master.close();
        assert!(!master.is_open());
        assert!(matches!(
            master.set_window_size(WindowSize::default()),
            Err(PtyError::Closed)
        ));
    }
}
