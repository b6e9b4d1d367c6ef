//! Shared helpers for integration tests.
//!
//! A "stub child" is the far end of two in-memory pipes: whatever it writes
//! to `output` the session reads, and whatever the session writes arrives on
//! `input`.

#![allow(dead_code)]

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use pty_driver::Session;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, duplex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A session over in-memory pipes.
pub type StubSession = Session<DuplexStream, DuplexStream>;

/// The child's side of a stub session.
pub struct StubChild {
    /// Bytes written here are read by the session.
    pub output: DuplexStream,
    /// Bytes the session writes arrive here.
    pub input: DuplexStream,
}

/// A session and the child end of its pipes.
pub fn stub_session() -> (StubSession, StubChild) {
    let (from_child, output) = duplex(4096);
    let (to_child, input) = duplex(4096);
    (Session::new(from_child, to_child), StubChild { output, input })
}

/// Run a line-oriented fake program.
///
/// Every line the session sends is handed to `respond` and its return value
/// is printed back. The lines received are forwarded on the returned channel
/// so tests can count sends.
pub fn scripted<F>(child: StubChild, mut respond: F) -> (mpsc::UnboundedReceiver<String>, JoinHandle<DuplexStream>)
where
    F: FnMut(&str) -> String + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let StubChild { mut output, input } = child;
    let handle = tokio::spawn(async move {
        let mut lines = BufReader::new(input).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let reply = respond(&line);
            let _ = tx.send(line);
            if output.write_all(reply.as_bytes()).await.is_err() {
                break;
            }
        }
        output
    });
    (rx, handle)
}

/// Drain everything currently queued on `rx`.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Ok(line) = rx.try_recv() {
        lines.push(line);
    }
    lines
}

/// A debug sink the test can read back.
#[derive(Clone, Default)]
pub struct SharedSink(Arc<Mutex<Vec<u8>>>);

impl SharedSink {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
