//! Wire-level debug mirror.
//!
//! When enabled, a session copies what it sends and receives to a side
//! channel (standard error unless a sink is supplied), one record per line:
//!
//! ```text
//! >> show␣version
//! << show␣version␍␤Cisco␣IOS␣...␍␤router#␣
//! ```
//!
//! Control characters that would break the one-line-per-record layout are
//! replaced with visible Unicode control pictures. Every record also goes
//! out as a `tracing` event on the `pty_driver::wire` target, whether or
//! not the mirror is enabled.

use std::fmt;
use std::io::{self, Write};

/// Which way a record travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Written to the child.
    Sent,
    /// Read from the child.
    Received,
    /// Produced by the session itself.
    Info,
}

impl Direction {
    /// The two-character record tag.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Sent => ">>",
            Self::Received => "<<",
            Self::Info => "**",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Make `text` printable on one line.
///
/// ESC becomes `␛`, LF `␤`, CR `␍` and space `␣`; everything else is kept.
#[must_use]
pub fn escape_wire(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{1b}' => out.push('\u{241b}'),
            '\n' => out.push('\u{2424}'),
            '\r' => out.push('\u{240d}'),
            ' ' => out.push('\u{2423}'),
            c => out.push(c),
        }
    }
    out
}

/// Side channel for wire traffic.
pub struct DebugMirror {
    enabled: bool,
    sink: Box<dyn Write + Send>,
}

impl fmt::Debug for DebugMirror {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugMirror")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl Default for DebugMirror {
    fn default() -> Self {
        Self::stderr(false)
    }
}

impl DebugMirror {
    /// A mirror writing to standard error.
    #[must_use]
    pub fn stderr(enabled: bool) -> Self {
        Self::with_sink(enabled, io::stderr())
    }

    /// A mirror writing to `sink`.
    #[must_use]
    pub fn with_sink(enabled: bool, sink: impl Write + Send + 'static) -> Self {
        Self {
            enabled,
            sink: Box::new(sink),
        }
    }

    /// Whether records are written to the sink.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turn the mirror on or off; returns the new state.
    pub const fn set_enabled(&mut self, enabled: bool) -> bool {
        self.enabled = enabled;
        enabled
    }

    /// Replace the sink.
    pub fn set_sink(&mut self, sink: impl Write + Send + 'static) {
        self.sink = Box::new(sink);
    }

    /// Record `text`.
    ///
    /// Sink failures are logged and otherwise ignored; the mirror never
    /// fails the operation it is observing.
    pub fn record(&mut self, direction: Direction, text: &str) {
        let escaped = escape_wire(text);
        tracing::debug!(target: "pty_driver::wire", direction = direction.tag(), "{escaped}");

        if !self.enabled {
            return;
        }
        if let Err(err) = writeln!(self.sink, "{direction} {escaped}").and_then(|()| self.sink.flush())
        {
            tracing::warn!(error = %err, "debug mirror write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Shared {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("sink gone"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn escapes_control_pictures() {
        assert_eq!(escape_wire("a b\r\n\x1b[0m"), "a␣b␍␤␛[0m");
        assert_eq!(escape_wire("plain"), "plain");
        assert_eq!(escape_wire(""), "");
    }

    #[test]
    fn tags() {
        assert_eq!(Direction::Sent.tag(), ">>");
        assert_eq!(Direction::Received.tag(), "<<");
        assert_eq!(Direction::Info.to_string(), "**");
    }

    #[test]
    fn disabled_writes_nothing() {
        let sink = Shared::default();
        let mut mirror = DebugMirror::with_sink(false, sink.clone());
        mirror.record(Direction::Sent, "hidden");
        assert_eq!(sink.text(), "");
    }

    #[test]
    fn enabled_writes_one_line_per_record() {
        let sink = Shared::default();
        let mut mirror = DebugMirror::with_sink(true, sink.clone());
        mirror.record(Direction::Sent, "ls -l");
        mirror.record(Direction::Received, "a\nb\n$ ");
        assert_eq!(sink.text(), ">> ls␣-l\n<< a␤b␤$␣\n");
    }

    #[test]
    fn toggle_returns_new_state() {
        let mut mirror = DebugMirror::default();
        assert!(!mirror.is_enabled());
        assert!(mirror.set_enabled(true));
        assert!(mirror.is_enabled());
    }

    #[test]
    fn broken_sink_is_swallowed() {
        let mut mirror = DebugMirror::with_sink(true, Broken);
        mirror.record(Direction::Info, "still fine");
    }
}
