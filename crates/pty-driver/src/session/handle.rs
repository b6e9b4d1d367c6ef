//! The session handle.

use std::io::Write;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{Duration, Instant};

use crate::config::{ExpectOptions, ReadOptions, RetryOptions, SendOptions, SessionConfig};
use crate::debug::{DebugMirror, Direction};
use crate::error::{DriverError, Result};
use crate::pattern::{PatternEngine, RegexEngine};
use crate::terminal::TerminalControl;

/// Bytes requested per read while waiting for a match or an echo.
const CHUNK_SIZE: usize = 4096;

/// An interactive session with a child process.
///
/// Owns the two halves of the conversation: `reader` yields what the child
/// prints and `writer` feeds the child's input. Optionally holds a handle to
/// the terminal in between, for mode changes.
///
/// Every operation takes `&mut self`, so a session runs one operation at a
/// time. Run many sessions concurrently for parallelism.
pub struct Session<R, W, E: PatternEngine = RegexEngine> {
    reader: R,
    writer: W,
    engine: E,
    terminal: Option<Box<dyn TerminalControl>>,
    expected_prompt: Option<E::Pattern>,
    mirror: DebugMirror,
    config: SessionConfig,
}

impl<R, W, E> std::fmt::Debug for Session<R, W, E>
where
    E: PatternEngine,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("expected_prompt", &self.expected_prompt)
            .field("terminal", &self.terminal.is_some())
            .field("mirror", &self.mirror)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<R, W> Session<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Create a session over `reader`/`writer` with default configuration.
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_config(reader, writer, SessionConfig::default())
    }

    /// Create a session with the given configuration.
    pub fn with_config(reader: R, writer: W, config: SessionConfig) -> Self {
        Self::with_engine(reader, writer, RegexEngine::default(), config)
    }
}

impl<R, W, E> Session<R, W, E>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
    E: PatternEngine,
{
    /// Create a session with a custom pattern engine.
    pub fn with_engine(reader: R, writer: W, engine: E, config: SessionConfig) -> Self {
        Self {
            reader,
            writer,
            engine,
            terminal: None,
            expected_prompt: None,
            mirror: DebugMirror::stderr(config.debug),
            config,
        }
    }

    /// Attach the terminal that `set_raw`, `set_cooked` and `set_echo` act on.
    #[must_use]
    pub fn with_terminal(mut self, terminal: impl TerminalControl + 'static) -> Self {
        self.terminal = Some(Box::new(terminal));
        self
    }

    /// Send debug records to `sink` instead of standard error.
    #[must_use]
    pub fn with_debug_sink(mut self, sink: impl Write + Send + 'static) -> Self {
        self.mirror.set_sink(sink);
        self
    }

    /// Get the session configuration.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The pattern engine.
    #[must_use]
    pub const fn engine(&self) -> &E {
        &self.engine
    }

    /// The expected prompt, if one has been set.
    #[must_use]
    pub const fn expected_prompt(&self) -> Option<&E::Pattern> {
        self.expected_prompt.as_ref()
    }

    /// Whether a terminal handle is attached.
    #[must_use]
    pub fn has_terminal(&self) -> bool {
        self.terminal.is_some()
    }

    /// Whether the debug mirror is on.
    #[must_use]
    pub const fn is_debug(&self) -> bool {
        self.mirror.is_enabled()
    }

    /// `read` options from this session's configuration.
    #[must_use]
    pub const fn read_options(&self) -> ReadOptions {
        self.config.read_options()
    }

    /// `expect` options from this session's configuration.
    #[must_use]
    pub const fn expect_options(&self) -> ExpectOptions {
        self.config.expect_options()
    }

    /// `send_and_expect` options from this session's configuration.
    #[must_use]
    pub const fn send_options(&self) -> SendOptions {
        self.config.send_options()
    }

    /// `send_and_expect_until` options from this session's configuration.
    #[must_use]
    pub const fn retry_options(&self) -> RetryOptions {
        self.config.retry_options()
    }

    /// Take the streams back.
    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }

    // --- Mode control ---

    /// Put the terminal in raw mode.
    pub fn set_raw(&mut self) -> Result<()> {
        const OP: &str = "set_raw";
        self.terminal(OP)?
            .set_raw()
            .map_err(|source| DriverError::TerminalMode { operation: OP, source })
    }

    /// Put the terminal in cooked mode.
    pub fn set_cooked(&mut self) -> Result<()> {
        const OP: &str = "set_cooked";
        self.terminal(OP)?
            .set_cooked()
            .map_err(|source| DriverError::TerminalMode { operation: OP, source })
    }

    /// Turn local echo on or off; returns the value applied.
    pub fn set_echo(&mut self, enabled: bool) -> Result<bool> {
        const OP: &str = "set_echo";
        self.terminal(OP)?
            .set_echo(enabled)
            .map_err(|source| DriverError::TerminalMode { operation: OP, source })?;
        Ok(enabled)
    }

    /// Turn the debug mirror on or off; returns the new state.
    pub const fn set_debug(&mut self, enabled: bool) -> bool {
        self.mirror.set_enabled(enabled)
    }

    fn terminal(&mut self, operation: &'static str) -> Result<&mut (dyn TerminalControl + 'static)> {
        match self.terminal.as_deref_mut() {
            Some(terminal) => {
                tracing::debug!(operation, "changing terminal mode");
                Ok(terminal)
            }
            None => Err(DriverError::NotATerminal { operation }),
        }
    }

    // --- Raw I/O ---

    /// Write `message` as-is and flush. Returns the number of bytes written.
    ///
    /// Nothing is appended and nothing is mirrored.
    pub async fn write(&mut self, message: &str) -> Result<usize> {
        if message.is_empty() {
            return Ok(0);
        }
        self.send_bytes(message.as_bytes()).await?;
        Ok(message.len())
    }

    /// Write `message` followed by the configured line ending.
    pub async fn write_line(&mut self, message: &str) -> Result<()> {
        let mut data = String::with_capacity(message.len() + 2);
        data.push_str(message);
        data.push_str(self.config.line_ending.as_str());
        self.send_bytes(data.as_bytes()).await?;
        self.mirror.record(Direction::Sent, message);
        Ok(())
    }

    /// Read whatever the child prints until it goes quiet for
    /// `options.timeout`.
    ///
    /// Each wake-up takes at most `options.max_bytes`. Silence is not an
    /// error: a quiet child yields an empty string. End of file with text
    /// already collected ends the read early with that text; end of file
    /// with nothing collected is [`DriverError::Eof`], so a closed stream
    /// never looks like a quiet one.
    pub async fn read(&mut self, options: ReadOptions) -> Result<String> {
        if options.max_bytes == 0 {
            return Ok(String::new());
        }

        let mut collected = Vec::new();
        let mut buf = vec![0u8; options.max_bytes.min(CHUNK_SIZE)];
        loop {
            match tokio::time::timeout(options.timeout, self.reader.read(&mut buf)).await {
                Err(_) => break,
                Ok(Ok(0)) if collected.is_empty() => {
                    tracing::debug!("read hit end of file");
                    return Err(DriverError::eof(""));
                }
                Ok(Ok(0)) => {
                    tracing::debug!(bytes = collected.len(), "read hit end of file");
                    break;
                }
                Ok(Ok(n)) => collected.extend_from_slice(&buf[..n]),
                Ok(Err(e)) => return Err(DriverError::io_context("reading from process", e)),
            }
        }

        let text = String::from_utf8_lossy(&collected).into_owned();
        tracing::trace!(bytes = collected.len(), "read complete");
        self.mirror.record(Direction::Received, &text);
        Ok(text)
    }

    // --- Pattern expectation ---

    /// Compile `source` and make it the expected prompt.
    pub fn set_expected_prompt(&mut self, source: &str) -> Result<&E::Pattern> {
        let pattern = self.engine.compile(source)?;
        Ok(self.set_expected_prompt_pattern(pattern))
    }

    /// Make an already compiled pattern the expected prompt.
    pub fn set_expected_prompt_pattern(&mut self, pattern: E::Pattern) -> &E::Pattern {
        tracing::debug!(prompt = self.engine.source(&pattern), "expected prompt set");
        self.expected_prompt.insert(pattern)
    }

    /// Wait for `pattern` to appear in the child's output.
    ///
    /// Returns everything read from the start of the call through the end of
    /// the first match, or `None` if `options.timeout` passes first. Output
    /// that arrived after the match in the same read is dropped.
    pub async fn expect(&mut self, pattern: &str, options: ExpectOptions) -> Result<Option<String>> {
        let pattern = self.engine.compile(pattern)?;
        self.expect_pattern(&pattern, options).await
    }

    /// [`expect`](Self::expect) with a precompiled pattern.
    pub async fn expect_pattern(
        &mut self,
        pattern: &E::Pattern,
        options: ExpectOptions,
    ) -> Result<Option<String>> {
        let deadline = deadline_after(options.timeout);
        let mut collected = Vec::new();
        let mut buf = [0u8; CHUNK_SIZE];

        tracing::debug!(
            pattern = self.engine.source(pattern),
            timeout = ?options.timeout,
            "expecting"
        );

        loop {
            match read_until(&mut self.reader, &mut buf, deadline).await {
                None => break,
                Some(Ok(0)) => {
                    return Err(DriverError::eof(String::from_utf8_lossy(&collected)));
                }
                Some(Ok(n)) => {
                    collected.extend_from_slice(&buf[..n]);
                    // Always search the whole accumulator; a match may span reads.
                    let text = String::from_utf8_lossy(&collected);
                    if let Some(span) = self.engine.find(pattern, &text) {
                        let matched = text[..span.end].to_string();
                        tracing::debug!(
                            pattern = self.engine.source(pattern),
                            bytes = matched.len(),
                            "pattern matched"
                        );
                        self.mirror.record(Direction::Received, &matched);
                        return Ok(Some(matched));
                    }
                    if is_past(deadline) {
                        break;
                    }
                }
                Some(Err(e)) => return Err(DriverError::io_context("reading from process", e)),
            }
        }

        tracing::debug!(
            pattern = self.engine.source(pattern),
            bytes = collected.len(),
            "expect timed out"
        );
        Ok(None)
    }

    // --- Compound operations ---

    /// Send `message` as a line and wait for the expected prompt.
    ///
    /// Returns the output up to and including the prompt, minus one trailing
    /// prompt occurrence unless `options.keep_prompt` is set. Fails with
    /// [`DriverError::NoPromptConfigured`] before touching the streams if no
    /// prompt was set.
    pub async fn send_and_expect(
        &mut self,
        message: &str,
        options: SendOptions,
    ) -> Result<Option<String>> {
        let prompt = self.require_prompt()?;
        self.write_line(message).await?;

        let expect = ExpectOptions::default().timeout(options.timeout);
        let Some(mut reply) = self.expect_pattern(&prompt, expect).await? else {
            return Ok(None);
        };
        if !options.keep_prompt
            && let Some(span) = self.engine.find_trailing(&prompt, &reply)
        {
            reply.truncate(span.start);
        }
        Ok(Some(reply))
    }

    /// Re-send `message` until a reply contains `pattern`.
    ///
    /// Makes at most `options.limit` attempts of
    /// [`send_and_expect`](Self::send_and_expect), sleeping
    /// `options.interval` between them, and returns the first reply in which
    /// `pattern` is found. `None` when every attempt misses.
    pub async fn send_and_expect_until(
        &mut self,
        message: &str,
        pattern: &str,
        options: RetryOptions,
    ) -> Result<Option<String>> {
        self.require_prompt()?;
        let wanted = self.engine.compile(pattern)?;

        for attempt in 1..=options.limit {
            if attempt > 1 {
                tokio::time::sleep(options.interval).await;
            }

            if let Some(reply) = self.send_and_expect(message, options.send_options()).await?
                && self.engine.find(&wanted, &reply).is_some()
            {
                tracing::debug!(attempt, pattern, "retry loop matched");
                return Ok(Some(reply));
            }
            tracing::debug!(attempt, limit = options.limit, pattern, "no match yet");
        }

        Ok(None)
    }

    /// Type `message` one character at a time, waiting for each to echo.
    ///
    /// Stale output is drained first with [`read`](Self::read) using
    /// `options`. Each character then gets the configured echo timeout to
    /// show up in the output; if one does not, typing stops and `None` is
    /// returned with nothing re-sent. After the last character the line
    /// ending is written.
    pub async fn type_in(&mut self, message: &str, options: ReadOptions) -> Result<Option<String>> {
        let _stale = self.read(options).await?;

        let echo_timeout = self.config.echo_timeout;
        let mut encoded = [0u8; 4];
        for ch in message.chars() {
            let bytes = ch.encode_utf8(&mut encoded).as_bytes();
            self.send_bytes(bytes).await?;
            if !self.wait_for_echo(bytes, echo_timeout).await? {
                tracing::debug!(character = ?ch, timeout = ?echo_timeout, "no echo");
                self.mirror
                    .record(Direction::Info, &format!("no echo for {ch:?}"));
                return Ok(None);
            }
        }

        self.send_bytes(self.config.line_ending.as_bytes()).await?;
        self.mirror.record(Direction::Sent, message);
        Ok(Some(message.to_string()))
    }

    // --- Internals ---

    fn require_prompt(&self) -> Result<E::Pattern> {
        self.expected_prompt
            .clone()
            .ok_or(DriverError::NoPromptConfigured)
    }

    async fn send_bytes(&mut self, data: &[u8]) -> Result<()> {
        tracing::trace!(bytes = data.len(), "writing to process");
        self.writer
            .write_all(data)
            .await
            .map_err(|e| DriverError::io_context("writing to process", e))?;
        self.writer
            .flush()
            .await
            .map_err(|e| DriverError::io_context("flushing process input", e))
    }

    /// Read until `needle` shows up or `timeout` passes.
    async fn wait_for_echo(&mut self, needle: &[u8], timeout: Duration) -> Result<bool> {
        let deadline = deadline_after(timeout);
        let mut seen = Vec::new();
        let mut buf = [0u8; CHUNK_SIZE];

        loop {
            match read_until(&mut self.reader, &mut buf, deadline).await {
                None => return Ok(false),
                Some(Ok(0)) => return Err(DriverError::eof(String::from_utf8_lossy(&seen))),
                Some(Ok(n)) => {
                    seen.extend_from_slice(&buf[..n]);
                    if seen.windows(needle.len()).any(|w| w == needle) {
                        return Ok(true);
                    }
                    if is_past(deadline) {
                        return Ok(false);
                    }
                }
                Some(Err(e)) => return Err(DriverError::io_context("reading echo", e)),
            }
        }
    }
}

/// `None` when `timeout` is too large to represent: no deadline at all.
fn deadline_after(timeout: Duration) -> Option<Instant> {
    Instant::now().checked_add(timeout)
}

fn is_past(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|deadline| Instant::now() >= deadline)
}

/// One read, abandoned at `deadline`; `None` means the deadline passed.
///
/// The read is always polled once, so data that is already buffered is
/// returned even when the deadline is now or behind us.
async fn read_until<R>(
    reader: &mut R,
    buf: &mut [u8],
    deadline: Option<Instant>,
) -> Option<std::io::Result<usize>>
where
    R: AsyncRead + Unpin,
{
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, reader.read(buf)).await.ok(),
        None => Some(reader.read(buf).await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{DuplexStream, duplex};

    type Stub = Session<DuplexStream, DuplexStream>;

    /// A session wired to the "child" ends of two in-memory pipes.
    fn stub() -> (Stub, DuplexStream, DuplexStream) {
        let (from_child, child_out) = duplex(1024);
        let (to_child, child_in) = duplex(1024);
        (Session::new(from_child, to_child), child_out, child_in)
    }

    struct FakeTerminal {
        fail: bool,
    }

    impl TerminalControl for FakeTerminal {
        fn set_raw(&mut self) -> std::io::Result<()> {
            if self.fail {
                Err(std::io::Error::other("rejected"))
            } else {
                Ok(())
            }
        }
        fn set_cooked(&mut self) -> std::io::Result<()> {
            Ok(())
        }
        fn set_echo(&mut self, _enabled: bool) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn write_empty_is_zero() {
        let (mut session, _out, _in) = stub();
        assert_eq!(session.write("").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn write_returns_byte_count() {
        let (mut session, _out, mut child_in) = stub();
        assert_eq!(session.write("héllo").await.unwrap(), 6);
        let mut buf = [0u8; 6];
        child_in.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, "héllo".as_bytes());
    }

    #[tokio::test(start_paused = true)]
    async fn read_zero_max_bytes_does_not_wait() {
        let (mut session, _out, _in) = stub();
        let start = Instant::now();
        let text = session
            .read(ReadOptions::default().max_bytes(0))
            .await
            .unwrap();
        assert_eq!(text, "");
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn read_last_words_then_eof() {
        let (mut session, mut child_out, _in) = stub();
        child_out.write_all(b"last words").await.unwrap();
        drop(child_out);

        let text = session.read(ReadOptions::default()).await.unwrap();
        assert_eq!(text, "last words");
        let err = session.read(ReadOptions::default()).await.unwrap_err();
        assert!(err.is_eof());
        assert_eq!(err.buffer(), Some(""));
    }

    #[tokio::test(start_paused = true)]
    async fn read_unbounded_max_bytes() {
        let (mut session, mut child_out, _in) = stub();
        child_out.write_all(b"plenty").await.unwrap();

        let text = session
            .read(ReadOptions::default().max_bytes(usize::MAX))
            .await
            .unwrap();
        assert_eq!(text, "plenty");
    }

    #[tokio::test(start_paused = true)]
    async fn expect_zero_timeout_sees_buffered_output() {
        let (mut session, mut child_out, _in) = stub();
        child_out.write_all(b"ready$ ").await.unwrap();

        let seen = session
            .expect(r"\$ ", ExpectOptions::default().timeout(Duration::ZERO))
            .await
            .unwrap();
        assert_eq!(seen.as_deref(), Some("ready$ "));
    }

    #[tokio::test(start_paused = true)]
    async fn expect_zero_timeout_with_nothing_buffered() {
        let (mut session, _out, _in) = stub();
        let start = Instant::now();
        let seen = session
            .expect(r"\$ ", ExpectOptions::default().timeout(Duration::ZERO))
            .await
            .unwrap();
        assert_eq!(seen, None);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn expect_with_unrepresentable_timeout_waits() {
        let (mut session, mut child_out, _in) = stub();
        let child = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            child_out.write_all(b"$ ").await.unwrap();
            child_out
        });

        let seen = session
            .expect(r"\$ ", ExpectOptions::default().timeout(Duration::MAX))
            .await
            .unwrap();
        assert_eq!(seen.as_deref(), Some("$ "));
        drop(child.await.unwrap());
    }

    #[test]
    fn deadline_saturates_to_none() {
        assert!(deadline_after(Duration::MAX).is_none());
        assert!(!is_past(None));
        assert!(deadline_after(Duration::from_secs(1)).is_some());
    }

    #[tokio::test]
    async fn mode_control_without_terminal() {
        let (mut session, _out, _in) = stub();
        assert!(matches!(
            session.set_raw(),
            Err(DriverError::NotATerminal { operation: "set_raw" })
        ));
        assert!(matches!(
            session.set_echo(true),
            Err(DriverError::NotATerminal { operation: "set_echo" })
        ));
    }

    #[tokio::test]
    async fn mode_control_with_terminal() {
        let (session, _out, _in) = stub();
        let mut session = session.with_terminal(FakeTerminal { fail: false });
        assert!(session.has_terminal());
        session.set_raw().unwrap();
        session.set_cooked().unwrap();
        assert!(!session.set_echo(false).unwrap());
    }

    #[tokio::test]
    async fn mode_failure_is_error() {
        let (session, _out, _in) = stub();
        let mut session = session.with_terminal(FakeTerminal { fail: true });
        assert!(matches!(
            session.set_raw(),
            Err(DriverError::TerminalMode { operation: "set_raw", .. })
        ));
    }

    #[tokio::test]
    async fn set_debug_returns_state() {
        let (mut session, _out, _in) = stub();
        assert!(!session.is_debug());
        assert!(session.set_debug(true));
        assert!(session.is_debug());
    }

    #[tokio::test]
    async fn invalid_prompt_is_rejected() {
        let (mut session, _out, _in) = stub();
        assert!(matches!(
            session.set_expected_prompt("(["),
            Err(DriverError::InvalidPattern { .. })
        ));
        assert!(session.expected_prompt().is_none());
    }

    #[tokio::test]
    async fn expect_eof_carries_buffer() {
        let (mut session, mut child_out, _in) = stub();
        child_out.write_all(b"partial").await.unwrap();
        drop(child_out);

        let err = session
            .expect("never", ExpectOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.buffer(), Some("partial"));
    }
}
