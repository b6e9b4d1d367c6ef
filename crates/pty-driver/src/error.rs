//! Error types for pty-driver.
//!
//! Timeouts are not errors here: an idle `read` yields whatever arrived and an
//! `expect` that never matches yields `None`. Errors are reserved for misuse
//! (no prompt, bad pattern, no terminal) and for the stream or process going
//! away underneath a session.

use thiserror::Error;

/// Maximum length of buffer content to display in error messages.
const MAX_BUFFER_DISPLAY: usize = 500;

/// Context lines to show before/after truncation point.
const CONTEXT_LINES: usize = 3;

/// Format buffer content for display, truncating if necessary.
fn format_buffer_snippet(buffer: &str) -> String {
    if buffer.is_empty() {
        return "(empty buffer)".to_string();
    }

    let buffer_len = buffer.len();

    if buffer_len <= MAX_BUFFER_DISPLAY {
        return format!(
            "┌─ buffer ({} bytes) ──────────────────────\n│ {}\n└────────────────────────────────────────",
            buffer_len,
            buffer.lines().collect::<Vec<_>>().join("\n│ ")
        );
    }

    let lines: Vec<&str> = buffer.lines().collect();
    let total_lines = lines.len();

    if total_lines <= CONTEXT_LINES * 2 {
        return format!(
            "┌─ buffer ({} bytes, {} lines) ─────────────\n│ {}\n└────────────────────────────────────────",
            buffer_len,
            total_lines,
            lines.join("\n│ ")
        );
    }

    // Keep the tail; the end of the output is what was being waited on.
    let tail_lines = &lines[lines.len().saturating_sub(CONTEXT_LINES * 2)..];
    let hidden = total_lines - tail_lines.len();

    format!(
        "┌─ buffer ({} bytes, {} lines) ─────────────\n│ ... ({} lines hidden)\n│ {}\n└────────────────────────────────────────",
        buffer_len,
        total_lines,
        hidden,
        tail_lines.join("\n│ ")
    )
}

fn format_eof_error(buffer: &str) -> String {
    let buffer_snippet = format_buffer_snippet(buffer);

    format!(
        "stream closed before the operation finished\n\
         \n\
         {buffer_snippet}"
    )
}

/// The main error type for session operations.
#[derive(Debug, Error)]
pub enum DriverError {
    /// A prompt-dependent operation ran before any prompt was set.
    #[error("no expected prompt configured; call set_expected_prompt first")]
    NoPromptConfigured,

    /// Invalid configuration value or file.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// A pattern failed to compile.
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern {
        /// The pattern source.
        pattern: String,
        /// What the engine reported.
        message: String,
    },

    /// A mode change was requested on a session with no terminal attached.
    #[error("{operation}: session has no terminal attached")]
    NotATerminal {
        /// The mode operation (`set_raw`, `set_cooked`, `set_echo`).
        operation: &'static str,
    },

    /// The terminal rejected a mode change.
    #[error("{operation} failed: {source}")]
    TerminalMode {
        /// The mode operation.
        operation: &'static str,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An I/O error occurred with additional context.
    #[error("{context}: {source}")]
    IoWithContext {
        /// What operation was being performed.
        context: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The input stream reached end of file mid-operation.
    #[error("{}", format_eof_error(buffer))]
    Eof {
        /// Text accumulated before the stream closed.
        buffer: String,
    },

    /// Spawning the child process failed.
    #[cfg(unix)]
    #[error("failed to spawn process: {0}")]
    Spawn(#[from] pty_spawn::PtyError),

    /// An invocation precondition rejected the call.
    #[error("precondition failed: {message}")]
    Precondition {
        /// Why the invocation was refused.
        message: String,
    },
}

/// Result type alias for pty-driver operations.
pub type Result<T> = std::result::Result<T, DriverError>;

impl DriverError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid pattern error.
    pub fn invalid_pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Create an EOF error.
    pub fn eof(buffer: impl Into<String>) -> Self {
        Self::Eof {
            buffer: buffer.into(),
        }
    }

    /// Create a precondition error.
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }

    /// Create an I/O error with context.
    pub fn io_context(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoWithContext {
            context: context.into(),
            source,
        }
    }

    /// Wrap an I/O result with context.
    pub fn with_io_context<T>(result: std::io::Result<T>, context: impl Into<String>) -> Result<T> {
        result.map_err(|e| Self::io_context(context, e))
    }

    /// Check if this is an EOF error.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self, Self::Eof { .. })
    }

    /// Check if this error reports caller misuse rather than a runtime failure.
    #[must_use]
    pub const fn is_usage(&self) -> bool {
        matches!(
            self,
            Self::NoPromptConfigured
                | Self::Config { .. }
                | Self::InvalidPattern { .. }
                | Self::NotATerminal { .. }
        )
    }

    /// Get the buffer contents if this error contains them.
    #[must_use]
    pub fn buffer(&self) -> Option<&str> {
        match self {
            Self::Eof { buffer } => Some(buffer),
            _ => None,
        }
    }
}
