//! Spawn configuration for PTY-attached children.
//!
//! [`SpawnConfig`] describes how the child is started: its environment,
//! working directory, initial window size and session setup.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;

/// Default window width in columns.
pub const DEFAULT_COLS: u16 = 80;

/// Default window height in rows.
pub const DEFAULT_ROWS: u16 = 24;

/// How the child's environment is assembled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EnvPolicy {
    /// Start from the parent's environment.
    #[default]
    Inherit,
    /// Start from an empty environment.
    Clear,
}

/// Configuration for spawning a child on a fresh PTY.
///
/// # Example
///
/// ```
/// use pty_spawn::SpawnConfig;
///
/// let config = SpawnConfig::builder()
///     .working_directory("/tmp")
///     .env("TERM", "dumb")
///     .window_size(132, 50)
///     .build();
/// assert_eq!(config.window_size.cols, 132);
/// ```
#[derive(Debug, Clone)]
pub struct SpawnConfig {
    /// Working directory for the child, or the parent's when `None`.
    pub working_directory: Option<PathBuf>,

    /// Base environment.
    pub env_policy: EnvPolicy,

    /// Variables set on top of the base environment.
    pub env_set: HashMap<OsString, OsString>,

    /// Variables removed from the base environment.
    pub env_remove: Vec<OsString>,

    /// Initial window size.
    pub window_size: WindowSize,

    /// Start the child in a new session with the PTY as its controlling terminal.
    pub controlling_terminal: bool,

    /// Kill the child when its handle is dropped.
    pub kill_on_drop: bool,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            working_directory: None,
            env_policy: EnvPolicy::Inherit,
            env_set: HashMap::new(),
            env_remove: Vec::new(),
            window_size: WindowSize::default(),
            controlling_terminal: true,
            kill_on_drop: true,
        }
    }
}

impl SpawnConfig {
    /// Create a builder starting from the defaults.
    #[must_use]
    pub fn builder() -> SpawnConfigBuilder {
        SpawnConfigBuilder::default()
    }

    /// The environment the child will see.
    #[must_use]
    pub fn effective_env(&self) -> HashMap<OsString, OsString> {
        let mut env: HashMap<OsString, OsString> = match self.env_policy {
            EnvPolicy::Inherit => std::env::vars_os().collect(),
            EnvPolicy::Clear => HashMap::new(),
        };

        env.extend(self.env_set.clone());

        for key in &self.env_remove {
            env.remove(key);
        }

        env
    }
}

/// Builder for [`SpawnConfig`].
#[derive(Debug, Clone, Default)]
pub struct SpawnConfigBuilder {
    config: SpawnConfig,
}

impl SpawnConfigBuilder {
    /// Set the working directory.
    #[must_use]
    pub fn working_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.working_directory = Some(path.into());
        self
    }

    /// Start from an empty environment instead of the parent's.
    #[must_use]
    pub fn env_clear(mut self) -> Self {
        self.config.env_policy = EnvPolicy::Clear;
        self
    }

    /// Set an environment variable.
    #[must_use]
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.config.env_set.insert(key.into(), value.into());
        self
    }

    /// Remove an environment variable.
    #[must_use]
    pub fn env_remove(mut self, key: impl Into<OsString>) -> Self {
        self.config.env_remove.push(key.into());
        self
    }

    /// Set the initial window size.
    #[must_use]
    pub const fn window_size(mut self, cols: u16, rows: u16) -> Self {
        self.config.window_size = WindowSize::new(cols, rows);
        self
    }

    /// Set whether the PTY becomes the child's controlling terminal.
    #[must_use]
    pub const fn controlling_terminal(mut self, value: bool) -> Self {
        self.config.controlling_terminal = value;
        self
    }

    /// Set whether dropping the child handle kills the child.
    #[must_use]
    pub const fn kill_on_drop(mut self, value: bool) -> Self {
        self.config.kill_on_drop = value;
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> SpawnConfig {
        self.config
    }
}

/// Signals that can be delivered to the child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PtySignal {
    /// SIGINT.
    Interrupt,
    /// SIGQUIT.
    Quit,
    /// SIGTERM.
    Terminate,
    /// SIGKILL.
    Kill,
    /// SIGHUP.
    Hangup,
}

impl PtySignal {
    /// The raw signal number.
    #[must_use]
    pub const fn as_raw(self) -> i32 {
        match self {
            Self::Interrupt => libc::SIGINT,
            Self::Quit => libc::SIGQUIT,
            Self::Terminate => libc::SIGTERM,
            Self::Kill => libc::SIGKILL,
            Self::Hangup => libc::SIGHUP,
        }
    }
}

/// PTY window size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    /// Columns.
    pub cols: u16,
    /// Rows.
    pub rows: u16,
}

impl WindowSize {
    /// Create a window size.
    #[must_use]
    pub const fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }
}

impl Default for WindowSize {
    fn default() -> Self {
        Self::new(DEFAULT_COLS, DEFAULT_ROWS)
    }
}

impl From<(u16, u16)> for WindowSize {
    fn from((cols, rows): (u16, u16)) -> Self {
        Self::new(cols, rows)
    }
}
