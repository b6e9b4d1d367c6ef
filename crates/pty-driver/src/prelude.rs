//! Convenient re-exports for common pty-driver usage.
//!
//! ```ignore
//! use pty_driver::prelude::*;
//! ```

pub use crate::capability::Interaction;
pub use crate::config::{
    ExpectOptions, LineEnding, ReadOptions, RetryOptions, SendOptions, SessionConfig,
};
pub use crate::error::{DriverError, Result};
pub use crate::pattern::{PatternEngine, RegexEngine};
pub use crate::session::Session;
pub use crate::sync::SyncSession;

#[cfg(unix)]
pub use crate::adapter::{Completed, Invocation};
#[cfg(unix)]
pub use crate::session::PtySession;
#[cfg(unix)]
pub use pty_spawn::{SpawnConfig, UnixPtyChild};
