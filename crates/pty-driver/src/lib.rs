//! pty-driver: expect-style sessions over pseudo-terminals.
//!
//! Spawn a prompt-driven program (a shell, a BMC console, a network device
//! CLI) on a PTY, send it input, and wait for its output to match a pattern,
//! all with timeouts instead of hangs.
//!
//! - [`Session`] is the core: send, read, expect, and the compound
//!   prompt-driven operations, over any pair of async streams.
//! - [`Interaction`] is the same surface as a trait.
//! - [`SyncSession`] is a blocking wrapper.
//! - [`adapter`] runs an interaction per invocation behind an explicit
//!   precondition.
//!
//! Not finding a pattern in time is an ordinary outcome (`None`), not an
//! error.
//!
//! # Example
//!
//! ```ignore
//! use pty_driver::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let spawn = SpawnConfig::builder().env("PS1", "$ ").build();
//!     let (mut session, _child) =
//!         Session::spawn("/bin/sh", ["-i"], &spawn, SessionConfig::from_env()?).await?;
//!
//!     session.set_expected_prompt(r"\$ ")?;
//!     session.expect(r"\$ ", session.expect_options()).await?;
//!
//!     let options = session.retry_options().limit(5);
//!     if let Some(reply) = session.send_and_expect_until("status", "READY", options).await? {
//!         println!("{reply}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod capability;
pub mod config;
pub mod debug;
pub mod error;
pub mod logging;
pub mod pattern;
pub mod prelude;
pub mod session;
pub mod sync;
pub mod terminal;

pub use capability::Interaction;
pub use config::{
    ExpectOptions, LineEnding, ReadOptions, RetryOptions, SendOptions, SessionConfig,
};
pub use debug::{DebugMirror, Direction};
pub use error::{DriverError, Result};
pub use pattern::{CompiledPattern, PatternCache, PatternEngine, RegexEngine, Span};
pub use session::Session;
pub use sync::{SyncSession, block_on};
pub use terminal::TerminalControl;

#[cfg(unix)]
pub use session::PtySession;

/// The PTY spawner, re-exported for callers that build sessions by hand.
#[cfg(unix)]
pub use pty_spawn;
