//! Sessions: the read/match/timeout core.
//!
//! A [`Session`] drives one child process through a pair of async streams.
//! It knows nothing about how the child was started; on Unix,
//! [`Session::spawn`] is the shortcut that starts one on a fresh PTY.
//!
//! # Example
//!
//! ```ignore
//! use pty_driver::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let (mut session, _child) =
//!         Session::spawn("/bin/sh", ["-i"], &SpawnConfig::default(), SessionConfig::default())
//!             .await?;
//!     session.set_expected_prompt(r"\$ ")?;
//!     let reply = session
//!         .send_and_expect("echo hello", session.send_options())
//!         .await?;
//!     println!("{reply:?}");
//!     Ok(())
//! }
//! ```

mod handle;
#[cfg(unix)]
mod pty;

pub use handle::Session;
#[cfg(unix)]
pub use pty::PtySession;
