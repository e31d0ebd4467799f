//! A reusable Windows pseudo-console (ConPTY) session.
//!
//! [`ConPty`] wraps `CreatePseudoConsole`/`CreateProcessW` and a background
//! output pump into a single synchronous facade: construct a session, `run`
//! a command against it, `read`/`write` while it's alive, `resize` it,
//! `kill` it or let it finish, then `run` the next command on the same
//! session. One `ConPty` hosts at most one child at a time; every public
//! method may be called from any thread.
//!
//! ```no_run
//! use conpty::ConPty;
//!
//! let pty = ConPty::new();
//! pty.run("cmd.exe", None);
//! pty.write_line("echo hello", None);
//! if let Some(output) = pty.get_output() {
//!     println!("{output}");
//! }
//! pty.kill();
//! ```
//!
//! Non-Windows builds compile against a stub platform adapter that reports
//! [`Error::ConPtyUninitialized`] for every platform operation, so the pure
//! session-state logic can be built and tested on any host.

mod defaults;
mod error;
mod options;
mod platform;
mod pump;
mod reader;
mod session;
mod state;
mod validate;
mod writer;

pub use defaults::Defaults;
pub use error::Error;
pub use options::{ReadLinesOptions, ReadOptions, RunOptions, WriteOptions};
pub use session::ConPty;
