//! Platform adapter: the only module in this crate that touches OS calls.
//!
//! - **pty**: Windows ConPTY wrapper used when compiled for `cfg(windows)`.
//! - **stub**: a uniform-failure stand-in used on every other target, so
//!   the crate's pure-logic code and tests still build and run elsewhere.

#[cfg(windows)]
mod pty;
#[cfg(windows)]
pub use pty::*;

#[cfg(not(windows))]
mod stub;
#[cfg(not(windows))]
pub use stub::*;
