//! Option structs for the reader/writer/lifecycle facade.
//!
//! Each call shape that would otherwise take a long list of optional,
//! duck-typed keyword arguments (`waitfor`, `timedelta`, `rawdata`, ...)
//! instead gets a `#[derive(Clone, Debug)]` options struct, with a
//! `from_defaults` constructor seeded from a [`Defaults`] instance so a
//! session's loaded configuration — not just a single compiled-in constant —
//! backs every "caller omitted this" case.

use crate::defaults::Defaults;

/// Options for [`crate::ConPty::run`] / [`crate::ConPty::run_and_wait`].
#[derive(Clone, Debug)]
pub struct RunOptions {
    /// Suppress echoed input bytes from reader-visible output.
    pub stripinput: bool,
    /// Seconds to wait for the spawned child to report itself alive before
    /// `run` returns. `< 0` waits indefinitely; `0` polls once.
    pub waitfor: f64,
    /// Poll granularity, in seconds, while waiting for spawn confirmation.
    pub timedelta: f64,
    /// Pump poll granularity, in seconds.
    pub internaltimedelta: f64,
    /// Post-exit drain grace period, in seconds. `-1` disables the drain.
    pub postenddelay: f64,
}

impl RunOptions {
    pub fn from_defaults(d: &Defaults) -> Self {
        Self {
            stripinput: false,
            waitfor: d.waitfor,
            timedelta: d.timedelta,
            internaltimedelta: d.internaltimedelta,
            postenddelay: d.postenddelay,
        }
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::from_defaults(&Defaults::default())
    }
}

/// Options for [`crate::ConPty::read`] / [`crate::ConPty::read_line`].
#[derive(Clone, Debug)]
pub struct ReadOptions {
    /// Wait until at least this many bytes are available (0 = don't wait
    /// for a minimum).
    pub min_bytes_to_read: i64,
    /// Cap on the returned byte count (0 = unlimited).
    pub max_bytes_to_read: i64,
    /// Overall wait budget, in seconds. `< 0` unbounded, `0` poll-once.
    pub waitfor: f64,
    /// Poll granularity, in seconds.
    pub timedelta: f64,
    /// Return unmodified bytes (no VT-stripping, no trailing-space trim).
    pub rawdata: bool,
    /// Preserve ConPTY's screen-buffer padding spaces at the end of a line.
    pub trailingspaces: bool,
}

impl ReadOptions {
    pub fn from_defaults(d: &Defaults) -> Self {
        Self {
            min_bytes_to_read: 0,
            max_bytes_to_read: 0,
            waitfor: d.waitfor,
            timedelta: d.timedelta,
            rawdata: false,
            trailingspaces: false,
        }
    }

    /// The options `get_output` uses: wait for at least one byte, strip
    /// trailing padding spaces.
    pub fn for_get_output(d: &Defaults) -> Self {
        Self {
            min_bytes_to_read: 1,
            ..Self::from_defaults(d)
        }
    }
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self::from_defaults(&Defaults::default())
    }
}

/// Options for [`crate::ConPty::read_lines`].
#[derive(Clone, Debug)]
pub struct ReadLinesOptions {
    pub min_lines_to_read: i64,
    pub max_lines_to_read: i64,
    pub waitfor: f64,
    pub timedelta: f64,
    pub rawdata: bool,
}

impl ReadLinesOptions {
    pub fn from_defaults(d: &Defaults) -> Self {
        Self {
            min_lines_to_read: 0,
            max_lines_to_read: 0,
            waitfor: d.waitfor,
            timedelta: d.timedelta,
            rawdata: false,
        }
    }
}

impl Default for ReadLinesOptions {
    fn default() -> Self {
        Self::from_defaults(&Defaults::default())
    }
}

/// Options for `write`/`writeline`/`writelines`/`sendinput`.
#[derive(Clone, Debug)]
pub struct WriteOptions {
    pub waitfor: f64,
    pub timedelta: f64,
    /// Block until every byte has been flushed from the user-space buffer
    /// into the OS input pipe.
    pub waittillsent: bool,
}

impl WriteOptions {
    pub fn from_defaults(d: &Defaults) -> Self {
        Self {
            waitfor: d.waitfor,
            timedelta: d.timedelta,
            waittillsent: false,
        }
    }
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self::from_defaults(&Defaults::default())
    }
}
