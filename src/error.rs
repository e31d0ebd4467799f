//! Closed error registry and the read-and-clear `last_error` cell.
//!
//! Every public [`crate::ConPty`] operation sets exactly one [`Error`] value
//! before returning: [`Error::None`] on success, or the most specific
//! diagnostic on failure. Reading `last_error` atomically resets it to
//! [`Error::None`] unless a later operation has already overwritten it.

use std::sync::Mutex;
use thiserror::Error as ThisError;

/// The closed set of outcomes a [`crate::ConPty`] operation can report.
///
/// Variants ending in `NotAnInt` / `NotANumber` / `NotABoolean` correspond to
/// a dynamically-typed argument validator. Rust's type system makes those
/// checks unreachable from the typed `ConPty` surface (a bad type is a
/// compile error, not a runtime value) — they are retained here only so the
/// registry stays exhaustive for any future untyped bridge layer.
#[derive(ThisError, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Error {
    #[default]
    #[error("no error")]
    None,

    #[error("ConPTY session is not initialized")]
    ConPtyUninitialized,

    #[error("console width is not an integer")]
    ConsoleWidthNotInt,
    #[error("console height is not an integer")]
    ConsoleHeightNotInt,

    #[error("command is not a string")]
    CommandNotAString,
    #[error("the requested program could not be found")]
    RunProgramNotFound,
    #[error("the requested program name is too long")]
    RunProgramNameTooLong,
    #[error("the command line is longer than 32766 characters")]
    CommandLongerThan32766Chars,

    #[error("stripinput is not a boolean")]
    StripInputNotABoolean,
    #[error("waitfor is not a number")]
    WaitForNotANumber,
    #[error("timedelta is not a number")]
    TimeDeltaNotANumber,
    #[error("internaltimedelta is not a number")]
    InternalTimeDeltaNotANumber,
    #[error("postenddelay is not a number")]
    PostEndDelayNotANumber,
    #[error("waittillsent is not a boolean")]
    WaitTillSentNotABoolean,
    #[error("rawdata is not a boolean")]
    RawDataNotABoolean,
    #[error("trailingspaces is not a boolean")]
    TrailingSpacesNotABoolean,

    #[error("max_bytes_to_read is not an integer")]
    MaxReadBytesNotAnInt,
    #[error("min_bytes_to_read is not an integer")]
    MinReadBytesNotAnInt,
    #[error("min_bytes_to_read is greater than max_bytes_to_read")]
    MinMoreThanMaxReadBytes,

    #[error("max_lines_to_read is not an integer")]
    MaxReadLinesNotAnInt,
    #[error("min_lines_to_read is not an integer")]
    MinReadLinesNotAnInt,
    #[error("min_lines_to_read is greater than max_lines_to_read")]
    MinMoreThanMaxReadLines,

    #[error("data is not a string")]
    DataNotAString,
    #[error("data is not a list of strings")]
    DataNotAListOfStrings,

    #[error("no child process exists for this session")]
    NoProcessFound,
    #[error("a child process is already running for this session")]
    ProcessAlreadyRunning,

    #[error("the child process exited successfully")]
    RuntimeSuccess,
    #[error("the child process exited with a non-zero or abnormal status")]
    RuntimeError,
    #[error("the child process was forcibly terminated")]
    ForcedTermination,
}

/// A `last_error` slot with read-and-clear semantics.
///
/// `take()` is the only read path: it returns the current value and resets
/// the cell to [`Error::None`] in the same critical section. `set()` always
/// overwrites, regardless of what was there before, so two consecutive reads
/// with no intervening operation yield `(x, None)` for free from "read
/// clears" plus "every operation writes exactly once before returning".
#[derive(Debug, Default)]
pub struct LastErrorCell(Mutex<Error>);

impl LastErrorCell {
    pub fn new() -> Self {
        Self(Mutex::new(Error::None))
    }

    pub fn set(&self, err: Error) {
        *self.0.lock().unwrap_or_else(|e| e.into_inner()) = err;
    }

    pub fn take(&self) -> Error {
        let mut guard = self.0.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::replace(&mut *guard, Error::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_clears_to_none() {
        let cell = LastErrorCell::new();
        cell.set(Error::RuntimeError);
        assert_eq!(cell.take(), Error::RuntimeError);
        assert_eq!(cell.take(), Error::None);
    }

    #[test]
    fn later_write_wins_over_stale_value() {
        let cell = LastErrorCell::new();
        cell.set(Error::NoProcessFound);
        cell.set(Error::ProcessAlreadyRunning);
        assert_eq!(cell.take(), Error::ProcessAlreadyRunning);
    }

    #[test]
    fn default_is_none() {
        assert_eq!(Error::default(), Error::None);
    }
}
