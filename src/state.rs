//! Shared session state: the single mutex every mutating operation (reader,
//! writer, lifecycle call, and the background pump) serializes through.

use std::sync::{Arc, Condvar, Mutex};

use bitflags::bitflags;

use crate::error::LastErrorCell;
use crate::platform::RawPty;

bitflags! {
    /// The session's independent boolean flags, packed into one value the
    /// way `wtmux::core::term::state::TerminalModes` packs a terminal's mode
    /// bits.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct SessionFlags: u8 {
        /// ConPTY + pipes were successfully provisioned.
        const INITIALIZED  = 0b0000_0001;
        /// A child exists and the OS reports it still alive.
        const RUNNING      = 0b0000_0010;
        /// A child was started and has since exited, by any cause.
        const PROCESS_ENDED = 0b0000_0100;
        /// Every byte of the most recent write has reached the input pipe.
        const INPUT_SENT    = 0b0000_1000;
        /// Reader operations should suppress echoed input from output.
        const STRIP_INPUT   = 0b0001_0000;
        /// `kill()` has been invoked for the current child; tells the pump
        /// to finalize immediately instead of waiting out `postenddelay`.
        const KILLED        = 0b0010_0000;
    }
}

/// The session's mutable state, guarded by [`Shared::state`].
pub struct SessionState {
    pub flags: SessionFlags,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub pty: Option<Arc<RawPty>>,
    pub exit_code: Option<u32>,
    pub output_buffer: Vec<u8>,
    /// Bytes from the most recent `write`/`sendinput` call not yet flushed
    /// to the pipe by a background flusher, and the bytes already flushed
    /// that a reader should strip from echoed output when `strip_input` is
    /// set.
    pub pending_input: Vec<u8>,
    pub last_flushed_input: Vec<u8>,
    /// Bumped on every successful `run`; lets a pump thread from a previous
    /// child notice it has been superseded and exit without touching the
    /// new child's state.
    pub generation: u64,
}

impl SessionState {
    pub fn uninitialized() -> Self {
        Self {
            flags: SessionFlags::empty(),
            width: None,
            height: None,
            pty: None,
            exit_code: None,
            output_buffer: Vec::new(),
            pending_input: Vec::new(),
            last_flushed_input: Vec::new(),
            generation: 0,
        }
    }
}

/// The session's lock, wait condition, and `last_error` cell, shared between
/// the [`crate::ConPty`] facade and its background pump thread.
pub struct Shared {
    pub state: Mutex<SessionState>,
    pub cond: Condvar,
    pub last_error: LastErrorCell,
}

impl Shared {
    pub fn new(width: Option<i32>, height: Option<i32>) -> Arc<Self> {
        let mut state = SessionState::uninitialized();
        state.width = width;
        state.height = height;
        if width.is_some() {
            state.flags.insert(SessionFlags::INITIALIZED);
        }
        Arc::new(Self {
            state: Mutex::new(state),
            cond: Condvar::new(),
            last_error: LastErrorCell::new(),
        })
    }
}
