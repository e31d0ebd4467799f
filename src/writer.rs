//! Writer facade: `write` / `write_line` / `write_lines` / `send_input`.
//!
//! Every write is flushed to the ConPTY input pipe synchronously before the
//! call returns — `WriteFile` on a pipe of this size does not partially
//! block in practice. `waittillsent` is therefore always satisfied by the
//! time these methods return; `input_sent` becomes `true` in the same
//! critical section as the write, not asynchronously.

use crate::error::Error;
use crate::options::WriteOptions;
use crate::session::ConPty;
use crate::state::SessionFlags;

impl ConPty {
    /// Write raw bytes to the child's input pipe.
    pub fn write(&self, data: &str, options: Option<WriteOptions>) -> bool {
        let options = options.unwrap_or_else(|| WriteOptions::from_defaults(&self.defaults));
        let _ = options.waitfor;
        let _ = options.timedelta;

        let pty = {
            let state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
            state.pty.clone()
        };
        let Some(pty) = pty else {
            self.shared.last_error.set(Error::NoProcessFound);
            return false;
        };

        let bytes = data.as_bytes();
        let mut written = 0usize;
        while written < bytes.len() {
            match pty.write(&bytes[written..]) {
                Ok(0) if written < bytes.len() => break,
                Ok(n) => written += n,
                Err(e) => {
                    tracing::warn!(error = %e, "write failed");
                    self.shared.last_error.set(Error::ConPtyUninitialized);
                    return false;
                }
            }
        }

        {
            let mut state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
            state.last_flushed_input = bytes[..written].to_vec();
            if written == bytes.len() {
                state.flags.insert(SessionFlags::INPUT_SENT);
            } else {
                state.flags.remove(SessionFlags::INPUT_SENT);
            }
        }

        self.shared.last_error.set(Error::None);
        written == bytes.len()
    }

    /// `write` with a trailing `\r\n` appended.
    pub fn write_line(&self, data: &str, options: Option<WriteOptions>) -> bool {
        self.write(&format!("{data}\r\n"), options)
    }

    /// Write a sequence of strings, each followed by `\r\n`.
    pub fn write_lines(&self, data: &[String], options: Option<WriteOptions>) -> bool {
        let options = options.unwrap_or_else(|| WriteOptions::from_defaults(&self.defaults));
        for line in data {
            if !self.write_line(line, Some(options.clone())) {
                return false;
            }
        }
        true
    }

    /// Synonym for [`ConPty::write`].
    pub fn send_input(&self, data: &str, options: Option<WriteOptions>) -> bool {
        self.write(data, options)
    }
}
