//! Reader facade: `read` / `read_line` / `read_lines` / `get_output`.
//!
//! All three consume destructively from the session's `output_buffer`
//! (the first reader to observe a byte removes it). Normalization
//! (VT-escape stripping, trailing-space trimming, echoed-input removal)
//! happens on the way out unless `rawdata` is set, per the open question
//! resolved in SPEC_FULL.md: raw disables stripping entirely.

use crate::error::Error;
use crate::options::{ReadLinesOptions, ReadOptions};
use crate::session::ConPty;
use crate::state::{SessionFlags, SessionState};
use crate::validate;

impl ConPty {
    /// Read up to `max_bytes_to_read` bytes (0 = unlimited), waiting for at
    /// least `min_bytes_to_read` to become available.
    pub fn read(&self, options: ReadOptions) -> Option<String> {
        if let Err(e) = validate::validate_read_byte_bounds(
            options.min_bytes_to_read,
            options.max_bytes_to_read,
        ) {
            self.shared.last_error.set(e);
            return None;
        }

        if validate::is_zero_read_request(options.min_bytes_to_read, options.max_bytes_to_read) {
            self.shared.last_error.set(Error::None);
            return Some(String::new());
        }

        let min = options.min_bytes_to_read.max(0) as usize;
        self.wait_until(options.waitfor, options.timedelta, |state| {
            state.output_buffer.len() >= min || ended(state)
        });

        let strip_input = {
            let state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
            state.flags.contains(SessionFlags::STRIP_INPUT)
        };

        let mut state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
        let take = if options.max_bytes_to_read > 0 {
            (options.max_bytes_to_read as usize).min(state.output_buffer.len())
        } else {
            state.output_buffer.len()
        };
        let bytes: Vec<u8> = state.output_buffer.drain(..take).collect();
        let echo_prefix = if strip_input && !options.rawdata {
            Some(state.last_flushed_input.clone())
        } else {
            None
        };
        drop(state);

        self.shared.last_error.set(Error::None);
        Some(normalize(
            bytes,
            echo_prefix.as_deref(),
            options.rawdata,
            options.trailingspaces,
        ))
    }

    /// One logical line, without its terminating newline. Returns an empty
    /// string (not `None`) if no complete line became available within
    /// `waitfor`.
    pub fn read_line(&self, options: ReadOptions) -> Option<String> {
        self.wait_until(options.waitfor, options.timedelta, |state| {
            state.output_buffer.contains(&b'\n') || ended(state)
        });

        let strip_input = {
            let state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
            state.flags.contains(SessionFlags::STRIP_INPUT)
        };

        let mut state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
        let line_ended = ended(&state);
        let bytes = match take_one_line(&mut state.output_buffer, line_ended) {
            Some(bytes) => bytes,
            None => {
                drop(state);
                self.shared.last_error.set(Error::None);
                return Some(String::new());
            }
        };
        let echo_prefix = if strip_input && !options.rawdata {
            Some(state.last_flushed_input.clone())
        } else {
            None
        };
        drop(state);

        self.shared.last_error.set(Error::None);
        Some(normalize(bytes, echo_prefix.as_deref(), options.rawdata, false))
    }

    /// An ordered sequence of complete lines, waiting for at least
    /// `min_lines_to_read` to become available (0 = don't wait for a
    /// minimum), capped at `max_lines_to_read` (0 = unlimited).
    pub fn read_lines(&self, options: ReadLinesOptions) -> Option<Vec<String>> {
        if let Err(e) = validate::validate_read_line_bounds(
            options.min_lines_to_read,
            options.max_lines_to_read,
        ) {
            self.shared.last_error.set(e);
            return None;
        }

        if validate::is_zero_read_request(options.min_lines_to_read, options.max_lines_to_read) {
            self.shared.last_error.set(Error::None);
            return Some(Vec::new());
        }

        let min = options.min_lines_to_read.max(0) as usize;
        self.wait_until(options.waitfor, options.timedelta, |state| {
            count_available_lines(&state.output_buffer, ended(state)) >= min || ended(state)
        });

        let strip_input = {
            let state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
            state.flags.contains(SessionFlags::STRIP_INPUT)
        };

        let mut state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
        let line_ended = ended(&state);
        let max = if options.max_lines_to_read > 0 {
            options.max_lines_to_read as usize
        } else {
            usize::MAX
        };

        let mut raw_lines = Vec::new();
        while raw_lines.len() < max {
            match take_one_line(&mut state.output_buffer, line_ended) {
                Some(line) => raw_lines.push(line),
                None => break,
            }
        }
        let echo_prefix = if strip_input {
            Some(state.last_flushed_input.clone())
        } else {
            None
        };
        drop(state);

        let lines = raw_lines
            .into_iter()
            .map(|bytes| normalize(bytes, echo_prefix.as_deref(), options.rawdata, false))
            .collect();

        self.shared.last_error.set(Error::None);
        Some(lines)
    }

    /// Sugar for `read` with `trailingspaces=false` and a natural
    /// wait-for-some-output heuristic.
    pub fn get_output(&self) -> Option<String> {
        self.read(ReadOptions::for_get_output(&self.defaults))
    }
}

fn ended(state: &SessionState) -> bool {
    state.flags.contains(SessionFlags::PROCESS_ENDED)
}

/// Remove and return the first complete line (up to and including `\n`, or
/// the whole remaining buffer if the process has ended and nothing is left
/// to arrive), stripped of its trailing `\r\n`/`\n`.
fn take_one_line(buffer: &mut Vec<u8>, process_ended: bool) -> Option<Vec<u8>> {
    if let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
        let mut line: Vec<u8> = buffer.drain(..=pos).collect();
        line.pop(); // '\n'
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        return Some(line);
    }
    if process_ended && !buffer.is_empty() {
        return Some(std::mem::take(buffer));
    }
    None
}

fn count_available_lines(buffer: &[u8], process_ended: bool) -> usize {
    let newlines = buffer.iter().filter(|&&b| b == b'\n').count();
    let has_trailing_partial = buffer
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|pos| pos + 1 < buffer.len())
        .unwrap_or(!buffer.is_empty());
    if process_ended && has_trailing_partial {
        newlines + 1
    } else {
        newlines
    }
}

fn normalize(
    mut bytes: Vec<u8>,
    echo_prefix: Option<&[u8]>,
    rawdata: bool,
    trailingspaces: bool,
) -> String {
    if rawdata {
        return String::from_utf8_lossy(&bytes).into_owned();
    }

    if let Some(prefix) = echo_prefix {
        if !prefix.is_empty() {
            if let Some(pos) = find_subslice(&bytes, prefix) {
                bytes.drain(pos..pos + prefix.len());
            }
        }
    }

    let stripped = strip_ansi_escapes::strip(&bytes);
    let text = String::from_utf8_lossy(&stripped).into_owned();

    if trailingspaces {
        text
    } else {
        trim_trailing_spaces_per_line(&text)
    }
}

fn trim_trailing_spaces_per_line(text: &str) -> String {
    text.split('\n')
        .map(|line| line.trim_end_matches(' '))
        .collect::<Vec<_>>()
        .join("\n")
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
