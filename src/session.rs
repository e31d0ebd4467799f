//! Session controller / state machine.
//!
//! [`ConPty`] owns the pseudo-console, the child handle, the pump thread,
//! the input/output buffers, and the session's flags. It serializes every
//! mutating operation through [`Shared::state`]'s mutex and exposes the
//! synchronous facade described by the specification: any method may be
//! called from any thread, including while the pump thread is draining
//! output.
//!
//! State machine: `Uninitialized -> Idle -> Running -> Ended -> Idle`. Since
//! the public constructor takes typed, always-valid `i32` dimensions, the
//! `Uninitialized` state is unreachable from this crate's surface — every
//! `ConPty` is `Idle` immediately after construction (see the design note in
//! `error.rs` about type-safety retiring the dynamic-typing error kinds).

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::defaults::Defaults;
use crate::error::Error;
use crate::options::{ReadLinesOptions, ReadOptions, RunOptions, WriteOptions};
use crate::platform::RawPty;
use crate::pump::Pump;
use crate::state::{SessionFlags, SessionState, Shared};
use crate::validate;

/// A single ConPTY session: one pseudo-console hosting at most one child
/// process at a time, reusable across successive `run` calls.
pub struct ConPty {
    pub(crate) shared: Arc<Shared>,
    pub(crate) pump: Mutex<Option<Pump>>,
    pub(crate) defaults: Defaults,
}

impl Default for ConPty {
    fn default() -> Self {
        Self::new()
    }
}

impl ConPty {
    /// The pseudo-console size used when no explicit size is given.
    pub const DEFAULT_WIDTH: i32 = 80;
    pub const DEFAULT_HEIGHT: i32 = 24;

    /// Create a session with the default 80x24 pseudo-console size.
    pub fn new() -> Self {
        Self::with_size(Self::DEFAULT_WIDTH, Self::DEFAULT_HEIGHT)
    }

    /// Create a session with an explicit pseudo-console size, clamped to
    /// `[1, 32767]`.
    pub fn with_size(width: i32, height: i32) -> Self {
        let width = validate::clamp_dimension(width);
        let height = validate::clamp_dimension(height);
        let shared = Shared::new(Some(width), Some(height));
        shared.last_error.set(Error::None);
        Self {
            shared,
            pump: Mutex::new(None),
            defaults: Defaults::load(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.shared.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Wait until `predicate` holds, `waitfor` seconds elapse, or (for
    /// `waitfor == 0`) after a single check. `waitfor < 0` waits
    /// indefinitely. Returns the predicate's final value.
    pub(crate) fn wait_until(
        &self,
        waitfor: f64,
        timedelta: f64,
        mut predicate: impl FnMut(&SessionState) -> bool,
    ) -> bool {
        let mut state = self.lock();
        if predicate(&state) {
            return true;
        }
        if waitfor == 0.0 {
            return false;
        }

        let deadline = if waitfor < 0.0 {
            None
        } else {
            Some(Instant::now() + Duration::from_secs_f64(waitfor.max(0.0)))
        };
        let step = Duration::from_secs_f64(timedelta.max(0.0)).max(Duration::from_micros(100));

        loop {
            let wait_for = match deadline {
                Some(d) => {
                    let now = Instant::now();
                    if now >= d {
                        return predicate(&state);
                    }
                    step.min(d - now)
                }
                None => step,
            };

            let (guard, _timeout) = self
                .shared
                .cond
                .wait_timeout(state, wait_for)
                .unwrap_or_else(|e| e.into_inner());
            state = guard;

            if predicate(&state) {
                return true;
            }
            if let Some(d) = deadline {
                if Instant::now() >= d {
                    return predicate(&state);
                }
            }
        }
    }

    // ---- lifecycle queries -------------------------------------------------

    pub fn is_initialized(&self) -> bool {
        self.lock().flags.contains(SessionFlags::INITIALIZED)
    }

    pub fn is_running(&self) -> bool {
        self.lock().flags.contains(SessionFlags::RUNNING)
    }

    pub fn process_ended(&self) -> bool {
        self.lock().flags.contains(SessionFlags::PROCESS_ENDED)
    }

    pub fn input_sent(&self) -> bool {
        self.lock().flags.contains(SessionFlags::INPUT_SENT)
    }

    pub fn width(&self) -> Option<i32> {
        self.lock().width
    }

    pub fn height(&self) -> Option<i32> {
        self.lock().height
    }

    /// The child's captured exit code, or `None` while running or if no
    /// child was ever started.
    ///
    /// Sets `last_error` to `NoProcessFound` / `ProcessAlreadyRunning` in
    /// those respective cases. Once a child has ended, this is also where
    /// the natural-exit-vs-killed outcome is synthesized: `RuntimeSuccess`
    /// for a zero exit code, `RuntimeError` for any other, or
    /// `ForcedTermination` if the session's current child was killed.
    pub fn exit_code(&self) -> Option<u32> {
        let state = self.lock();
        if state.pty.is_none() {
            drop(state);
            self.shared.last_error.set(Error::NoProcessFound);
            return None;
        }
        if state.flags.contains(SessionFlags::RUNNING) {
            drop(state);
            self.shared.last_error.set(Error::ProcessAlreadyRunning);
            return None;
        }
        let code = state.exit_code;
        let killed = state.flags.contains(SessionFlags::KILLED);
        drop(state);
        self.shared.last_error.set(if killed {
            Error::ForcedTermination
        } else {
            match code {
                Some(0) => Error::RuntimeSuccess,
                _ => Error::RuntimeError,
            }
        });
        code
    }

    /// Read and clear the session's last recorded error.
    pub fn last_error(&self) -> Error {
        self.shared.last_error.take()
    }

    // ---- resize -------------------------------------------------------------

    pub fn resize(&self, width: i32, height: i32) -> bool {
        if !self.is_initialized() {
            self.shared.last_error.set(Error::ConPtyUninitialized);
            return false;
        }

        let width = validate::clamp_dimension(width);
        let height = validate::clamp_dimension(height);

        let pty = {
            let mut state = self.lock();
            state.width = Some(width);
            state.height = Some(height);
            state.pty.clone()
        };

        if let Some(pty) = pty {
            match pty.resize(width, height) {
                Ok(()) => {
                    self.shared.last_error.set(Error::None);
                    true
                }
                Err(e) => {
                    tracing::warn!(error = %e, "resize failed");
                    self.shared.last_error.set(Error::ConPtyUninitialized);
                    false
                }
            }
        } else {
            self.shared.last_error.set(Error::None);
            true
        }
    }

    // ---- run / run_and_wait / wait_to_complete / kill ----------------------

    /// Spawn `command` attached to this session's pseudo-console and start
    /// the output pump. Non-blocking with respect to the child's lifetime:
    /// only waits (up to `options.waitfor`) for the child to report itself
    /// alive, not for it to finish.
    pub fn run(&self, command: &str, options: Option<RunOptions>) -> bool {
        let options = options.unwrap_or_else(|| RunOptions::from_defaults(&self.defaults));

        if let Err(e) = validate::validate_command(command) {
            self.shared.last_error.set(e);
            return false;
        }

        if self.is_running() {
            self.shared.last_error.set(Error::ProcessAlreadyRunning);
            return false;
        }

        if let Some(mut pump) = self.pump.lock().unwrap_or_else(|e| e.into_inner()).take() {
            pump.request_stop();
            pump.join();
        }

        let (cols, rows) = {
            let state = self.lock();
            (
                state.width.unwrap_or(Self::DEFAULT_WIDTH),
                state.height.unwrap_or(Self::DEFAULT_HEIGHT),
            )
        };

        let pty = match RawPty::spawn(cols, rows, command) {
            Ok(p) => Arc::new(p),
            Err(e) => {
                tracing::info!(command, error = %e, "run failed to spawn child");
                self.shared.last_error.set(Error::RunProgramNotFound);
                return false;
            }
        };

        let generation = {
            let mut state = self.lock();
            state.generation += 1;
            state.pty = Some(pty.clone());
            state.output_buffer.clear();
            state.pending_input.clear();
            state.last_flushed_input.clear();
            state.exit_code = None;
            state.flags.remove(
                SessionFlags::PROCESS_ENDED | SessionFlags::KILLED | SessionFlags::INPUT_SENT,
            );
            state.flags.insert(SessionFlags::RUNNING);
            state.flags.set(SessionFlags::STRIP_INPUT, options.stripinput);
            state.generation
        };

        tracing::info!(command, cols, rows, generation, "child process started");

        let pump = Pump::spawn(
            self.shared.clone(),
            pty.clone(),
            options.internaltimedelta,
            options.postenddelay,
            generation,
        );
        *self.pump.lock().unwrap_or_else(|e| e.into_inner()) = Some(pump);

        self.wait_until(options.waitfor, options.timedelta, |state| {
            state.generation != generation
                || pty.is_running()
                || state.flags.contains(SessionFlags::PROCESS_ENDED)
        });

        self.shared.last_error.set(Error::None);
        true
    }

    /// `run` followed by a blocking wait for the child to finish.
    pub fn run_and_wait(&self, command: &str, options: Option<RunOptions>) -> bool {
        let options = options.unwrap_or_else(|| RunOptions::from_defaults(&self.defaults));
        let timedelta = options.timedelta;
        if !self.run(command, Some(options)) {
            return false;
        }
        self.wait_to_complete(-1.0, timedelta)
    }

    /// Block until the child has ended or `waitfor` seconds elapse.
    /// Vacuously `true` if no child has ever been started.
    ///
    /// Does not touch `last_error`: the natural-exit/killed outcome is
    /// synthesized by `exit_code()`, not produced here.
    pub fn wait_to_complete(&self, waitfor: f64, timedelta: f64) -> bool {
        self.wait_until(waitfor, timedelta, |state| {
            state.pty.is_none() || state.flags.contains(SessionFlags::PROCESS_ENDED)
        })
    }

    /// Forcibly terminate the running child, if any.
    pub fn kill(&self) -> bool {
        let pty = {
            let state = self.lock();
            state.pty.clone()
        };

        let Some(pty) = pty else {
            self.shared.last_error.set(Error::NoProcessFound);
            return false;
        };

        if !self.is_running() {
            self.shared.last_error.set(Error::RuntimeSuccess);
            return true;
        }

        {
            let mut state = self.lock();
            state.flags.insert(SessionFlags::KILLED);
        }
        self.shared.cond.notify_all();

        let terminated = pty.terminate(1).is_ok();
        let _ = pty.wait(50);

        {
            let mut state = self.lock();
            if !state.flags.contains(SessionFlags::PROCESS_ENDED) {
                state.exit_code = Some(pty.exit_code().unwrap_or(1));
                state.flags.remove(SessionFlags::RUNNING);
                state.flags.insert(SessionFlags::PROCESS_ENDED);
            }
        }
        self.shared.cond.notify_all();

        tracing::info!("child process killed");
        self.shared.last_error.set(Error::ForcedTermination);
        terminated
    }

    // ---- VT toggling --------------------------------------------------------

    /// Enable VT sequence processing on the host console.
    pub fn enable_vts(&self) -> bool {
        if !self.is_initialized() {
            self.shared.last_error.set(Error::ConPtyUninitialized);
            return false;
        }
        self.toggle_vt(true)
    }

    /// Disable VT sequence processing on the host console.
    pub fn disable_vts(&self) -> bool {
        if !self.is_initialized() {
            self.shared.last_error.set(Error::ConPtyUninitialized);
            return false;
        }
        self.toggle_vt(false)
    }

    /// Reset the host console's display mode to its state before this
    /// session touched it, and emit a terminal reset sequence.
    pub fn reset_display(&self) -> bool {
        if !self.is_initialized() {
            self.shared.last_error.set(Error::ConPtyUninitialized);
            return false;
        }
        match crate::platform::get_console_mode() {
            Ok(mode) => {
                let restored = mode & !crate::platform::VT_PROCESSING_BIT;
                match crate::platform::set_console_mode(restored) {
                    Ok(()) => {
                        self.shared.last_error.set(Error::None);
                        true
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "reset_display failed");
                        self.shared.last_error.set(Error::ConPtyUninitialized);
                        false
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "reset_display failed to read console mode");
                self.shared.last_error.set(Error::ConPtyUninitialized);
                false
            }
        }
    }

    fn toggle_vt(&self, enable: bool) -> bool {
        match crate::platform::get_console_mode() {
            Ok(mode) => {
                let updated = if enable {
                    mode | crate::platform::VT_PROCESSING_BIT
                } else {
                    mode & !crate::platform::VT_PROCESSING_BIT
                };
                match crate::platform::set_console_mode(updated) {
                    Ok(()) => {
                        self.shared.last_error.set(Error::None);
                        true
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "vt toggle failed");
                        self.shared.last_error.set(Error::ConPtyUninitialized);
                        false
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "vt toggle failed to read console mode");
                self.shared.last_error.set(Error::ConPtyUninitialized);
                false
            }
        }
    }
}

impl Drop for ConPty {
    fn drop(&mut self) {
        if let Some(mut pump) = self.pump.lock().unwrap_or_else(|e| e.into_inner()).take() {
            pump.request_stop();
            pump.join();
        }
        let pty = self.lock().pty.take();
        if let Some(pty) = pty {
            if pty.is_running() {
                let _ = pty.terminate(1);
            }
        }
    }
}
