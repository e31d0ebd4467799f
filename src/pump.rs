//! Output pump: the background worker that drains a running child's output
//! pipe into the session's `output_buffer`.
//!
//! ConPTY never closes the output pipe on child exit, so the pump combines
//! an `is_running` poll with a drain tail (`postenddelay`) to decide when a
//! child is really done producing output. `postenddelay < 0.0` skips the
//! drain tail entirely (used by `kill()`).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::platform::{RawPty, ReadOutcome};
use crate::state::{SessionFlags, Shared};

pub struct Pump {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Pump {
    /// Spawn a pump thread draining `pty` into `shared`'s output buffer.
    /// `generation` pins this pump to the child that was current when `run`
    /// started it.
    pub fn spawn(
        shared: Arc<Shared>,
        pty: Arc<RawPty>,
        internaltimedelta: f64,
        postenddelay: f64,
        generation: u64,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_for_thread = stop.clone();

        let handle = thread::spawn(move || {
            pump_loop(shared, pty, internaltimedelta, postenddelay, generation, stop_for_thread);
        });

        Pump {
            stop,
            handle: Some(handle),
        }
    }

    /// Ask the pump to stop at its next poll iteration.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Block until the pump thread has exited.
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Pump {
    fn drop(&mut self) {
        self.request_stop();
        self.join();
    }
}

fn pump_loop(
    shared: Arc<Shared>,
    pty: Arc<RawPty>,
    internaltimedelta: f64,
    postenddelay: f64,
    generation: u64,
    stop: Arc<AtomicBool>,
) {
    tracing::debug!(generation, "output pump starting");
    let mut buffer = vec![0u8; 4096];
    let mut exit_observed_at: Option<Instant> = None;

    loop {
        if stop.load(Ordering::SeqCst) {
            tracing::debug!(generation, "output pump stop requested");
            return;
        }

        {
            let state = shared.state.lock().unwrap_or_else(|e| e.into_inner());
            if state.generation != generation || state.flags.contains(SessionFlags::PROCESS_ENDED)
            {
                return;
            }
        }

        if internaltimedelta > 0.0 {
            thread::sleep(Duration::from_secs_f64(internaltimedelta));
        }

        match pty.try_read(&mut buffer) {
            Ok(ReadOutcome::Data(n)) if n > 0 => {
                let mut state = shared.state.lock().unwrap_or_else(|e| e.into_inner());
                if state.generation == generation {
                    state.output_buffer.extend_from_slice(&buffer[..n]);
                }
                drop(state);
                shared.cond.notify_all();
                exit_observed_at = None;
                continue;
            }
            Ok(ReadOutcome::Eof) => {
                finalize(&shared, &pty, generation);
                return;
            }
            _ => {}
        }

        let killed = {
            let state = shared.state.lock().unwrap_or_else(|e| e.into_inner());
            state.flags.contains(SessionFlags::KILLED)
        };

        if !pty.is_running() || killed {
            let effective_postenddelay = if killed { -1.0 } else { postenddelay };
            if effective_postenddelay < 0.0 {
                finalize(&shared, &pty, generation);
                return;
            }
            let started_at = *exit_observed_at.get_or_insert_with(Instant::now);
            if started_at.elapsed().as_secs_f64() >= effective_postenddelay {
                finalize(&shared, &pty, generation);
                return;
            }
        }
    }
}

fn finalize(shared: &Shared, pty: &RawPty, generation: u64) {
    let mut state = shared.state.lock().unwrap_or_else(|e| e.into_inner());
    if state.generation != generation || state.flags.contains(SessionFlags::PROCESS_ENDED) {
        return;
    }

    let killed = state.flags.contains(SessionFlags::KILLED);
    let exit_code = pty.exit_code();
    state.exit_code = exit_code;
    state.flags.remove(SessionFlags::RUNNING);
    state.flags.insert(SessionFlags::PROCESS_ENDED);
    drop(state);

    // The natural-exit-vs-killed-vs-running-vs-no-child outcome is
    // synthesized on demand by `ConPty::exit_code`, not written here; the
    // pump only owns the raw exit code and lifecycle flags.
    tracing::debug!(generation, ?exit_code, killed, "child process ended");
    shared.cond.notify_all();
}
