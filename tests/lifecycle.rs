//! Integration coverage for the session controller's universal invariants,
//! run against `cmd.exe` (always present on any Windows host) rather than
//! the bundled fixture executables a reference test suite might use.
//!
//! These tests only run on Windows; elsewhere `ConPty::run` always fails
//! against the `cfg(not(windows))` stub, which these tests are not written
//! to exercise.

#![cfg(windows)]

use conpty::{ConPty, Error, ReadLinesOptions, ReadOptions, RunOptions, WriteOptions};
use rstest::rstest;

fn init_subscriber() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[test]
fn constructor_with_valid_args_is_initialized_and_idle() {
    init_subscriber();
    let pty = ConPty::new();
    assert!(pty.is_initialized());
    assert!(!pty.is_running());
    assert_eq!(pty.width(), Some(80));
    assert_eq!(pty.height(), Some(24));
    assert_eq!(pty.exit_code(), None);
    assert_eq!(pty.last_error(), Error::NoProcessFound);
}

#[rstest]
#[case(80, 24)]
#[case(132, 43)]
#[case(1, 1)]
fn constructor_accepts_a_range_of_sizes(#[case] w: i32, #[case] h: i32) {
    let pty = ConPty::with_size(w, h);
    assert_eq!(pty.width(), Some(w));
    assert_eq!(pty.height(), Some(h));
}

#[test]
fn last_error_read_then_read_yields_none_second_time() {
    init_subscriber();
    let pty = ConPty::new();
    let _ = pty.exit_code();
    assert_eq!(pty.last_error(), Error::NoProcessFound);
    assert_eq!(pty.last_error(), Error::None);
}

#[test]
fn resize_clamps_to_valid_conpty_range() {
    let pty = ConPty::with_size(80, 24);
    assert!(pty.resize(0, 0));
    assert_eq!((pty.width(), pty.height()), (Some(1), Some(1)));

    assert!(pty.resize(40_000, 40_000));
    assert_eq!((pty.width(), pty.height()), (Some(32767), Some(32767)));
}

#[test]
fn running_child_reports_no_exit_code_and_already_running_error() {
    init_subscriber();
    let pty = ConPty::new();
    assert!(pty.run("cmd.exe /c pause", None));
    assert!(pty.is_running());
    assert_eq!(pty.exit_code(), None);
    assert_eq!(pty.last_error(), Error::ProcessAlreadyRunning);
    pty.kill();
}

#[test]
fn natural_exit_reports_runtime_success_for_a_zero_exit_code() {
    init_subscriber();
    let pty = ConPty::new();
    assert!(pty.run_and_wait("cmd.exe /c exit 0", None));
    assert!(!pty.is_running());
    assert!(pty.process_ended());
    assert_eq!(pty.exit_code(), Some(0));
    assert_eq!(pty.last_error(), Error::RuntimeSuccess);
}

#[test]
fn natural_exit_reports_runtime_error_for_a_nonzero_exit_code() {
    init_subscriber();
    let pty = ConPty::new();
    assert!(pty.run_and_wait("cmd.exe /c exit 7", None));
    assert_eq!(pty.exit_code(), Some(7));
    assert_eq!(pty.last_error(), Error::RuntimeError);
}

#[test]
fn kill_on_a_live_child_reports_forced_termination() {
    init_subscriber();
    let pty = ConPty::new();
    assert!(pty.run("cmd.exe /c pause", None));
    assert!(pty.is_running());
    assert!(pty.kill());
    assert!(!pty.is_running());
    assert_eq!(pty.last_error(), Error::ForcedTermination);
}

#[test]
fn written_bytes_are_observable_in_echoed_output_when_not_stripped() {
    init_subscriber();
    let pty = ConPty::new();
    assert!(pty.run("cmd.exe", None));
    assert!(pty.write_line("echo roundtrip-marker", Some(WriteOptions {
        waittillsent: true,
        ..WriteOptions::default()
    })));

    let mut opts = ReadOptions::default();
    opts.waitfor = 3.0;
    opts.min_bytes_to_read = 1;
    let output = pty.read(opts).unwrap_or_default();
    assert!(output.contains("roundtrip-marker"));
    pty.kill();
}

#[test]
fn stripinput_suppresses_the_immediately_echoed_prefix() {
    init_subscriber();
    let pty = ConPty::new();
    assert!(pty.run("cmd.exe", Some(RunOptions {
        stripinput: true,
        ..RunOptions::default()
    })));
    assert!(pty.write("echo hi\r\n", None));

    let mut opts = ReadOptions::default();
    opts.waitfor = 3.0;
    opts.min_bytes_to_read = 1;
    let output = pty.read(opts).unwrap_or_default();
    assert!(!output.starts_with("echo hi"));
    pty.kill();
}

#[test]
fn read_lines_returns_empty_once_drained() {
    init_subscriber();
    let pty = ConPty::new();
    assert!(pty.run_and_wait("cmd.exe /c echo one&& echo two", None));

    let mut opts = ReadLinesOptions::default();
    opts.waitfor = 2.0;
    let first = pty.read_lines(opts.clone()).unwrap_or_default();
    assert!(!first.is_empty());

    opts.waitfor = 0.0;
    let second = pty.read_lines(opts).unwrap_or_default();
    assert!(second.is_empty());
}

#[test]
fn vt_toggles_succeed_on_an_initialized_session() {
    init_subscriber();
    let pty = ConPty::new();
    assert!(pty.enable_vts());
    assert_eq!(pty.last_error(), Error::None);
    assert!(pty.disable_vts());
    assert_eq!(pty.last_error(), Error::None);
    assert!(pty.reset_display());
    assert_eq!(pty.last_error(), Error::None);
}

#[test]
fn write_line_appends_crlf_and_is_echoed() {
    init_subscriber();
    let pty = ConPty::new();
    assert!(pty.run("cmd.exe", None));
    assert!(pty.write_line("echo writeline-marker", None));

    let mut opts = ReadOptions::default();
    opts.waitfor = 3.0;
    opts.min_bytes_to_read = 1;
    let output = pty.read(opts).unwrap_or_default();
    assert!(output.contains("writeline-marker"));
    pty.kill();
}
