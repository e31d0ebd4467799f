//! End-to-end scenarios S1-S7. Each depends on a bundled fixture executable
//! (`short_silent_program.exe`, `error_program.exe`, `print_lines_of_text.exe`,
//! `print_long_line_of_text.exe`, `text_interaction.exe`,
//! `print_many_lines_of_text.exe`), none of which are available in this
//! environment. They are written against the exact contracts those
//! scenarios describe and marked `#[ignore]` with the missing fixture
//! named, rather than faked against a substitute binary that would validate
//! the wrong behavior. S3 is adapted to `ipconfig`, which ships on every
//! Windows host, and is not ignored.

#![cfg(windows)]

use conpty::{ConPty, Error, ReadOptions};

#[test]
fn s3_ipconfig_wait_then_complete() {
    let pty = ConPty::new();
    let mut opts = conpty::RunOptions::default();
    opts.waitfor = 2.5;
    assert!(pty.run("ipconfig", Some(opts)));
    assert!(pty.wait_to_complete(-1.0, 0.1));
    assert_eq!(pty.exit_code(), Some(0));
    assert_eq!(pty.last_error(), Error::RuntimeSuccess);
}

#[test]
#[ignore = "requires the short_silent_program.exe fixture"]
fn s1_silent_program_drain() {
    let pty = ConPty::new();
    assert!(pty.run("short_silent_program.exe", None));
    assert!(pty.run_and_wait("short_silent_program.exe", None));
    assert_eq!(pty.read(ReadOptions::default()), Some(String::new()));
    assert_eq!(pty.exit_code(), Some(0));
}

#[test]
#[ignore = "requires the error_program.exe fixture"]
fn s2_division_by_zero_reports_runtime_error() {
    let pty = ConPty::new();
    assert!(pty.run_and_wait("error_program.exe", None));
    assert_eq!(pty.exit_code(), Some(0xC000_0094));
    assert_eq!(pty.last_error(), Error::RuntimeError);
}

#[test]
#[ignore = "requires the print_lines_of_text.exe fixture"]
fn s4_multi_line_read_matches_exactly() {
    let pty = ConPty::new();
    assert!(pty.run_and_wait("print_lines_of_text.exe", None));
    let expected = "This is line 1 with newline.\n\
                    This is line 2 with newline.\n\
                    This is line 3 with newline.\n\n\
                    This is line 5 with newline.\n\
                    This is line 6 WITHOUT newline.";
    assert_eq!(pty.get_output().as_deref(), Some(expected));
}

#[test]
#[ignore = "requires the print_long_line_of_text.exe fixture"]
fn s5_resize_affects_wrap() {
    let pty = ConPty::new();
    assert!(pty.run_and_wait("print_long_line_of_text.exe", None));
    let wrapped = pty.get_output().unwrap_or_default();
    assert_eq!(wrapped.len(), 147);
    assert_eq!(wrapped.matches('\n').count(), 1);

    let pty = ConPty::with_size(147, 24);
    assert!(pty.run_and_wait("print_long_line_of_text.exe", None));
    let unwrapped = pty.get_output().unwrap_or_default();
    assert_eq!(unwrapped.len(), 146);
    assert!(!unwrapped.contains('\n'));
}

#[test]
#[ignore = "requires the text_interaction.exe fixture"]
fn s6_interactive_prompt_round_trip() {
    let pty = ConPty::new();
    assert!(pty.run(
        "text_interaction.exe",
        Some(conpty::RunOptions {
            stripinput: true,
            ..conpty::RunOptions::default()
        })
    ));
    assert_eq!(
        pty.get_output().as_deref(),
        Some("What is your name? ")
    );

    pty.write("Mr. Melwyn Francis Carlo", None);
    pty.write("\r\n", None);
    assert_eq!(
        pty.get_output().as_deref(),
        Some("Hi, Mr. Melwyn Francis Carlo! What's your age? ")
    );

    pty.send_input("100", None);
    assert_eq!(
        pty.get_output().as_deref(),
        Some("Hmm, so you will be 110 years old in 10 years.")
    );
}

#[test]
#[ignore = "requires the print_many_lines_of_text.exe fixture"]
fn s7_bulk_lines_then_drained() {
    let pty = ConPty::new();
    assert!(pty.run_and_wait("print_many_lines_of_text.exe", None));
    let lines = pty.read_lines(conpty::ReadLinesOptions::default()).unwrap();
    assert_eq!(lines.len(), 100);
    for (i, line) in lines.iter().enumerate() {
        let i = i + 1;
        assert_eq!(*line, format!("Log {}: This is line {}.", 100 + i, i));
    }
    assert_eq!(
        pty.read_lines(conpty::ReadLinesOptions::default()),
        Some(Vec::new())
    );
}
