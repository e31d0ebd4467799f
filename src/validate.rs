//! Argument validation.
//!
//! Every public [`crate::ConPty`] operation validates its parameters before
//! touching session state. Because the public surface is statically typed,
//! most of the original dynamically-typed guards (`_NOT_AN_INT`,
//! `_NOT_A_NUMBER`, `_NOT_A_BOOLEAN`) are unreachable here by construction —
//! what remains are the relational and length guards that a type system
//! cannot express: min/max ordering, command length caps, and clamping
//! ranges. None of these functions mutate session state.

use crate::error::Error;

/// Maximum length, in UTF-16 code units, of the *program name* portion of a
/// `run` command (the part before the first whitespace-delimited argument).
pub const RUN_PROGRAM_NAME_MAX_LEN: usize = 32657;

/// Maximum length, in UTF-16 code units, of the full command line.
pub const COMMAND_MAX_LEN: usize = 32766;

/// Clamp a requested pseudo-console dimension to the valid ConPTY range.
pub fn clamp_dimension(value: i32) -> i32 {
    value.clamp(1, 32767)
}

/// Validate a `run`/constructor command string's length constraints.
///
/// The "program name" is the leading whitespace-delimited token; everything
/// after it is arguments. Both the program name and the full command line
/// are length-capped.
pub fn validate_command(command: &str) -> Result<(), Error> {
    if command.encode_utf16().count() > COMMAND_MAX_LEN {
        return Err(Error::CommandLongerThan32766Chars);
    }

    let program_name = command.split_whitespace().next().unwrap_or(command);
    if program_name.encode_utf16().count() > RUN_PROGRAM_NAME_MAX_LEN {
        return Err(Error::RunProgramNameTooLong);
    }

    Ok(())
}

/// Validate a min/max byte-count pair for `read`/`readline`.
pub fn validate_read_byte_bounds(min: i64, max: i64) -> Result<(), Error> {
    if max > 0 && min > max {
        return Err(Error::MinMoreThanMaxReadBytes);
    }
    Ok(())
}

/// Validate a min/max line-count pair for `readlines`.
pub fn validate_read_line_bounds(min: i64, max: i64) -> Result<(), Error> {
    if max > 0 && min > max {
        return Err(Error::MinMoreThanMaxReadLines);
    }
    Ok(())
}

/// `true` when a read call's bounds mean "return empty immediately":
/// `min <= 0` and `max == 0`.
pub fn is_zero_read_request(min: i64, max: i64) -> bool {
    min <= 0 && max == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_dimension_clamps_both_directions() {
        assert_eq!(clamp_dimension(0), 1);
        assert_eq!(clamp_dimension(-500), 1);
        assert_eq!(clamp_dimension(40_000), 32767);
        assert_eq!(clamp_dimension(80), 80);
    }

    #[test]
    fn command_length_caps_are_enforced() {
        let long_arg = "a".repeat(COMMAND_MAX_LEN + 1);
        assert_eq!(
            validate_command(&long_arg),
            Err(Error::CommandLongerThan32766Chars)
        );

        let long_program = format!("{} arg", "p".repeat(RUN_PROGRAM_NAME_MAX_LEN + 1));
        assert_eq!(
            validate_command(&long_program),
            Err(Error::RunProgramNameTooLong)
        );

        assert_eq!(validate_command("cmd.exe /c echo hi"), Ok(()));
    }

    #[test]
    fn min_more_than_max_bytes_rejected() {
        assert_eq!(
            validate_read_byte_bounds(10, 5),
            Err(Error::MinMoreThanMaxReadBytes)
        );
        assert_eq!(validate_read_byte_bounds(5, 10), Ok(()));
        // max == 0 means "unlimited", so any min is fine.
        assert_eq!(validate_read_byte_bounds(1000, 0), Ok(()));
    }

    #[test]
    fn min_more_than_max_lines_rejected() {
        assert_eq!(
            validate_read_line_bounds(3, 1),
            Err(Error::MinMoreThanMaxReadLines)
        );
        assert_eq!(validate_read_line_bounds(0, 0), Ok(()));
    }

    #[test]
    fn zero_read_request_detected() {
        assert!(is_zero_read_request(0, 0));
        assert!(is_zero_read_request(-1, 0));
        assert!(!is_zero_read_request(1, 0));
        assert!(!is_zero_read_request(0, 10));
    }
}
