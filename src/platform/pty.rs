//! ConPTY wrapper for Windows.
//!
//! This module is the only place in the crate allowed to touch OS calls: it
//! provisions a pseudo-console and its pipes, spawns the child attached to
//! it, and exposes the narrow set of operations the session controller and
//! output pump need (read, write, resize, poll exit, terminate, console-mode
//! toggling). Everything above this module talks to [`RawPty`], never to
//! `windows::Win32` directly.

use std::io;
use thiserror::Error;

use windows::core::{PCWSTR, PWSTR};
use windows::Win32::Foundation::{CloseHandle, HANDLE, WAIT_OBJECT_0};
use windows::Win32::Storage::FileSystem::{ReadFile, WriteFile};
use windows::Win32::System::Console::{
    ClosePseudoConsole, CreatePseudoConsole, GetConsoleMode, GetStdHandle, ResizePseudoConsole,
    SetConsoleMode, CONSOLE_MODE, COORD, ENABLE_VIRTUAL_TERMINAL_PROCESSING, HPCON,
    STD_OUTPUT_HANDLE,
};
use windows::Win32::System::Pipes::{CreatePipe, PeekNamedPipe};
use windows::Win32::System::Threading::{
    CreateProcessW, DeleteProcThreadAttributeList, GetExitCodeProcess,
    InitializeProcThreadAttributeList, TerminateProcess, UpdateProcThreadAttribute,
    WaitForSingleObject, EXTENDED_STARTUPINFO_PRESENT, LPPROC_THREAD_ATTRIBUTE_LIST,
    PROCESS_INFORMATION, STARTUPINFOEXW,
};

const PROC_THREAD_ATTRIBUTE_PSEUDOCONSOLE: usize = 0x0002_0016;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("failed to create pipe: {0}")]
    PipeCreation(#[source] windows::core::Error),

    #[error("failed to create pseudo console: {0}")]
    ConPtyCreation(#[source] windows::core::Error),

    #[error("failed to spawn process: {0}")]
    ProcessSpawn(#[source] windows::core::Error),

    #[error("program not found: {0}")]
    ProgramNotFound(#[source] windows::core::Error),

    #[error("failed to resize pseudo console: {0}")]
    Resize(#[source] windows::core::Error),

    #[error("failed to read from PTY: {0}")]
    Read(#[source] io::Error),

    #[error("failed to write to PTY: {0}")]
    Write(#[source] io::Error),

    #[error("failed to terminate process: {0}")]
    Terminate(#[source] windows::core::Error),

    #[error("failed to toggle console mode: {0}")]
    ConsoleMode(#[source] windows::core::Error),

    #[error("invalid handle")]
    InvalidHandle,
}

pub type Result<T> = std::result::Result<T, PlatformError>;

/// Outcome of a single non-blocking read attempt.
pub enum ReadOutcome {
    /// `n` new bytes were appended to the caller's buffer.
    Data(usize),
    /// No bytes were available right now; the pipe is still open.
    WouldBlock,
    /// The pipe has been closed; no more data will ever arrive.
    Eof,
}

/// Low-level ConPTY handle wrapper: one pseudo-console, its pipes, and the
/// single child process attached to it.
pub struct RawPty {
    hpc: HPCON,
    input_write: HANDLE,
    output_read: HANDLE,
    process: PROCESS_INFORMATION,
}

// Safety: all access goes through `&self`/`&mut self` methods that only
// issue thread-safe Win32 calls (ReadFile/WriteFile/PeekNamedPipe on
// independent handles, WaitForSingleObject); the session controller
// serializes mutation with its own mutex.
unsafe impl Send for RawPty {}
unsafe impl Sync for RawPty {}

impl RawPty {
    /// Create a pseudo-console of size `cols x rows` and spawn `command`
    /// attached to it.
    pub fn spawn(cols: i32, rows: i32, command: &str) -> Result<Self> {
        unsafe { Self::spawn_internal(cols, rows, command) }
    }

    unsafe fn spawn_internal(cols: i32, rows: i32, command: &str) -> Result<Self> {
        let mut pty_input_read = HANDLE::default();
        let mut pty_input_write = HANDLE::default();
        let mut pty_output_read = HANDLE::default();
        let mut pty_output_write = HANDLE::default();

        CreatePipe(&mut pty_input_read, &mut pty_input_write, None, 0)
            .map_err(PlatformError::PipeCreation)?;
        CreatePipe(&mut pty_output_read, &mut pty_output_write, None, 0)
            .map_err(PlatformError::PipeCreation)?;

        let size = COORD {
            X: cols as i16,
            Y: rows as i16,
        };

        let hpc = CreatePseudoConsole(size, pty_input_read, pty_output_write, 0)
            .map_err(PlatformError::ConPtyCreation)?;

        let _ = CloseHandle(pty_input_read);
        let _ = CloseHandle(pty_output_write);

        let mut attr_list_size: usize = 0;
        let _ = InitializeProcThreadAttributeList(
            LPPROC_THREAD_ATTRIBUTE_LIST::default(),
            1,
            0,
            &mut attr_list_size,
        );

        let mut attr_list_buffer = vec![0u8; attr_list_size];
        let attr_list = LPPROC_THREAD_ATTRIBUTE_LIST(attr_list_buffer.as_mut_ptr() as *mut _);

        InitializeProcThreadAttributeList(attr_list, 1, 0, &mut attr_list_size)
            .map_err(PlatformError::ProcessSpawn)?;

        UpdateProcThreadAttribute(
            attr_list,
            0,
            PROC_THREAD_ATTRIBUTE_PSEUDOCONSOLE,
            Some(hpc.0 as *const _),
            std::mem::size_of::<HPCON>(),
            None,
            None,
        )
        .map_err(PlatformError::ProcessSpawn)?;

        let mut startup_info = STARTUPINFOEXW {
            StartupInfo: std::mem::zeroed(),
            lpAttributeList: attr_list,
        };
        startup_info.StartupInfo.cb = std::mem::size_of::<STARTUPINFOEXW>() as u32;

        let mut process_info = PROCESS_INFORMATION::default();
        let mut cmd_wide: Vec<u16> = command.encode_utf16().chain(std::iter::once(0)).collect();

        let spawn_result = CreateProcessW(
            PCWSTR::null(),
            PWSTR(cmd_wide.as_mut_ptr()),
            None,
            None,
            false,
            EXTENDED_STARTUPINFO_PRESENT,
            None,
            PCWSTR::null(),
            &startup_info.StartupInfo,
            &mut process_info,
        );

        DeleteProcThreadAttributeList(attr_list);

        if let Err(e) = spawn_result {
            ClosePseudoConsole(hpc);
            let _ = CloseHandle(pty_input_write);
            let _ = CloseHandle(pty_output_read);
            const ERROR_FILE_NOT_FOUND: i32 = 2;
            const ERROR_PATH_NOT_FOUND: i32 = 3;
            let code = e.code().0;
            return Err(if code == ERROR_FILE_NOT_FOUND || code == ERROR_PATH_NOT_FOUND {
                PlatformError::ProgramNotFound(e)
            } else {
                PlatformError::ProcessSpawn(e)
            });
        }

        Ok(RawPty {
            hpc,
            input_write: pty_input_write,
            output_read: pty_output_read,
            process: process_info,
        })
    }

    /// Resize the pseudo-console. Caller is responsible for clamping.
    pub fn resize(&self, cols: i32, rows: i32) -> Result<()> {
        let size = COORD {
            X: cols as i16,
            Y: rows as i16,
        };
        unsafe {
            ResizePseudoConsole(self.hpc, size).map_err(PlatformError::Resize)?;
        }
        Ok(())
    }

    /// Write bytes to the child's input pipe. Returns the number of bytes
    /// actually written (may be fewer than `data.len()` on a partial write).
    pub fn write(&self, data: &[u8]) -> Result<usize> {
        let mut written: u32 = 0;
        unsafe {
            WriteFile(self.input_write, Some(data), Some(&mut written), None)
                .map_err(|e| PlatformError::Write(io::Error::from_raw_os_error(e.code().0)))?;
        }
        Ok(written as usize)
    }

    /// Attempt a single non-blocking read from the output pipe.
    pub fn try_read(&self, buffer: &mut [u8]) -> Result<ReadOutcome> {
        let mut available: u32 = 0;
        unsafe {
            if PeekNamedPipe(self.output_read, None, 0, None, Some(&mut available), None).is_err()
            {
                return Ok(ReadOutcome::Eof);
            }
        }

        if available == 0 {
            return Ok(ReadOutcome::WouldBlock);
        }

        let to_read = (available as usize).min(buffer.len());
        let mut read: u32 = 0;
        unsafe {
            ReadFile(self.output_read, Some(&mut buffer[..to_read]), Some(&mut read), None)
                .map_err(|e| PlatformError::Read(io::Error::from_raw_os_error(e.code().0)))?;
        }

        Ok(ReadOutcome::Data(read as usize))
    }

    /// `true` iff the child process is still alive.
    pub fn is_running(&self) -> bool {
        unsafe { WaitForSingleObject(self.process.hProcess, 0) != WAIT_OBJECT_0 }
    }

    /// Block until the child exits or `timeout_ms` elapses. Returns `true`
    /// if the process exited within the budget.
    pub fn wait(&self, timeout_ms: u32) -> bool {
        unsafe { WaitForSingleObject(self.process.hProcess, timeout_ms) == WAIT_OBJECT_0 }
    }

    /// The child's exit code, if it has exited.
    pub fn exit_code(&self) -> Option<u32> {
        if self.is_running() {
            return None;
        }
        let mut exit_code: u32 = 0;
        unsafe {
            if GetExitCodeProcess(self.process.hProcess, &mut exit_code).is_ok() {
                Some(exit_code)
            } else {
                None
            }
        }
    }

    /// Forcibly terminate the child process with the given exit code.
    pub fn terminate(&self, exit_code: u32) -> Result<()> {
        unsafe {
            TerminateProcess(self.process.hProcess, exit_code).map_err(PlatformError::Terminate)?;
        }
        Ok(())
    }
}

impl Drop for RawPty {
    fn drop(&mut self) {
        unsafe {
            ClosePseudoConsole(self.hpc);
            let _ = CloseHandle(self.input_write);
            let _ = CloseHandle(self.output_read);
            let _ = CloseHandle(self.process.hProcess);
            let _ = CloseHandle(self.process.hThread);
        }
    }
}

/// Read the host console's current output mode.
pub fn get_console_mode() -> Result<u32> {
    unsafe {
        let handle = GetStdHandle(STD_OUTPUT_HANDLE).map_err(PlatformError::ConsoleMode)?;
        let mut mode = CONSOLE_MODE::default();
        GetConsoleMode(handle, &mut mode).map_err(PlatformError::ConsoleMode)?;
        Ok(mode.0)
    }
}

/// Set the host console's output mode.
pub fn set_console_mode(mode: u32) -> Result<()> {
    unsafe {
        let handle = GetStdHandle(STD_OUTPUT_HANDLE).map_err(PlatformError::ConsoleMode)?;
        SetConsoleMode(handle, CONSOLE_MODE(mode)).map_err(PlatformError::ConsoleMode)?;
    }
    Ok(())
}

/// The bit toggled by `enable_vts`/`disable_vts`.
pub const VT_PROCESSING_BIT: u32 = ENABLE_VIRTUAL_TERMINAL_PROCESSING.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_and_tear_down_cmd() {
        let pty = RawPty::spawn(80, 24, "cmd.exe /c echo hello");
        assert!(pty.is_ok());
    }

    #[test]
    fn spawn_missing_program_reports_not_found() {
        let err = RawPty::spawn(80, 24, "this-program-does-not-exist-anywhere.exe")
            .expect_err("spawn of a nonexistent program must fail");
        assert!(matches!(err, PlatformError::ProgramNotFound(_)));
    }
}
