//! Non-Windows stand-in for [`super::pty`].
//!
//! ConPTY is a Windows-only facility; this crate makes no attempt at
//! cross-platform PTY support. This stub lets the crate compile and its
//! pure-logic unit tests run on any host; every operation that would need
//! the real OS adapter fails uniformly with
//! [`PlatformError::UnsupportedPlatform`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("ConPTY is only supported on Windows")]
    UnsupportedPlatform,
}

pub type Result<T> = std::result::Result<T, PlatformError>;

pub enum ReadOutcome {
    Data(usize),
    WouldBlock,
    Eof,
}

pub struct RawPty;

impl RawPty {
    pub fn spawn(_cols: i32, _rows: i32, _command: &str) -> Result<Self> {
        Err(PlatformError::UnsupportedPlatform)
    }

    pub fn resize(&self, _cols: i32, _rows: i32) -> Result<()> {
        Err(PlatformError::UnsupportedPlatform)
    }

    pub fn write(&self, _data: &[u8]) -> Result<usize> {
        Err(PlatformError::UnsupportedPlatform)
    }

    pub fn try_read(&self, _buffer: &mut [u8]) -> Result<ReadOutcome> {
        Err(PlatformError::UnsupportedPlatform)
    }

    pub fn is_running(&self) -> bool {
        false
    }

    pub fn wait(&self, _timeout_ms: u32) -> bool {
        false
    }

    pub fn exit_code(&self) -> Option<u32> {
        None
    }

    pub fn terminate(&self, _exit_code: u32) -> Result<()> {
        Err(PlatformError::UnsupportedPlatform)
    }
}

pub fn get_console_mode() -> Result<u32> {
    Err(PlatformError::UnsupportedPlatform)
}

pub fn set_console_mode(_mode: u32) -> Result<()> {
    Err(PlatformError::UnsupportedPlatform)
}

pub const VT_PROCESSING_BIT: u32 = 0x0004;
