//! Tunable default values for the session controller.
//!
//! This module provides:
//! - TOML configuration file loading from `~/.conpty-rs/config.toml`
//! - Compiled-in defaults used when no file is present or a field is absent
//!
//! # Configuration File
//!
//! The configuration file is located at `~/.conpty-rs/config.toml`:
//!
//! ```toml
//! waitfor = 5.0
//! timedelta = 0.1
//! internaltimedelta = 0.01
//! postenddelay = 0.5
//! ```
//!
//! All fields are optional; a missing or unreadable file falls back to the
//! compiled-in defaults below without error.

use std::fs;
use std::path::PathBuf;
use serde::{Deserialize, Serialize};

/// Tunable defaults for `waitfor`/`timedelta`/`internaltimedelta`/`postenddelay`
/// across the reader, writer, and pump APIs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Defaults {
    /// Default overall wait budget (seconds) for blocking reader/waiter calls.
    pub waitfor: f64,
    /// Default poll granularity (seconds) for caller-facing waits.
    pub timedelta: f64,
    /// Default poll granularity (seconds) for the background output pump.
    pub internaltimedelta: f64,
    /// Default post-exit drain grace period (seconds).
    pub postenddelay: f64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            waitfor: 5.0,
            timedelta: 0.1,
            internaltimedelta: 0.01,
            postenddelay: 0.5,
        }
    }
}

impl Defaults {
    /// Load defaults, overlaying any values present in
    /// `~/.conpty-rs/config.toml` on top of the compiled-in defaults.
    ///
    /// Never fails: a missing file, unreadable file, or malformed TOML all
    /// silently fall back to [`Defaults::default`].
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        match fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".conpty-rs").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values_are_five_tenth_hundredth_half_second() {
        let d = Defaults::default();
        assert_eq!(d.waitfor, 5.0);
        assert_eq!(d.timedelta, 0.1);
        assert_eq!(d.internaltimedelta, 0.01);
        assert_eq!(d.postenddelay, 0.5);
    }

    #[test]
    fn partial_toml_overlays_onto_defaults() {
        let parsed: Defaults = toml::from_str("waitfor = 9.5\n").unwrap();
        assert_eq!(parsed.waitfor, 9.5);
        assert_eq!(parsed.timedelta, Defaults::default().timedelta);
    }
}
