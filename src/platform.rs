// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Host platform guard.
//!
//! Dotstrap provisions Windows-native locations and talks to winget, so it
//! refuses to touch anything on other hosts.

use std::env::consts::OS;

/// Operating system dotstrap supports.
pub const SUPPORTED_OS: &str = "windows";

/// Make sure the current host is supported.
///
/// # Errors
///
/// - Return [`PlatformMismatch`] if the host is not Windows.
pub fn ensure_supported() -> Result<(), PlatformMismatch> {
    check(OS)
}

/// Compare an operating system name against the supported one.
///
/// # Errors
///
/// - Return [`PlatformMismatch`] if `os` is not supported.
pub fn check(os: &str) -> Result<(), PlatformMismatch> {
    if os != SUPPORTED_OS {
        return Err(PlatformMismatch { found: os.into() });
    }

    Ok(())
}

/// Host operating system is not supported.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("dotstrap only runs on windows, but this host is {found}")]
pub struct PlatformMismatch {
    pub found: String,
}
