// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Package manager plumbing.
//!
//! Dotstrap only needs two things from a package manager: a textual listing
//! of what is installed, and a way to silently install a package by its
//! identifier. Both are modeled through [`PackageManager`] so the install
//! checker can be driven by a fake in tests.
//!
//! The real thing is [`Winget`], which shells out to the `winget` binary.
//! Calls block until the child exits. There is no timeout.

use std::{
    ffi::{OsStr, OsString},
    fmt::{Display, Formatter, Result as FmtResult},
    process::{Command, Stdio},
};
use tracing::{debug, instrument};

/// Package manager operations used by dotstrap.
pub trait PackageManager {
    /// List installed packages as raw text.
    fn list_installed(&self) -> Result<String>;

    /// Silently install package by identifier.
    ///
    /// Agreements for the package and its source are accepted automatically.
    /// Returns once the installer exits, whatever its exit status.
    fn install(&self, package_id: &str) -> Result<InstallExit>;
}

impl<T> PackageManager for &T
where
    T: PackageManager + ?Sized,
{
    fn list_installed(&self) -> Result<String> {
        (**self).list_installed()
    }

    fn install(&self, package_id: &str) -> Result<InstallExit> {
        (**self).install(package_id)
    }
}

/// Exit status of an install invocation.
///
/// Only says how the installer process ended. It does not prove that the
/// application is usable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallExit {
    /// Exit code, or `None` if the process was terminated by a signal.
    pub code: Option<i32>,
}

impl InstallExit {
    pub fn new(code: Option<i32>) -> Self {
        Self { code }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl Display for InstallExit {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self.code {
            Some(code) => write!(fmt, "exit status {code}"),
            None => fmt.write_str("terminated without exit status"),
        }
    }
}

/// Windows package manager.
#[derive(Debug, Clone)]
pub struct Winget {
    program: OsString,
}

impl Winget {
    /// Construct new winget handle using `winget` from the search path.
    pub fn new() -> Self {
        Self::with_program("winget")
    }

    /// Construct new winget handle using a specific program.
    pub fn with_program(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments used to list installed packages.
    pub fn list_args() -> Vec<OsString> {
        ["list", "--accept-source-agreements", "--disable-interactivity"]
            .into_iter()
            .map(OsString::from)
            .collect()
    }

    /// Arguments used to silently install a package.
    pub fn install_args(package_id: &str) -> Vec<OsString> {
        [
            "install",
            "--id",
            package_id,
            "--exact",
            "--silent",
            "--accept-package-agreements",
            "--accept-source-agreements",
        ]
        .into_iter()
        .map(OsString::from)
        .collect()
    }
}

impl Default for Winget {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageManager for Winget {
    #[instrument(skip(self), level = "debug")]
    fn list_installed(&self) -> Result<String> {
        syscall_non_interactive(&self.program, Self::list_args())
    }

    #[instrument(skip(self), level = "debug")]
    fn install(&self, package_id: &str) -> Result<InstallExit> {
        syscall_interactive(&self.program, Self::install_args(package_id))
    }
}

/// Run program with inherited standard streams, and report how it exited.
fn syscall_interactive(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> Result<InstallExit> {
    let status = Command::new(cmd.as_ref())
        .args(args)
        .spawn()
        .map_err(|err| Error::Spawn {
            source: err,
            program: cmd.as_ref().to_os_string(),
        })?
        .wait()
        .map_err(|err| Error::Spawn {
            source: err,
            program: cmd.as_ref().to_os_string(),
        })?;
    debug!("{:?} finished with {status}", cmd.as_ref());

    Ok(InstallExit::new(status.code()))
}

/// Run program with captured output, and return its standard output.
fn syscall_non_interactive(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> Result<String> {
    let output = Command::new(cmd.as_ref())
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|err| Error::Spawn {
            source: err,
            program: cmd.as_ref().to_os_string(),
        })?;
    let stdout = String::from_utf8_lossy(output.stdout.as_slice()).into_owned();
    let stderr = String::from_utf8_lossy(output.stderr.as_slice()).into_owned();

    if !output.status.success() {
        // INVARIANT: Chomp trailing newlines.
        let stderr = stderr.trim_end().to_string();
        return Err(Error::Failed {
            program: cmd.as_ref().to_os_string(),
            code: output.status.code(),
            stderr,
        });
    }

    Ok(stdout)
}

/// Package manager error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Program could not be started or waited on.
    #[error("failed to run {program:?}")]
    Spawn {
        #[source]
        source: std::io::Error,
        program: OsString,
    },

    /// Program ran but reported failure.
    #[error("command {program:?} failed with code {code:?}: {stderr}")]
    Failed {
        program: OsString,
        code: Option<i32>,
        stderr: String,
    },
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn install_args_are_silent_and_accept_agreements() {
        let result = Winget::install_args("Vendor.Sample");
        let expect: Vec<OsString> = [
            "install",
            "--id",
            "Vendor.Sample",
            "--exact",
            "--silent",
            "--accept-package-agreements",
            "--accept-source-agreements",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();

        assert_eq!(result, expect);
    }

    #[test]
    fn missing_program_reports_spawn_failure() {
        let winget = Winget::with_program("dotstrap-no-such-package-manager");

        assert!(matches!(winget.list_installed(), Err(Error::Spawn { .. })));
        assert!(matches!(winget.install("Vendor.Sample"), Err(Error::Spawn { .. })));
    }

    #[test]
    fn install_exit_display() {
        assert_eq!(InstallExit::new(Some(0)).to_string(), "exit status 0");
        assert_eq!(
            InstallExit::new(None).to_string(),
            "terminated without exit status"
        );
        assert!(!InstallExit::new(Some(1)).success());
    }

    #[cfg(unix)]
    #[test]
    fn captured_output_is_returned() -> anyhow::Result<()> {
        let output = syscall_non_interactive("sh", ["-c", "echo Git.Git"])?;
        assert_eq!(output, "Git.Git\n");

        let result = syscall_non_interactive("sh", ["-c", "echo nope >&2; exit 3"]);
        assert!(matches!(
            result,
            Err(Error::Failed { code: Some(3), ref stderr, .. }) if stderr == "nope"
        ));

        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn interactive_call_reports_exit_code() -> anyhow::Result<()> {
        let exit = syscall_interactive("sh", ["-c", "exit 7"])?;
        assert_eq!(exit, InstallExit::new(Some(7)));

        Ok(())
    }
}
