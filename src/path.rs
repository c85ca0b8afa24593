// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine where dotstrap reads and writes things on the host: the user's
//! home directory, the default journal location, and the fixed set of
//! directories and links that the provisioner manages.

use std::path::{Path, PathBuf};

/// Determine absolute path to user's home directory.
///
/// Does not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or(NoWayHome)
}

/// Determine default absolute path to the journal file.
///
/// Uses `~/dotstrap.log`. Does not check if the path returned actually
/// exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn default_log_path() -> Result<PathBuf> {
    home_dir().map(|home| home.join("dotstrap.log"))
}

/// Perform shell expansion on a user supplied path.
///
/// Expands a leading `~` and any `$VAR` or `${VAR}` references. Windows
/// shells do not always do this for native programs, so we do it ourselves.
///
/// # Errors
///
/// - Return [`ExpandError`] if a referenced variable is not set.
pub fn expand(path: impl AsRef<Path>) -> Result<PathBuf, ExpandError> {
    let raw = path.as_ref().to_string_lossy();
    let expanded = shellexpand::full(raw.as_ref())?;
    Ok(PathBuf::from(expanded.into_owned()))
}

/// Directory layout managed by the provisioner.
///
/// # Layout
///
/// ```text
/// <local_bin>                         real directory
/// <home>/.local                       hidden directory
/// <home>/.local/bin    -> <local_bin>
/// <home>/.config                      hidden directory
/// <documents_config>                  real directory
/// <home>/.config/powershell -> <documents_config>
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    home: PathBuf,
    local_bin: PathBuf,
    documents_config: PathBuf,
}

impl Layout {
    /// Construct new layout from explicit paths.
    pub fn new(
        home: impl Into<PathBuf>,
        local_bin: impl Into<PathBuf>,
        documents_config: impl Into<PathBuf>,
    ) -> Self {
        Self {
            home: home.into(),
            local_bin: local_bin.into(),
            documents_config: documents_config.into(),
        }
    }

    /// Construct the default layout for the current user.
    ///
    /// The local bin directory lives at `%LOCALAPPDATA%\bin`, and the
    /// PowerShell configuration directory at `Documents\PowerShell`. Falls
    /// back to the conventional locations under the home directory when the
    /// platform cannot report them.
    ///
    /// # Errors
    ///
    /// - Return [`NoWayHome`] if home directory path cannot be determined.
    pub fn try_default() -> Result<Self> {
        let home = home_dir()?;
        let local_bin = dirs::data_local_dir()
            .unwrap_or_else(|| home.join("AppData").join("Local"))
            .join("bin");
        let documents_config = dirs::document_dir()
            .unwrap_or_else(|| home.join("Documents"))
            .join("PowerShell");

        Ok(Self::new(home, local_bin, documents_config))
    }

    pub fn home(&self) -> &Path {
        self.home.as_path()
    }

    pub fn local_bin(&self) -> &Path {
        self.local_bin.as_path()
    }

    pub fn documents_config(&self) -> &Path {
        self.documents_config.as_path()
    }

    pub fn dot_local(&self) -> PathBuf {
        self.home.join(".local")
    }

    pub fn dot_local_bin(&self) -> PathBuf {
        self.dot_local().join("bin")
    }

    pub fn dot_config(&self) -> PathBuf {
        self.home.join(".config")
    }

    pub fn dot_config_powershell(&self) -> PathBuf {
        self.dot_config().join("powershell")
    }
}

/// No way to determine user's home directory.
///
/// # See Also
///
/// - [`dirs::home_dir`](https://docs.rs/dirs/latest/dirs/fn.home_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's home directory")]
pub struct NoWayHome;

/// Shell expansion failed on a path argument.
#[derive(Clone, Debug, thiserror::Error)]
#[error(transparent)]
pub struct ExpandError(#[from] shellexpand::LookupError<std::env::VarError>);

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;
