// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Directory provisioning.
//!
//! Dotfiles written for Linux expect `~/.local/bin` and `~/.config` to exist.
//! On Windows, the real homes of those things live elsewhere, e.g.,
//! `%LOCALAPPDATA%\bin` and `Documents\PowerShell`. The provisioner bridges
//! the two worlds by creating the Linux-like directories and pointing
//! symbolic links from them back into the Windows-native locations. See
//! [`Layout`] for the exact set of targets.
//!
//! # Idempotence
//!
//! Every step checks before it acts. Directories are only created when
//! missing, attributes are only set when unset, and links are only created
//! when nothing sits at the link path. Running the provisioner on an already
//! provisioned system changes nothing.
//!
//! Existing things that look wrong are never overwritten. A regular file or
//! directory sitting where a link should be, or a link pointing somewhere
//! else, only gets reported.
//!
//! # Symbolic Links on Windows
//!
//! Creating directory symbolic links on Windows requires either Developer
//! Mode or an elevated shell. Without either, link creation fails with
//! [`Error::CreateLink`].

use crate::path::Layout;

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

/// Outcome of a single provisioning step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Directory was missing and got created.
    CreatedDir,

    /// Directory already existed.
    DirPresent,

    /// Directory was visible and got hidden.
    Hidden,

    /// Directory was already hidden.
    AlreadyHidden,

    /// Link was missing and got created.
    CreatedLink,

    /// Link already existed with the expected target.
    LinkPresent,

    /// Link already existed, but points somewhere else. Left alone.
    LinkMismatch { found: PathBuf },

    /// Something that is not a link sits at the link path. Left alone.
    Conflict,
}

impl Step {
    /// Check if step changed the file system.
    pub fn is_change(&self) -> bool {
        matches!(self, Self::CreatedDir | Self::Hidden | Self::CreatedLink)
    }

    /// Check if step found something it refused to touch.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::LinkMismatch { .. } | Self::Conflict)
    }
}

impl Display for Step {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::CreatedDir => fmt.write_str("created directory"),
            Self::DirPresent => fmt.write_str("directory present"),
            Self::Hidden => fmt.write_str("hidden"),
            Self::AlreadyHidden => fmt.write_str("already hidden"),
            Self::CreatedLink => fmt.write_str("created link"),
            Self::LinkPresent => fmt.write_str("link present"),
            Self::LinkMismatch { found } => write!(fmt, "link points to {:?}", found.display()),
            Self::Conflict => fmt.write_str("not a link, left untouched"),
        }
    }
}

/// Ordered record of what the provisioner did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProvisionReport {
    steps: Vec<(PathBuf, Step)>,
}

impl ProvisionReport {
    fn push(&mut self, path: impl Into<PathBuf>, step: Step) {
        self.steps.push((path.into(), step));
    }

    pub fn steps(&self) -> &[(PathBuf, Step)] {
        self.steps.as_slice()
    }

    /// Number of steps that changed the file system.
    pub fn changes(&self) -> usize {
        self.steps.iter().filter(|(_, step)| step.is_change()).count()
    }

    /// Number of steps that found something they refused to touch.
    pub fn warnings(&self) -> usize {
        self.steps.iter().filter(|(_, step)| step.is_warning()).count()
    }
}

/// Create Linux-like directories and links for a [`Layout`].
#[derive(Debug, Clone)]
pub struct Provisioner {
    layout: Layout,
}

impl Provisioner {
    /// Construct new provisioner.
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Provision every directory and link of the layout.
    ///
    /// The local bin directory gets created before the `.local/bin` link,
    /// and the PowerShell directory before the `.config/powershell` link, so
    /// link targets always resolve.
    ///
    /// # Errors
    ///
    /// - Return [`Error::CreateDir`] if a directory cannot be created.
    /// - Return [`Error::NotADirectory`] if a file occupies a directory path.
    /// - Return [`Error::Inspect`] if a path cannot be inspected.
    /// - Return [`Error::Hide`] if a directory cannot be hidden.
    /// - Return [`Error::CreateLink`] if a link cannot be created.
    #[instrument(skip(self), level = "debug")]
    pub fn run(&self) -> Result<ProvisionReport> {
        let layout = &self.layout;
        let mut report = ProvisionReport::default();

        report.push(layout.local_bin(), ensure_dir(layout.local_bin())?);

        let dot_local = layout.dot_local();
        report.push(&dot_local, ensure_dir(&dot_local)?);
        report.push(&dot_local, ensure_hidden(&dot_local)?);

        let dot_local_bin = layout.dot_local_bin();
        report.push(&dot_local_bin, ensure_link(&dot_local_bin, layout.local_bin())?);

        let dot_config = layout.dot_config();
        report.push(&dot_config, ensure_dir(&dot_config)?);
        report.push(&dot_config, ensure_hidden(&dot_config)?);

        report.push(
            layout.documents_config(),
            ensure_dir(layout.documents_config())?,
        );

        let powershell = layout.dot_config_powershell();
        report.push(&powershell, ensure_link(&powershell, layout.documents_config())?);

        for (path, step) in report.steps() {
            if step.is_change() {
                info!("{}: {step}", path.display());
            } else {
                debug!("{}: {step}", path.display());
            }
        }

        Ok(report)
    }
}

fn ensure_dir(path: &Path) -> Result<Step> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => return Ok(Step::DirPresent),
        Ok(_) => {
            return Err(Error::NotADirectory {
                path: path.to_path_buf(),
            })
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            return Err(Error::Inspect {
                source: err,
                path: path.to_path_buf(),
            })
        }
    }

    mkdirp::mkdirp(path).map_err(|err| Error::CreateDir {
        source: err,
        path: path.to_path_buf(),
    })?;

    Ok(Step::CreatedDir)
}

fn ensure_hidden(path: &Path) -> Result<Step> {
    if hidden::is_hidden(path).map_err(|err| Error::Inspect {
        source: err,
        path: path.to_path_buf(),
    })? {
        return Ok(Step::AlreadyHidden);
    }

    hidden::hide(path)?;

    Ok(Step::Hidden)
}

fn ensure_link(link: &Path, target: &Path) -> Result<Step> {
    match fs::symlink_metadata(link) {
        Ok(meta) if meta.file_type().is_symlink() => {
            let found = fs::read_link(link).map_err(|err| Error::Inspect {
                source: err,
                path: link.to_path_buf(),
            })?;

            if same_target(link, &found, target) {
                return Ok(Step::LinkPresent);
            }

            warn!(
                "{} points to {:?} instead of {:?}, leaving it alone",
                link.display(),
                found.display(),
                target.display()
            );
            Ok(Step::LinkMismatch { found })
        }
        Ok(meta) => {
            let kind = if meta.is_dir() { "directory" } else { "file" };
            warn!(
                "{} exists as a {kind}, not a symbolic link, leaving it alone",
                link.display()
            );
            Ok(Step::Conflict)
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {
            // INVARIANT: Link target must resolve before linking to it.
            if !target.is_dir() {
                return Err(Error::MissingTarget {
                    link: link.to_path_buf(),
                    target: target.to_path_buf(),
                });
            }

            symlink_dir(target, link).map_err(|err| Error::CreateLink {
                source: err,
                link: link.to_path_buf(),
                target: target.to_path_buf(),
            })?;

            Ok(Step::CreatedLink)
        }
        Err(err) => Err(Error::Inspect {
            source: err,
            path: link.to_path_buf(),
        }),
    }
}

fn same_target(link: &Path, found: &Path, target: &Path) -> bool {
    if found == target {
        return true;
    }

    // Windows may hand back a verbatim path, so compare resolved locations.
    match (fs::canonicalize(link), fs::canonicalize(target)) {
        (Ok(resolved), Ok(expected)) => resolved == expected,
        _ => false,
    }
}

#[cfg(windows)]
fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

#[cfg(unix)]
fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
mod hidden {
    use super::{Error, Result};

    use std::{fs, io, os::windows::fs::MetadataExt, path::Path, process::Command};

    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;

    pub(super) fn is_hidden(path: &Path) -> io::Result<bool> {
        Ok(fs::metadata(path)?.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0)
    }

    pub(super) fn hide(path: &Path) -> Result<()> {
        let status = Command::new("attrib")
            .arg("+h")
            .arg(path)
            .status()
            .map_err(|err| Error::Hide {
                path: path.to_path_buf(),
                reason: err.to_string(),
            })?;

        if !status.success() {
            return Err(Error::Hide {
                path: path.to_path_buf(),
                reason: format!("attrib exited with {status}"),
            });
        }

        Ok(())
    }
}

#[cfg(not(windows))]
mod hidden {
    use super::{Error, Result};

    use std::{io, path::Path};

    // Dot-prefixed names are hidden by convention.
    pub(super) fn is_hidden(path: &Path) -> io::Result<bool> {
        Ok(path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().starts_with('.')))
    }

    pub(super) fn hide(path: &Path) -> Result<()> {
        Err(Error::Hide {
            path: path.to_path_buf(),
            reason: "only dot-prefixed names can be hidden on this platform".into(),
        })
    }
}

/// Provisioning error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Directory cannot be created.
    #[error("failed to create directory at {:?}", path.display())]
    CreateDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Something other than a directory occupies a directory path.
    #[error("expected directory at {:?}, found something else", path.display())]
    NotADirectory { path: PathBuf },

    /// Path cannot be inspected.
    #[error("failed to inspect {:?}", path.display())]
    Inspect {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Directory cannot be hidden.
    #[error("failed to hide {:?}: {reason}", path.display())]
    Hide { path: PathBuf, reason: String },

    /// Link target does not exist.
    #[error("cannot link {:?} to missing directory {:?}", link.display(), target.display())]
    MissingTarget { link: PathBuf, target: PathBuf },

    /// Link cannot be created.
    #[error("failed to link {:?} to {:?}", link.display(), target.display())]
    CreateLink {
        #[source]
        source: std::io::Error,
        link: PathBuf,
        target: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs::{read_to_string, write};
    use tempfile::TempDir;

    fn fixture() -> anyhow::Result<(TempDir, Provisioner)> {
        let root = tempfile::tempdir()?;
        let home = root.path().join("home");
        fs::create_dir(&home)?;
        let layout = Layout::new(
            &home,
            home.join("AppData").join("Local").join("bin"),
            home.join("Documents").join("PowerShell"),
        );

        Ok((root, Provisioner::new(layout)))
    }

    fn snapshot(root: &Path) -> anyhow::Result<Vec<(PathBuf, String)>> {
        let mut entries = Vec::new();
        let mut pending = vec![root.to_path_buf()];
        while let Some(dir) = pending.pop() {
            for entry in fs::read_dir(&dir)? {
                let path = entry?.path();
                let meta = fs::symlink_metadata(&path)?;
                let kind = if meta.file_type().is_symlink() {
                    format!("link -> {}", fs::read_link(&path)?.display())
                } else if meta.is_dir() {
                    pending.push(path.clone());
                    "dir".to_string()
                } else {
                    "file".to_string()
                };
                entries.push((path, kind));
            }
        }
        entries.sort();

        Ok(entries)
    }

    #[test]
    fn fresh_home_gets_full_layout() -> anyhow::Result<()> {
        let (_root, provisioner) = fixture()?;
        let layout = provisioner.layout().clone();

        let report = provisioner.run()?;

        assert!(layout.local_bin().is_dir());
        assert!(layout.documents_config().is_dir());
        assert_eq!(fs::read_link(layout.dot_local_bin())?, layout.local_bin());
        assert_eq!(
            fs::read_link(layout.dot_config_powershell())?,
            layout.documents_config()
        );
        assert_eq!(report.warnings(), 0);

        // Dot-prefixed names are already hidden here.
        let hidden_steps = report
            .steps()
            .iter()
            .filter(|(_, step)| *step == Step::AlreadyHidden)
            .count();
        assert_eq!(hidden_steps, 2);

        Ok(())
    }

    #[test]
    fn link_resolves_into_local_bin() -> anyhow::Result<()> {
        let (_root, provisioner) = fixture()?;
        let layout = provisioner.layout().clone();
        provisioner.run()?;

        write(layout.dot_local_bin().join("hello"), "world")?;
        assert_eq!(read_to_string(layout.local_bin().join("hello"))?, "world");

        Ok(())
    }

    #[test]
    fn second_run_changes_nothing() -> anyhow::Result<()> {
        let (root, provisioner) = fixture()?;

        let first = provisioner.run()?;
        let after_first = snapshot(root.path())?;
        let second = provisioner.run()?;
        let after_second = snapshot(root.path())?;

        assert!(first.changes() > 0);
        assert_eq!(second.changes(), 0);
        assert_eq!(second.warnings(), 0);
        assert_eq!(after_first, after_second);

        Ok(())
    }

    #[test]
    fn regular_file_at_link_path_is_left_alone() -> anyhow::Result<()> {
        let (_root, provisioner) = fixture()?;
        let layout = provisioner.layout().clone();
        fs::create_dir_all(layout.dot_local())?;
        write(layout.dot_local_bin(), "not a link")?;

        let report = provisioner.run()?;

        assert!(report
            .steps()
            .contains(&(layout.dot_local_bin(), Step::Conflict)));
        assert_eq!(read_to_string(layout.dot_local_bin())?, "not a link");
        assert!(!fs::symlink_metadata(layout.dot_local_bin())?
            .file_type()
            .is_symlink());

        Ok(())
    }

    #[test]
    fn foreign_link_is_reported_not_replaced() -> anyhow::Result<()> {
        let (root, provisioner) = fixture()?;
        let layout = provisioner.layout().clone();
        let elsewhere = root.path().join("elsewhere");
        fs::create_dir_all(&elsewhere)?;
        fs::create_dir_all(layout.dot_config())?;
        std::os::unix::fs::symlink(&elsewhere, layout.dot_config_powershell())?;

        let report = provisioner.run()?;

        assert!(report.steps().contains(&(
            layout.dot_config_powershell(),
            Step::LinkMismatch {
                found: elsewhere.clone()
            }
        )));
        assert_eq!(fs::read_link(layout.dot_config_powershell())?, elsewhere);

        Ok(())
    }

    #[test]
    fn file_in_place_of_directory_is_an_error() -> anyhow::Result<()> {
        let (_root, provisioner) = fixture()?;
        write(provisioner.layout().dot_config(), "oops")?;

        let result = provisioner.run();

        assert!(matches!(result, Err(Error::NotADirectory { .. })));

        Ok(())
    }
}
