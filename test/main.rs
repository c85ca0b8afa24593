// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

mod integration;

use anyhow::Result;
use dotstrap::{journal::JournalEntry, Journal, Layout};
use std::{
    fs::{create_dir_all, read_to_string},
    path::{Path, PathBuf},
};
use tempfile::TempDir;

/// Scratch home directory laid out like a Windows profile.
pub(crate) struct HomeFixture {
    root: TempDir,
    layout: Layout,
}

impl HomeFixture {
    pub(crate) fn new() -> Result<Self> {
        let root = tempfile::tempdir()?;
        let home = root.path().join("Users").join("blah");
        create_dir_all(&home)?;

        // INVARIANT: Windows-native targets live outside the Linux-like tree.
        let layout = Layout::new(
            &home,
            home.join("AppData").join("Local").join("bin"),
            home.join("Documents").join("PowerShell"),
        );

        Ok(Self { root, layout })
    }

    pub(crate) fn layout(&self) -> &Layout {
        &self.layout
    }

    pub(crate) fn root(&self) -> &Path {
        self.root.path()
    }

    pub(crate) fn journal(&self) -> Result<Journal> {
        Ok(Journal::open(self.layout.home().join("dotstrap.log"))?)
    }
}

/// Read every journal entry in order.
pub(crate) fn journal_entries(journal: &Journal) -> Result<Vec<JournalEntry>> {
    let mut entries = Vec::new();
    for line in read_to_string(journal.path())?.lines() {
        entries.push(line.parse::<JournalEntry>()?);
    }

    Ok(entries)
}

/// Stand-in for the winget binary.
///
/// Records every invocation's arguments, one line per call, and answers
/// `list` with a fixed listing.
#[cfg(unix)]
pub(crate) struct FakeWinget {
    program: PathBuf,
    calls: PathBuf,
}

#[cfg(unix)]
impl FakeWinget {
    pub(crate) fn new(dir: impl AsRef<Path>, listing: &str) -> Result<Self> {
        use std::{fs::write, os::unix::fs::PermissionsExt};

        let program = dir.as_ref().join("winget");
        let calls = dir.as_ref().join("winget-calls.txt");
        let script = format!(
            "#!/bin/sh\necho \"$*\" >> '{}'\nif [ \"$1\" = list ]; then\ncat <<'EOF'\n{}\nEOF\nfi\nexit 0\n",
            calls.display(),
            listing
        );
        write(&program, script)?;
        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755))?;

        Ok(Self { program, calls })
    }

    pub(crate) fn program(&self) -> &Path {
        self.program.as_path()
    }

    pub(crate) fn calls(&self) -> Result<Vec<String>> {
        if !self.calls.exists() {
            return Ok(Vec::new());
        }

        Ok(read_to_string(&self.calls)?
            .lines()
            .map(str::to_owned)
            .collect())
    }
}
