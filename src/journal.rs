// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Append-only run journal.
//!
//! Every decision the install checker makes gets written to a flat text file
//! so the operator can look back at what happened on a given machine. The
//! journal is separate from console logging; it survives the terminal.
//!
//! # Journal Layout
//!
//! One entry per line. Each line starts with an RFC 3339 timestamp, followed
//! by a single space, followed by a free-form message:
//!
//! ```text
//! 2025-06-01T10:42:07+02:00 Git: present
//! 2025-06-01T10:42:09+02:00 eza: absent
//! 2025-06-01T10:42:12+02:00 eza: skipped
//! ```
//!
//! Entries are never rewritten or rotated.

use chrono::{DateTime, FixedOffset, Local, SecondsFormat};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;

/// Handle to the journal file.
#[derive(Debug, Clone)]
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    /// Open journal at target path.
    ///
    /// Creates the parent directories and the journal file itself if they do
    /// not already exist. Existing entries are left alone.
    ///
    /// # Errors
    ///
    /// - Return [`Error::CreateJournal`] if the journal cannot be created.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            mkdirp::mkdirp(parent).map_err(|err| Error::CreateJournal {
                source: err,
                path: path.clone(),
            })?;
        }

        // INVARIANT: Create journal file if needed, never truncate.
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|err| Error::CreateJournal {
                source: err,
                path: path.clone(),
            })?;
        debug!("journal at {:?}", path.display());

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Append a timestamped message to the journal.
    ///
    /// # Errors
    ///
    /// - Return [`Error::WriteJournal`] if the entry cannot be appended.
    pub fn record(&self, message: impl Into<String>) -> Result<()> {
        let entry = JournalEntry::now(message);
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|err| Error::WriteJournal {
                source: err,
                path: self.path.clone(),
            })?;

        writeln!(file, "{entry}").map_err(|err| Error::WriteJournal {
            source: err,
            path: self.path.clone(),
        })
    }
}

/// Single journal line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    pub timestamp: DateTime<FixedOffset>,
    pub message: String,
}

impl JournalEntry {
    /// Construct new entry stamped with the current local time.
    pub fn now(message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now().fixed_offset(),
            message: message.into(),
        }
    }
}

impl Display for JournalEntry {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        // INVARIANT: Entry stays on one line.
        let message = self.message.replace(|c: char| c == '\r' || c == '\n', " ");
        write!(
            fmt,
            "{} {}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, false),
            message
        )
    }
}

impl FromStr for JournalEntry {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (timestamp, message) = line
            .split_once(' ')
            .ok_or_else(|| Error::MalformedEntry(line.to_string()))?;
        let timestamp = DateTime::parse_from_rfc3339(timestamp)
            .map_err(|_| Error::MalformedEntry(line.to_string()))?;

        Ok(Self {
            timestamp,
            message: message.to_string(),
        })
    }
}

/// Journal error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Journal file cannot be created.
    #[error("failed to create journal at {:?}", path.display())]
    CreateJournal {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Journal file cannot be appended to.
    #[error("failed to write to journal at {:?}", path.display())]
    WriteJournal {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Journal line does not follow the journal layout.
    #[error("malformed journal entry {0:?}")]
    MalformedEntry(String),
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;
