// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Install checking and installation.
//!
//! Walk through an [`AppManifest`], decide whether each application is
//! present by asking every [`PresenceSource`], and offer to install the ones
//! that are absent through a [`PackageManager`].
//!
//! # Journal
//!
//! Each application gets at least one journal entry stating whether it was
//! found. Absent applications get a second entry stating whether the
//! operator skipped the install, or what the install attempt exited with.
//! Every entry starts with the exact application name followed by a colon.
//!
//! # Caveats
//!
//! An install attempt is only judged by the exit status of the installer.
//! Nothing re-checks the presence sources afterwards, so "attempted" never
//! means "confirmed installed".
//!
//! One application failing never stops the walk. Only an interrupted prompt
//! does.

use crate::{
    config::{AppDescriptor, AppManifest},
    confirm::Confirmer,
    journal::Journal,
    package::{InstallExit, PackageManager},
    presence::PresenceSource,
};

use std::fmt::{Display, Formatter, Result as FmtResult};
use tracing::{debug, info, instrument, warn};

/// Whether an application is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStatus {
    Present,
    Absent,
}

/// What happened to one application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Some presence source found the application.
    Present,

    /// Application was absent, and the operator declined to install it.
    Skipped,

    /// Application was absent, and the installer ran to completion.
    Attempted(InstallExit),

    /// Application was absent, and the installer could not be started.
    LaunchFailed(String),
}

impl Display for Outcome {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Present => fmt.write_str("present"),
            Self::Skipped => fmt.write_str("skipped"),
            Self::Attempted(exit) => write!(fmt, "install attempted, {exit}"),
            Self::LaunchFailed(reason) => write!(fmt, "install failed to launch: {reason}"),
        }
    }
}

/// Ordered record of every application outcome.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InstallReport {
    outcomes: Vec<(String, Outcome)>,
}

impl InstallReport {
    pub fn outcomes(&self) -> &[(String, Outcome)] {
        self.outcomes.as_slice()
    }

    /// Look up outcome by application name.
    pub fn outcome(&self, name: &str) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .find(|(app, _)| app == name)
            .map(|(_, outcome)| outcome)
    }

    /// Count outcomes that satisfy a predicate.
    pub fn count(&self, predicate: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| predicate(outcome))
            .count()
    }
}

impl Display for InstallReport {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let present = self.count(|o| *o == Outcome::Present);
        let skipped = self.count(|o| *o == Outcome::Skipped);
        let attempted = self.count(|o| matches!(o, Outcome::Attempted(_)));
        let failed = self.count(|o| {
            matches!(o, Outcome::LaunchFailed(_))
                || matches!(o, Outcome::Attempted(exit) if !exit.success())
        });

        write!(
            fmt,
            "{present} present, {skipped} skipped, {attempted} install attempted, {failed} failed"
        )
    }
}

/// Check applications, and offer to install missing ones.
pub struct InstallChecker<'a, M, C>
where
    M: PackageManager,
    C: Confirmer,
{
    manager: M,
    confirmer: C,
    journal: &'a Journal,
    sources: Vec<Box<dyn PresenceSource + 'a>>,
}

impl<'a, M, C> InstallChecker<'a, M, C>
where
    M: PackageManager,
    C: Confirmer,
{
    /// Construct new install checker without any presence sources.
    pub fn new(manager: M, confirmer: C, journal: &'a Journal) -> Self {
        Self {
            manager,
            confirmer,
            journal,
            sources: Vec::new(),
        }
    }

    /// Add presence source to consult.
    ///
    /// Sources are consulted in the order they were added.
    pub fn with_source(mut self, source: impl PresenceSource + 'a) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Determine install status of an application.
    ///
    /// Present if any source reports a match. Sources that fail count as no
    /// match, so remaining sources still decide.
    #[instrument(skip(self, app), fields(app = %app.name), level = "debug")]
    pub fn status(&self, app: &AppDescriptor) -> InstallStatus {
        for source in &self.sources {
            match source.query(&app.name) {
                Ok(true) => {
                    debug!("{} found by {}", app.name, source.label());
                    return InstallStatus::Present;
                }
                Ok(false) => continue,
                Err(error) => {
                    warn!("{error}, treating as no match for {}", app.name);
                }
            }
        }

        InstallStatus::Absent
    }

    /// Check one application, and install it if absent and confirmed.
    ///
    /// # Errors
    ///
    /// - Return [`Error::Confirm`] if the operator prompt fails.
    pub fn check(&self, app: &AppDescriptor) -> Result<Outcome> {
        if self.status(app) == InstallStatus::Present {
            info!("{} is installed", app.name);
            self.record(format!("{}: present", app.name));
            return Ok(Outcome::Present);
        }

        warn!("{} is not installed", app.name);
        self.record(format!("{}: absent", app.name));

        let prompt = format!("Install {} ({})?", app.name, app.package_id);
        if !self.confirmer.confirm(&prompt)? {
            info!("skip {}", app.name);
            self.record(format!("{}: skipped", app.name));
            return Ok(Outcome::Skipped);
        }

        info!("install {} as {}", app.name, app.package_id);
        let outcome = match self.manager.install(&app.package_id) {
            Ok(exit) => {
                if exit.success() {
                    info!("installer for {} finished with {exit}", app.name);
                } else {
                    warn!("installer for {} finished with {exit}", app.name);
                }
                Outcome::Attempted(exit)
            }
            Err(error) => {
                warn!("installer for {} could not run: {error}", app.name);
                Outcome::LaunchFailed(error.to_string())
            }
        };
        self.record(format!("{}: {} ({})", app.name, outcome, app.package_id));

        Ok(outcome)
    }

    /// Check every application of a manifest in order.
    ///
    /// # Errors
    ///
    /// - Return [`Error::Confirm`] if the operator prompt fails.
    #[instrument(skip(self, manifest), level = "debug")]
    pub fn run(&self, manifest: &AppManifest) -> Result<InstallReport> {
        let mut report = InstallReport::default();
        for app in manifest.iter() {
            let outcome = self.check(app)?;
            report.outcomes.push((app.name.clone(), outcome));
        }

        Ok(report)
    }

    fn record(&self, message: String) {
        if let Err(error) = self.journal.record(message) {
            warn!("{error}");
        }
    }
}

/// Install checker error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Operator prompt failed.
    #[error(transparent)]
    Confirm(#[from] crate::confirm::Error),
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;
