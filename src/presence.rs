// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Presence sources.
//!
//! A __presence source__ is one independent way of telling whether an
//! application is already installed. Dotstrap consults two of them:
//!
//! 1. The installed components registry, i.e., the `Uninstall` keys that
//!    Windows keeps for machine-wide, 32-bit compatibility, and per-user
//!    installs.
//! 2. The package manager's listing of installed packages.
//!
//! An application counts as present if _any_ source reports a match. Sources
//! that cannot be queried report [`Error::Unavailable`], which callers treat
//! as "no match from this source" so the other source stays authoritative.
//!
//! # Matching
//!
//! Both sources use the same [`NameMatcher`]: the application name must occur
//! somewhere in a display name or listing line, ignoring case. This is a
//! substring match, so short names can match unrelated entries, e.g., "eza"
//! matches anything containing "Eza". That imprecision is known and kept.

use crate::package::PackageManager;

use regex::{Regex, RegexBuilder};
use std::cell::OnceCell;
use tracing::{debug, instrument, warn};

/// One way of telling whether an application is installed.
pub trait PresenceSource {
    /// Short label used in logs.
    fn label(&self) -> &str;

    /// Check whether an application name matches anything this source knows.
    fn query(&self, name: &str) -> Result<bool>;
}

/// Case-insensitive substring matcher for application names.
#[derive(Debug, Clone)]
pub struct NameMatcher {
    pattern: Regex,
}

impl NameMatcher {
    /// Construct new matcher for an application name.
    ///
    /// Regex metacharacters in the name are matched literally, so names like
    /// "Notepad++" do not blow up the pattern.
    ///
    /// # Errors
    ///
    /// - Return [`Error::Pattern`] if the name yields an oversized pattern.
    pub fn new(name: &str) -> Result<Self> {
        let pattern = RegexBuilder::new(&regex::escape(name))
            .case_insensitive(true)
            .build()?;

        Ok(Self { pattern })
    }

    /// Check if a single piece of text contains the name.
    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    /// Check if any line of a text blob contains the name.
    pub fn matches_any_line(&self, text: &str) -> bool {
        text.lines().any(|line| self.is_match(line))
    }
}

/// Presence source backed by the package manager's installed listing.
///
/// The listing is fetched once, on first query, and reused for the rest of
/// the run.
#[derive(Debug)]
pub struct PackageListSource<P>
where
    P: PackageManager,
{
    manager: P,
    listing: OnceCell<Option<String>>,
}

impl<P> PackageListSource<P>
where
    P: PackageManager,
{
    /// Construct new package listing source.
    pub fn new(manager: P) -> Self {
        Self {
            manager,
            listing: OnceCell::new(),
        }
    }

    fn listing(&self) -> Option<&str> {
        self.listing
            .get_or_init(|| match self.manager.list_installed() {
                Ok(listing) => Some(listing),
                Err(error) => {
                    warn!("package manager listing unavailable: {error}");
                    None
                }
            })
            .as_deref()
    }
}

impl<P> PresenceSource for PackageListSource<P>
where
    P: PackageManager,
{
    fn label(&self) -> &str {
        "package manager"
    }

    #[instrument(skip(self), level = "debug")]
    fn query(&self, name: &str) -> Result<bool> {
        let listing = self.listing().ok_or_else(|| Error::Unavailable {
            source_name: self.label().into(),
            reason: "installed package listing could not be fetched".into(),
        })?;
        let found = NameMatcher::new(name)?.matches_any_line(listing);
        debug!("{name} in package listing: {found}");

        Ok(found)
    }
}

/// Presence source backed by the installed components registry.
///
/// Display names are read once, on first query, and reused for the rest of
/// the run.
#[derive(Debug, Default)]
pub struct RegistrySource {
    display_names: OnceCell<Option<Vec<String>>>,
}

impl RegistrySource {
    /// Construct new registry source.
    pub fn new() -> Self {
        Self::default()
    }

    fn display_names(&self) -> Option<&[String]> {
        self.display_names
            .get_or_init(|| match registry::installed_display_names() {
                Ok(names) => {
                    debug!("found {} registry display names", names.len());
                    Some(names)
                }
                Err(reason) => {
                    warn!("installed components registry unavailable: {reason}");
                    None
                }
            })
            .as_deref()
    }
}

impl PresenceSource for RegistrySource {
    fn label(&self) -> &str {
        "registry"
    }

    #[instrument(skip(self), level = "debug")]
    fn query(&self, name: &str) -> Result<bool> {
        let names = self.display_names().ok_or_else(|| Error::Unavailable {
            source_name: self.label().into(),
            reason: "installed components could not be enumerated".into(),
        })?;
        let matcher = NameMatcher::new(name)?;
        let found = names.iter().any(|display_name| matcher.is_match(display_name));
        debug!("{name} in registry: {found}");

        Ok(found)
    }
}

#[cfg(windows)]
mod registry {
    use tracing::debug;
    use winreg::{
        enums::{HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE},
        RegKey,
    };

    const UNINSTALL: &str = r"SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall";
    const WOW64_UNINSTALL: &str =
        r"SOFTWARE\WOW6432Node\Microsoft\Windows\CurrentVersion\Uninstall";

    /// Collect `DisplayName` of every entry in every uninstall scope.
    ///
    /// Scopes that cannot be opened are skipped. Fails only when no scope
    /// could be opened at all.
    pub(super) fn installed_display_names() -> Result<Vec<String>, String> {
        let mut names = Vec::new();
        let mut opened = 0;

        let scopes = [
            (HKEY_LOCAL_MACHINE, UNINSTALL),
            (HKEY_LOCAL_MACHINE, WOW64_UNINSTALL),
            (HKEY_CURRENT_USER, UNINSTALL),
        ];

        for (hive, path) in scopes {
            let key = match RegKey::predef(hive).open_subkey(path) {
                Ok(key) => key,
                Err(error) => {
                    debug!("skip uninstall scope {path}: {error}");
                    continue;
                }
            };
            opened += 1;

            for subkey_name in key.enum_keys().filter_map(Result::ok) {
                let Ok(subkey) = key.open_subkey(&subkey_name) else {
                    continue;
                };
                if let Ok(name) = subkey.get_value::<String, _>("DisplayName") {
                    names.push(name);
                }
            }
        }

        if opened == 0 {
            return Err("no uninstall registry scope could be opened".into());
        }

        Ok(names)
    }
}

#[cfg(not(windows))]
mod registry {
    pub(super) fn installed_display_names() -> Result<Vec<String>, String> {
        Err("installed components registry only exists on Windows".into())
    }
}

/// Presence source error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Source cannot be queried right now.
    #[error("{source_name} is unavailable: {reason}")]
    Unavailable { source_name: String, reason: String },

    /// Application name cannot be turned into a matcher.
    #[error(transparent)]
    Pattern(#[from] regex::Error),
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;
