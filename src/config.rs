// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the application manifest that the install checker walks through,
//! and the run settings handed to each component at startup. Components never
//! read ambient globals; everything they need comes through [`Settings`].

use crate::path::Layout;

use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs::read_to_string,
    path::{Path, PathBuf},
    str::FromStr,
};

/// Built-in name to package identifier mapping.
const DEFAULT_APPS: &[(&str, &str)] = &[
    ("Git", "Git.Git"),
    ("PowerShell", "Microsoft.PowerShell"),
    ("Neovim", "Neovim.Neovim"),
    ("WezTerm", "wez.wezterm"),
    ("Starship", "Starship.Starship"),
    ("zoxide", "ajeetdsouza.zoxide"),
    ("fzf", "junegunn.fzf"),
    ("ripgrep", "BurntSushi.ripgrep.MSVC"),
    ("eza", "eza-community.eza"),
    ("bat", "sharkdp.bat"),
];

/// Application manifest layout.
///
/// An ordered listing of applications that should exist on the host. Each
/// entry maps the name used to search for the application to the package
/// identifier used to install it.
///
/// # General Layout
///
/// ```toml
/// [[app]]
/// name = "Git"
/// package_id = "Git.Git"
/// ```
///
/// # Invariant
///
/// - Application names are unique, ignoring case.
/// - Names and package identifiers are never blank.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct AppManifest {
    /// Listing of applications in check order.
    #[serde(rename = "app", default)]
    pub apps: Vec<AppDescriptor>,
}

impl AppManifest {
    /// Construct new manifest from a listing of applications.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::DuplicateApp`] if two entries share a name.
    /// - Return [`ConfigError::EmptyField`] if an entry has a blank field.
    pub fn new(apps: impl IntoIterator<Item = AppDescriptor>) -> Result<Self> {
        let manifest = Self {
            apps: apps.into_iter().collect(),
        };
        manifest.validate()?;

        Ok(manifest)
    }

    /// Load manifest from a TOML file.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::ReadManifest`] if the file cannot be read.
    /// - Return [`ConfigError::Deserialize`] if the file is not valid.
    /// - Return [`ConfigError::DuplicateApp`] if two entries share a name.
    /// - Return [`ConfigError::EmptyField`] if an entry has a blank field.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        read_to_string(path)
            .map_err(|err| ConfigError::ReadManifest {
                source: err,
                path: path.to_path_buf(),
            })?
            .parse()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AppDescriptor> {
        self.apps.iter()
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for (index, app) in self.apps.iter().enumerate() {
            // INVARIANT: Blank name would match every listing line.
            for (field, value) in [("name", &app.name), ("package_id", &app.package_id)] {
                if value.trim().is_empty() {
                    return Err(ConfigError::EmptyField {
                        entry: index + 1,
                        field,
                    });
                }
            }

            if !seen.insert(app.name.to_lowercase()) {
                return Err(ConfigError::DuplicateApp(app.name.clone()));
            }
        }

        Ok(())
    }
}

impl Default for AppManifest {
    fn default() -> Self {
        Self {
            apps: DEFAULT_APPS
                .iter()
                .map(|(name, package_id)| AppDescriptor::new(*name, *package_id))
                .collect(),
        }
    }
}

impl FromStr for AppManifest {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let manifest: AppManifest = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;
        manifest.validate()?;

        Ok(manifest)
    }
}

impl Display for AppManifest {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Application to check for.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct AppDescriptor {
    /// Name matched against installed software listings.
    pub name: String,

    /// Package identifier handed to the package manager for installation.
    pub package_id: String,
}

impl AppDescriptor {
    /// Construct new application descriptor.
    pub fn new(name: impl Into<String>, package_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package_id: package_id.into(),
        }
    }
}

/// Settings for one bootstrap run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Where journal entries get appended.
    pub log_path: PathBuf,

    /// Applications to check for.
    pub manifest: AppManifest,

    /// Directories and links to provision.
    pub layout: Layout,

    /// Fixed answer for every prompt, or `None` to ask the operator.
    pub answer: Option<bool>,
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Manifest file cannot be read.
    #[error("failed to read application manifest at {:?}", path.display())]
    ReadManifest {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Application name listed more than once.
    #[error("application {0:?} listed more than once")]
    DuplicateApp(String),

    /// Application entry has a blank field.
    #[error("application entry {entry} has an empty {field}")]
    EmptyField { entry: usize, field: &'static str },
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
