// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Windows bootstrap for shared dotfiles.
//!
//! Dotstrap gets a fresh Windows machine ready for a dotfile configuration
//! that is shared with Linux hosts. It does two things:
//!
//! 1. __Provisioning__: creates `~/.local`, `~/.config`, and a local bin
//!    directory, and links the Linux-like paths back into Windows-native
//!    locations. See [`provision`].
//! 2. __Install checking__: walks through a manifest of applications, checks
//!    whether each one is installed through the registry and winget, and
//!    offers to install whatever is missing. See [`install`].
//!
//! Both steps are idempotent. Running dotstrap again on a bootstrapped
//! machine changes nothing, and installs nothing.

pub mod config;
pub mod confirm;
pub mod install;
pub mod journal;
pub mod package;
pub mod path;
pub mod platform;
pub mod presence;
pub mod provision;

pub use config::{AppDescriptor, AppManifest, Settings};
pub use install::{InstallChecker, InstallReport, InstallStatus, Outcome};
pub use journal::Journal;
pub use path::Layout;
pub use provision::{ProvisionReport, Provisioner};
