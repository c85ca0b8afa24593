// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{journal_entries, HomeFixture};

use anyhow::Result;
use dotstrap::{
    confirm::AssumeAnswer,
    package::{self, InstallExit, PackageManager},
    presence::{PackageListSource, RegistrySource},
    AppDescriptor, AppManifest, InstallChecker, Outcome, Provisioner,
};
use pretty_assertions::assert_eq;
use std::cell::RefCell;

#[derive(Default)]
struct ScriptedManager {
    listing: String,
    installs: RefCell<Vec<String>>,
}

impl PackageManager for ScriptedManager {
    fn list_installed(&self) -> package::Result<String> {
        Ok(self.listing.clone())
    }

    fn install(&self, package_id: &str) -> package::Result<InstallExit> {
        self.installs.borrow_mut().push(package_id.into());
        Ok(InstallExit::new(Some(0)))
    }
}

fn manifest() -> Result<AppManifest> {
    Ok(AppManifest::new([
        AppDescriptor::new("Git", "Git.Git"),
        AppDescriptor::new("sample", "Vendor.Sample"),
        AppDescriptor::new("fzf", "junegunn.fzf"),
    ])?)
}

#[test]
fn bootstrap_twice_is_stable() -> Result<()> {
    let fixture = HomeFixture::new()?;
    let journal = fixture.journal()?;
    let manager = ScriptedManager {
        listing: "Git  Git.Git  2.45.1\nfzf  junegunn.fzf  0.53.0\n".into(),
        ..Default::default()
    };

    for _ in 0..2 {
        Provisioner::new(fixture.layout().clone()).run()?;
        InstallChecker::new(&manager, AssumeAnswer(false), &journal)
            .with_source(RegistrySource::new())
            .with_source(PackageListSource::new(&manager))
            .run(&manifest()?)?;
    }

    let second = Provisioner::new(fixture.layout().clone()).run()?;
    assert_eq!(second.changes(), 0);
    assert!(manager.installs.borrow().is_empty());

    let messages = journal_entries(&journal)?
        .into_iter()
        .map(|entry| entry.message)
        .collect::<Vec<_>>();
    let one_run = vec![
        "Git: present",
        "sample: absent",
        "sample: skipped",
        "fzf: present",
    ];
    assert_eq!(messages, [one_run.clone(), one_run].concat());

    Ok(())
}

#[test]
fn every_entry_names_its_application() -> Result<()> {
    let fixture = HomeFixture::new()?;
    let journal = fixture.journal()?;
    let manager = ScriptedManager::default();
    let manifest = manifest()?;

    let report = InstallChecker::new(&manager, AssumeAnswer(true), &journal)
        .with_source(PackageListSource::new(&manager))
        .run(&manifest)?;

    let entries = journal_entries(&journal)?;
    assert_eq!(entries.len(), 2 * manifest.len());
    for entry in &entries {
        assert!(manifest
            .iter()
            .any(|app| entry.message.starts_with(&format!("{}: ", app.name))));
    }
    assert!(entries
        .windows(2)
        .all(|pair| pair[0].timestamp <= pair[1].timestamp));
    assert_eq!(
        *manager.installs.borrow(),
        vec!["Git.Git", "Vendor.Sample", "junegunn.fzf"]
    );
    assert_eq!(
        report.count(|outcome| matches!(outcome, Outcome::Attempted(_))),
        3
    );

    Ok(())
}

#[cfg(unix)]
#[test]
fn winget_receives_silent_install_flags() -> Result<()> {
    use crate::FakeWinget;
    use dotstrap::package::Winget;

    let fixture = HomeFixture::new()?;
    let journal = fixture.journal()?;
    let fake = FakeWinget::new(fixture.root(), "Git  Git.Git  2.45.1")?;
    let winget = Winget::with_program(fake.program());

    let report = InstallChecker::new(&winget, AssumeAnswer(true), &journal)
        .with_source(RegistrySource::new())
        .with_source(PackageListSource::new(&winget))
        .run(&AppManifest::new([
            AppDescriptor::new("Git", "Git.Git"),
            AppDescriptor::new("sample", "Vendor.Sample"),
        ])?)?;

    assert_eq!(report.outcome("Git"), Some(&Outcome::Present));
    assert_eq!(
        report.outcome("sample"),
        Some(&Outcome::Attempted(InstallExit::new(Some(0))))
    );
    assert_eq!(
        fake.calls()?,
        vec![
            "list --accept-source-agreements --disable-interactivity",
            "install --id Vendor.Sample --exact --silent --accept-package-agreements --accept-source-agreements",
        ]
    );

    Ok(())
}

#[cfg(not(windows))]
#[test]
fn foreign_host_exits_before_touching_home() -> Result<()> {
    use std::{fs::read_dir, process::Command};

    let home = tempfile::tempdir()?;
    let status = Command::new(env!("CARGO_BIN_EXE_dotstrap"))
        .arg("--yes")
        .env("HOME", home.path())
        .env("USERPROFILE", home.path())
        .status()?;

    assert_eq!(status.code(), Some(2));
    assert_eq!(read_dir(home.path())?.count(), 0);

    Ok(())
}

#[test]
fn print_apps_emits_loadable_manifest() -> Result<()> {
    use std::process::Command;

    let output = Command::new(env!("CARGO_BIN_EXE_dotstrap"))
        .arg("--print-apps")
        .output()?;

    assert_eq!(output.status.code(), Some(0));
    let printed: AppManifest = String::from_utf8(output.stdout)?.parse()?;
    assert_eq!(printed, AppManifest::default());

    Ok(())
}
