// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use dotstrap::{
    config::{AppManifest, Settings},
    confirm::{AssumeAnswer, Confirmer, InquireConfirmer},
    package::Winget,
    path::{default_log_path, expand, Layout},
    platform::{ensure_supported, PlatformMismatch},
    presence::{PackageListSource, RegistrySource},
    InstallChecker, Journal, Outcome, Provisioner,
};

use anyhow::Result;
use clap::Parser;
use std::{path::PathBuf, process::exit};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Operator declined the initial confirmation.
const EXIT_DECLINED: i32 = 3;

/// Host is not Windows.
const EXIT_WRONG_PLATFORM: i32 = 2;

/// Bootstrap a Windows machine for shared dotfiles.
///
/// Provisions `~/.local`, `~/.config`, and a local bin directory with links
/// into Windows-native locations, then checks that every application in the
/// manifest is installed, offering to install missing ones through winget.
#[derive(Debug, Clone, Parser)]
#[command(about, long_about, version)]
struct Cli {
    /// Answer yes to every prompt.
    #[arg(short, long, conflicts_with = "no")]
    pub yes: bool,

    /// Answer no to every prompt.
    #[arg(short, long)]
    pub no: bool,

    /// Path of journal file to append to.
    #[arg(short, long, value_name = "path")]
    pub log_path: Option<PathBuf>,

    /// TOML manifest of applications to use instead of the built-in one.
    #[arg(short, long, value_name = "file")]
    pub apps: Option<PathBuf>,

    /// Print the effective application manifest and exit.
    #[arg(long)]
    pub print_apps: bool,

    /// Do not provision directories and links.
    #[arg(long)]
    pub skip_provision: bool,

    /// Do not check for installed applications.
    #[arg(long)]
    pub skip_install: bool,
}

impl Cli {
    fn answer(&self) -> Option<bool> {
        match (self.yes, self.no) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    fn manifest(&self) -> Result<AppManifest> {
        Ok(match &self.apps {
            Some(path) => AppManifest::load(expand(path)?)?,
            None => AppManifest::default(),
        })
    }

    fn settings(&self) -> Result<Settings> {
        let log_path = match &self.log_path {
            Some(path) => expand(path)?,
            None => default_log_path()?,
        };

        Ok(Settings {
            log_path,
            manifest: self.manifest()?,
            layout: Layout::try_default()?,
            answer: self.answer(),
        })
    }
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_timer(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    match run() {
        Ok(code) => exit(code),
        Err(error) if error.downcast_ref::<PlatformMismatch>().is_some() => {
            error!("{error}");
            exit(EXIT_WRONG_PLATFORM);
        }
        Err(error) => {
            error!("{error:?}");
            exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();

    if cli.print_apps {
        print!("{}", cli.manifest()?);
        return Ok(0);
    }

    // INVARIANT: Refuse foreign hosts before touching anything.
    ensure_supported()?;

    let settings = cli.settings()?;
    let journal = Journal::open(&settings.log_path)?;
    info!("journal at {:?}", journal.path().display());

    if !cli.skip_provision {
        run_provision(&settings)?;
    }

    if cli.skip_install {
        return Ok(0);
    }

    // INVARIANT: Initial confirmation is only asked interactively.
    let Some(answer) = settings.answer else {
        let confirmer = InquireConfirmer::new();
        if !proceed(&settings.manifest, &journal, &confirmer)? {
            return Ok(EXIT_DECLINED);
        }

        return run_install(&settings, &journal, confirmer);
    };

    run_install(&settings, &journal, AssumeAnswer(answer))
}

/// Ask whether to walk the manifest at all, journaling a refusal.
fn proceed(manifest: &AppManifest, journal: &Journal, confirmer: &impl Confirmer) -> Result<bool> {
    let prompt = format!(
        "Check {} applications and offer to install missing ones?",
        manifest.len()
    );
    if confirmer.confirm(&prompt)? {
        return Ok(true);
    }

    info!("aborted by user");
    journal.record("aborted by user")?;
    Ok(false)
}

fn run_provision(settings: &Settings) -> Result<()> {
    let report = Provisioner::new(settings.layout.clone()).run()?;
    info!(
        "provisioning done: {} changes, {} warnings",
        report.changes(),
        report.warnings()
    );

    Ok(())
}

fn run_install(settings: &Settings, journal: &Journal, confirmer: impl Confirmer) -> Result<i32> {
    let winget = Winget::new();
    let report = InstallChecker::new(&winget, confirmer, journal)
        .with_source(RegistrySource::new())
        .with_source(PackageListSource::new(&winget))
        .run(&settings.manifest)?;

    info!("install check done: {report}");
    if report.count(|outcome| matches!(outcome, Outcome::Attempted(_))) > 0 {
        warn!("install attempts are not re-checked, verify them before relying on them");
    }

    Ok(0)
}
