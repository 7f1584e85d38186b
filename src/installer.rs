//! The install flow: one formula, one keg, one virtualenv.
//!
//! Resolution is pure and runs first; everything after it is effectful and
//! fail-fast. Steps run strictly in order and nothing is rolled back on
//! failure - cleanup of a half-built keg belongs to the caller.

use crate::cellar;
use crate::download;
use crate::error::{PykegError, Result};
use crate::extract;
use crate::formula::{Formula, Resource};
use crate::receipt::InstallReceipt;
use crate::resolver;
use crate::symlink;
use crate::venv::{CommandRunner, InstallState, Venv};
use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::info;

/// Knobs for one install run.
pub struct InstallOptions {
    pub prefix: PathBuf,
    /// Whether to run the pip pin shim. Off only where the toolchain has
    /// fixed the underlying pip defect.
    pub pin_pip: bool,
    /// Interpreter used when a formula declares no python at all.
    pub default_python: String,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            prefix: cellar::detect_prefix(),
            pin_pip: std::env::var_os("PYKEG_NO_PIP_PIN").is_none(),
            default_python: std::env::var("PYKEG_DEFAULT_PYTHON")
                .unwrap_or_else(|_| resolver::LEGACY_DEFAULT_PYTHON.to_string()),
        }
    }
}

/// Install a formula end to end: resolve, provision, populate, link.
///
/// Returns the populated environment in [`InstallState::TargetLinked`].
pub async fn install(
    formula: &Formula,
    opts: &InstallOptions,
    runner: &dyn CommandRunner,
) -> Result<Venv> {
    let python = resolver::resolve(formula, &opts.default_python)?;
    info!(formula = %formula.name, interpreter = %python, "resolved interpreter");

    let keg = cellar::keg_path(&opts.prefix, &formula.name, &formula.version);
    let mut venv = Venv::create(&cellar::libexec_path(&keg), &python, runner)?;

    let pinned = pin_pip(&mut venv, opts, runner)?;

    let fetched = download::fetch_resources(formula.resources()).await?;
    install_resources(&mut venv, &fetched, runner)?;

    let tarball =
        download::fetch_source(&formula.name, &formula.url, formula.sha256.as_deref()).await?;
    let build_root = download::cache_dir()
        .join("build")
        .join(format!("{}-{}", formula.name, formula.version));
    let build_dir = extract::extract_source(&tarball, &build_root)?;

    install_target(&mut venv, formula, pinned, &build_dir, opts, runner)?;

    Ok(venv)
}

/// Run (or skip) the pip pin shim according to the options.
fn pin_pip(venv: &mut Venv, opts: &InstallOptions, runner: &dyn CommandRunner) -> Result<bool> {
    if !opts.pin_pip {
        info!("pip pin shim disabled, skipping");
        venv.advance(InstallState::PipPinned);
        return Ok(false);
    }
    venv.pin_pip(runner)
}

/// Install already-fetched resources, strictly in declared order.
///
/// The first failure aborts: resource k is never attempted before 1..k-1
/// succeeded, and nothing after a failure runs.
pub fn install_resources(
    venv: &mut Venv,
    fetched: &[(Resource, PathBuf)],
    runner: &dyn CommandRunner,
) -> Result<()> {
    for (resource, archive) in fetched {
        info!(resource = %resource.name, "installing resource");
        venv.pip_install(runner, archive)
            .map_err(|e| PykegError::ResourceInstall {
                name: resource.name.clone(),
                source: e,
            })?;
    }

    venv.advance(InstallState::ResourcesInstalled);
    Ok(())
}

/// Install the target project into the venv, link its entry points into the
/// shared bin directory, and write the keg receipt.
pub fn install_target(
    venv: &mut Venv,
    formula: &Formula,
    pip_pinned: bool,
    build_dir: &Path,
    opts: &InstallOptions,
    runner: &dyn CommandRunner,
) -> Result<()> {
    let before = symlink::bin_snapshot(&venv.bin_dir()).map_err(PykegError::Link)?;

    venv.pip_install(runner, build_dir)
        .with_context(|| format!("Failed to install {} into virtualenv", formula.name))?;

    let linked = symlink::link_entry_points(&venv.bin_dir(), &opts.prefix, &before)
        .map_err(PykegError::Link)?;
    info!(count = linked.len(), "linked entry points");

    let keg = cellar::keg_path(&opts.prefix, &formula.name, &formula.version);
    InstallReceipt::new(formula, venv.interpreter(), pip_pinned).write(&keg)?;

    venv.advance(InstallState::TargetLinked);
    Ok(())
}
