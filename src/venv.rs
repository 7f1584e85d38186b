//! Isolated virtualenv environments and pip invocation.
//!
//! A [`Venv`] owns one virtualenv rooted under a keg's `libexec`. All process
//! execution goes through the [`CommandRunner`] seam so installs can be
//! exercised in tests without a real python on the machine.

use crate::error::{PykegError, Result};
use anyhow::{Context, bail};
use std::path::{Path, PathBuf};
use tracing::debug;

/// First pip release broken by `--no-binary :all:` self-reinstalls.
///
/// Homebrew passes `--no-binary :all:` to force source installs, which pip 19+
/// cannot survive when asked to reinstall itself (pypa/pip#6222). The pin step
/// caps pip below that release before any resource is installed.
const PIP_BROKEN_MAJOR: u32 = 19;
const PIP_PIN_SPEC: &str = "pip<19";

/// Executes external programs on behalf of the installer.
pub trait CommandRunner {
    /// Run a program to completion. Non-zero exit is an error.
    fn run(&self, program: &Path, args: &[&str]) -> anyhow::Result<()>;

    /// Run a program and capture its stdout.
    fn capture(&self, program: &Path, args: &[&str]) -> anyhow::Result<String>;
}

/// Runs programs via `std::process::Command`.
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[&str]) -> anyhow::Result<()> {
        debug!("running {} {}", program.display(), args.join(" "));
        let status = std::process::Command::new(program)
            .args(args)
            .status()
            .with_context(|| format!("Failed to execute {}", program.display()))?;

        if !status.success() {
            bail!("{} exited with {}", program.display(), status);
        }
        Ok(())
    }

    fn capture(&self, program: &Path, args: &[&str]) -> anyhow::Result<String> {
        debug!("capturing {} {}", program.display(), args.join(" "));
        let output = std::process::Command::new(program)
            .args(args)
            .output()
            .with_context(|| format!("Failed to execute {}", program.display()))?;

        if !output.status.success() {
            bail!("{} exited with {}", program.display(), output.status);
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Install progress of an environment. Linear; any failure aborts the install
/// and the handle is discarded, so there is no recorded failure state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallState {
    Created,
    InterpreterBound,
    PipPinned,
    ResourcesInstalled,
    TargetLinked,
}

/// An isolated virtualenv bound to one interpreter.
#[derive(Debug)]
pub struct Venv {
    root: PathBuf,
    interpreter: String,
    state: InstallState,
}

impl Venv {
    /// Create a virtualenv at `root` with the given interpreter binary name.
    pub fn create(root: &Path, interpreter: &str, runner: &dyn CommandRunner) -> Result<Self> {
        let mut venv = Self {
            root: root.to_path_buf(),
            interpreter: interpreter.to_string(),
            state: InstallState::Created,
        };

        if let Some(parent) = root.parent() {
            std::fs::create_dir_all(parent)?;
        }

        runner
            .run(
                Path::new(interpreter),
                &["-m", "venv", &root.to_string_lossy()],
            )
            .map_err(|e| PykegError::EnvironmentCreation {
                interpreter: interpreter.to_string(),
                reason: e.to_string(),
            })?;

        venv.state = InstallState::InterpreterBound;
        Ok(venv)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }

    pub fn state(&self) -> &InstallState {
        &self.state
    }

    pub(crate) fn advance(&mut self, state: InstallState) {
        self.state = state;
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    pub fn pip_path(&self) -> PathBuf {
        self.bin_dir().join("pip")
    }

    /// Cap pip below the first release broken by forced source reinstalls.
    ///
    /// Probes `pip --version` first: an environment that already ships an
    /// older pip does not need the shim, and the step is skipped. Returns
    /// whether the pin actually ran.
    pub fn pin_pip(&mut self, runner: &dyn CommandRunner) -> Result<bool> {
        let pip = self.pip_path();

        if let Some(major) = self.pip_major_version(runner) {
            if major < PIP_BROKEN_MAJOR {
                debug!("pip {major} predates the broken release, skipping pin");
                self.state = InstallState::PipPinned;
                return Ok(false);
            }
        }

        // Deliberately no --no-binary here: letting pip reinstall itself from
        // a wheel is the entire point of the workaround.
        runner
            .run(
                &pip,
                &[
                    "install",
                    "-v",
                    "--no-deps",
                    "--ignore-installed",
                    "--upgrade",
                    "--force-reinstall",
                    PIP_PIN_SPEC,
                ],
            )
            .map_err(|e| PykegError::PipPin {
                reason: e.to_string(),
            })?;

        self.state = InstallState::PipPinned;
        Ok(true)
    }

    fn pip_major_version(&self, runner: &dyn CommandRunner) -> Option<u32> {
        // "pip 18.1 from /.../site-packages/pip (python 3.7)"
        let output = runner.capture(&self.pip_path(), &["--version"]).ok()?;
        let version = output.split_whitespace().nth(1)?;
        version.split('.').next()?.parse().ok()
    }

    /// Install one already-verified archive, without dependency resolution.
    pub fn pip_install(&self, runner: &dyn CommandRunner, archive: &Path) -> anyhow::Result<()> {
        runner.run(
            &self.pip_path(),
            &[
                "install",
                "-v",
                "--no-deps",
                "--no-binary",
                ":all:",
                "--ignore-installed",
                &archive.to_string_lossy(),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pip_path_under_root() {
        let venv = Venv {
            root: PathBuf::from("/opt/homebrew/Cellar/vws-cli/1.0/libexec"),
            interpreter: "python3".to_string(),
            state: InstallState::InterpreterBound,
        };
        assert_eq!(
            venv.pip_path(),
            PathBuf::from("/opt/homebrew/Cellar/vws-cli/1.0/libexec/bin/pip")
        );
    }

    struct FixedVersionRunner(&'static str);

    impl CommandRunner for FixedVersionRunner {
        fn run(&self, _program: &Path, _args: &[&str]) -> anyhow::Result<()> {
            Ok(())
        }

        fn capture(&self, _program: &Path, _args: &[&str]) -> anyhow::Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_pin_skipped_when_pip_already_old() {
        let mut venv = Venv {
            root: PathBuf::from("/tmp/venv"),
            interpreter: "python3".to_string(),
            state: InstallState::InterpreterBound,
        };
        let runner = FixedVersionRunner("pip 18.1 from /x/pip (python 3.7)");
        assert!(!venv.pin_pip(&runner).unwrap());
        assert_eq!(venv.state(), &InstallState::PipPinned);
    }

    #[test]
    fn test_pin_runs_when_pip_is_broken_release() {
        let mut venv = Venv {
            root: PathBuf::from("/tmp/venv"),
            interpreter: "python3".to_string(),
            state: InstallState::InterpreterBound,
        };
        let runner = FixedVersionRunner("pip 19.0.3 from /x/pip (python 3.7)");
        assert!(venv.pin_pip(&runner).unwrap());
        assert_eq!(venv.state(), &InstallState::PipPinned);
    }

    #[test]
    fn test_pin_runs_when_version_probe_unparseable() {
        let mut venv = Venv {
            root: PathBuf::from("/tmp/venv"),
            interpreter: "python3".to_string(),
            state: InstallState::InterpreterBound,
        };
        let runner = FixedVersionRunner("garbage");
        // Cannot prove the shim is unnecessary, so it runs.
        assert!(venv.pin_pip(&runner).unwrap());
    }
}
