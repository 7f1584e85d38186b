//! Cellar layout - where kegs live and where entry points get linked.
//!
//! A formula installs into `<prefix>/Cellar/<name>/<version>` (the keg). The
//! virtualenv itself sits under the keg's `libexec`, and the tool's entry
//! points are linked into `<prefix>/bin`.

use std::path::{Path, PathBuf};

/// Detect the install prefix on this system
pub fn detect_prefix() -> PathBuf {
    // First check environment variable
    if let Ok(prefix) = std::env::var("PYKEG_PREFIX") {
        return PathBuf::from(prefix);
    }

    // Detect by architecture
    #[cfg(target_arch = "aarch64")]
    {
        PathBuf::from("/opt/homebrew")
    }
    #[cfg(not(target_arch = "aarch64"))]
    {
        PathBuf::from("/usr/local")
    }
}

/// Get the Cellar directory under a prefix
pub fn cellar_path(prefix: &Path) -> PathBuf {
    prefix.join("Cellar")
}

/// Keg directory for one installed formula version
pub fn keg_path(prefix: &Path, name: &str, version: &str) -> PathBuf {
    cellar_path(prefix).join(name).join(version)
}

/// Virtualenv root inside a keg
pub fn libexec_path(keg: &Path) -> PathBuf {
    keg.join("libexec")
}

/// Shared executable directory visible on the user's PATH
pub fn bin_path(prefix: &Path) -> PathBuf {
    prefix.join("bin")
}
