//! Entry-point linking from a keg's virtualenv into the shared bin directory.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::os::unix::fs as unix_fs;
use std::path::{Path, PathBuf};

/// Snapshot the file names in a venv `bin/` directory.
///
/// Taken before the target install so that only the scripts the target itself
/// adds get linked, never pip, activate, or the resource's own scripts.
pub fn bin_snapshot(dir: &Path) -> Result<HashSet<OsString>> {
    if !dir.exists() {
        return Ok(HashSet::new());
    }

    let mut names = HashSet::new();
    for entry in fs::read_dir(dir)? {
        names.insert(entry?.file_name());
    }
    Ok(names)
}

/// Link every executable that appeared in `venv_bin` since `before` into the
/// shared `<prefix>/bin`.
pub fn link_entry_points(
    venv_bin: &Path,
    prefix: &Path,
    before: &HashSet<OsString>,
) -> Result<Vec<PathBuf>> {
    let target_dir = prefix.join("bin");

    if !target_dir.exists() {
        fs::create_dir_all(&target_dir)
            .with_context(|| format!("Failed to create directory: {}", target_dir.display()))?;
    }

    let mut linked = Vec::new();

    if !venv_bin.exists() {
        return Ok(linked);
    }

    let mut entries: Vec<_> = fs::read_dir(venv_bin)?
        .filter_map(|entry| entry.ok())
        .collect();
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        if before.contains(&entry.file_name()) {
            continue;
        }
        let source = entry.path();
        if source.is_dir() {
            continue;
        }

        let target = target_dir.join(entry.file_name());
        if create_relative_symlink(&source, &target, prefix)? {
            linked.push(target);
        }
    }

    Ok(linked)
}

/// Create a relative symlink from source to target. Returns false if a
/// conflicting link already occupies the target.
fn create_relative_symlink(source: &Path, target: &Path, prefix: &Path) -> Result<bool> {
    // Create path like: ../Cellar/formula/version/libexec/bin/exe
    let relative_source = if let Ok(rel) = source.strip_prefix(prefix) {
        PathBuf::from("..").join(rel)
    } else {
        source.to_path_buf()
    };

    if target.symlink_metadata().is_ok() {
        if let Ok(existing) = fs::read_link(target) {
            // Compare symlink targets directly without canonicalizing
            if existing == relative_source {
                // Already linked correctly
                return Ok(true);
            }
        }

        // Target exists but points elsewhere - skip for safety
        return Ok(false);
    }

    unix_fs::symlink(&relative_source, target).with_context(|| {
        format!(
            "Failed to create symlink: {} -> {}",
            target.display(),
            relative_source.display()
        )
    })?;

    Ok(true)
}
