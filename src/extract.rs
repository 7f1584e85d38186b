//! Source tarball extraction.
//!
//! The target project ships as a tar.gz whose single top-level directory holds
//! the source tree (`setup.py`, `src/`, ...). We unpack it under the keg and
//! hand the inner directory to pip as the build path.

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::fs;
use std::path::{Path, PathBuf};
use tar::Archive;

/// Extract a source tarball and return the build directory.
///
/// Unpacks into `dest` and resolves the archive's top-level directory. The
/// destination is cleared first: leftovers from an aborted install would
/// otherwise make the top-level directory ambiguous. An archive with no
/// directory entries (a flat file dump) uses `dest` itself.
pub fn extract_source(tarball: &Path, dest: &Path) -> Result<PathBuf> {
    if dest.exists() {
        fs::remove_dir_all(dest)
            .with_context(|| format!("Failed to clear build directory: {}", dest.display()))?;
    }
    fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create build directory: {}", dest.display()))?;

    let file = fs::File::open(tarball)
        .with_context(|| format!("Failed to open tarball: {}", tarball.display()))?;
    let decompressor = GzDecoder::new(file);
    let mut archive = Archive::new(decompressor);

    archive
        .unpack(dest)
        .with_context(|| format!("Failed to extract to: {}", dest.display()))?;

    // GitHub-style tarballs wrap everything in a single top-level directory
    let mut top_level_dirs: Vec<PathBuf> = fs::read_dir(dest)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_dir())
        .collect();

    match top_level_dirs.len() {
        1 => Ok(top_level_dirs.remove(0)),
        _ => Ok(dest.to_path_buf()),
    }
}
