//! Archive fetching and checksum verification.
//!
//! The installer never touches the network directly: every archive (resources
//! and the target's own source tarball) comes through here, and nothing is
//! handed back until its SHA-256 matches the formula's pin.

use crate::error::{PykegError, Result};
use crate::formula::Resource;
use anyhow::Context;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Download cache directory
pub fn cache_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".cache/pykeg/downloads")
}

/// SHA256 of a file on disk
pub async fn file_sha256(file_path: &Path) -> Result<String> {
    use sha2::{Digest, Sha256};
    use tokio::io::AsyncReadExt;

    let mut file = fs::File::open(file_path).await?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0; 8192];

    loop {
        let n = file.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Fetch one archive into the cache and verify it against its pinned hash.
///
/// A cached copy is reused only if it still matches the pin; a stale or
/// corrupt copy is re-downloaded once, and a final mismatch is fatal.
pub async fn fetch_verified(
    name: &str,
    url: &str,
    sha256: &str,
    progress: Option<&MultiProgress>,
) -> Result<PathBuf> {
    let output_path = cache_path_for(name, url).await?;

    // Check if already downloaded and verified
    if output_path.exists() {
        if file_sha256(&output_path).await? == sha256 {
            return Ok(output_path);
        }
        // Checksum failed, re-download
        fs::remove_file(&output_path).await?;
    }

    download_to(name, url, &output_path, progress).await?;

    if let Err(e) = verify_pinned(&output_path, name, sha256).await {
        fs::remove_file(&output_path).await?;
        return Err(e);
    }

    Ok(output_path)
}

/// Check a fetched archive against its pinned hash.
pub async fn verify_pinned(path: &Path, name: &str, sha256: &str) -> Result<()> {
    let actual = file_sha256(path).await?;
    if actual != sha256 {
        return Err(PykegError::ChecksumMismatch {
            name: name.to_string(),
            expected: sha256.to_string(),
            actual,
        });
    }
    Ok(())
}

/// Fetch the target project's source tarball.
///
/// Verified like a resource when the formula pins a hash. Without a pin the
/// tarball is always re-downloaded, since a cached copy cannot be trusted.
pub async fn fetch_source(name: &str, url: &str, sha256: Option<&str>) -> Result<PathBuf> {
    if let Some(sha256) = sha256 {
        return fetch_verified(name, url, sha256, None).await;
    }

    let output_path = cache_path_for(name, url).await?;
    if output_path.exists() {
        fs::remove_file(&output_path).await?;
    }
    download_to(name, url, &output_path, None).await?;
    Ok(output_path)
}

async fn cache_path_for(name: &str, url: &str) -> Result<PathBuf> {
    let cache = cache_dir();
    fs::create_dir_all(&cache)
        .await
        .context("Failed to create cache directory")?;

    let filename = url
        .rsplit('/')
        .next()
        .filter(|f| !f.is_empty())
        .map(|f| f.to_string())
        .unwrap_or_else(|| format!("{name}.tar.gz"));
    Ok(cache.join(filename))
}

async fn download_to(
    name: &str,
    url: &str,
    output_path: &Path,
    progress: Option<&MultiProgress>,
) -> Result<()> {
    let pb = if let Some(mp) = progress {
        let pb = mp.add(ProgressBar::new(0));
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
                )
                .map_err(|e| PykegError::Other(e.into()))?
                .progress_chars("#>-"),
        );
        pb.set_message(format!("⬇ {name}"));
        Some(pb)
    } else {
        None
    };

    let client = reqwest::Client::new();
    let mut response = client
        .get(url)
        .send()
        .await
        .context("Failed to send request")?
        .error_for_status()
        .with_context(|| format!("Server rejected download of {name}"))?;

    if let Some(pb) = &pb {
        if let Some(total) = response.content_length() {
            pb.set_length(total);
        }
    }

    let mut file = fs::File::create(output_path)
        .await
        .context("Failed to create output file")?;
    let mut downloaded: u64 = 0;

    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;
        if let Some(pb) = &pb {
            pb.set_position(downloaded);
        }
    }

    file.flush().await?;

    if let Some(pb) = &pb {
        pb.finish_with_message(format!("✓ {name}"));
    }

    Ok(())
}

/// Prefetch all of a formula's resources in parallel.
///
/// Returns archive paths in the declared resource order regardless of
/// download completion order, so the install loop can stay strictly ordered.
pub async fn fetch_resources(resources: &[Resource]) -> Result<Vec<(Resource, PathBuf)>> {
    let mp = MultiProgress::new();

    let fetches: Vec<_> = resources
        .iter()
        .map(|resource| {
            let mp = &mp;
            async move {
                let path =
                    fetch_verified(&resource.name, &resource.url, &resource.sha256, Some(mp))
                        .await?;
                Ok::<_, PykegError>((resource.clone(), path))
            }
        })
        .collect();

    futures::future::join_all(fetches).await.into_iter().collect()
}
