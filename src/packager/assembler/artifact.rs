//! Archive discovery and checksums.

use crate::packager::error::{Error, ErrorExt, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

/// Extension of archives produced by the packaging tool.
pub const ARCHIVE_EXTENSION: &str = "intunewin";

/// The archive produced by a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageArtifact {
    /// Archive path.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
    /// Hex-encoded SHA-256 of the archive.
    pub checksum: String,
}

/// Finds the single archive in `output_dir`.
///
/// The packaging tool names its output after the setup file, and that
/// naming has changed between tool versions, so the archive is found by
/// extension instead.
///
/// # Errors
///
/// [`Error::ArtifactNotFound`] unless exactly one regular file with the
/// archive extension exists.
pub async fn locate(output_dir: &Path) -> Result<PackageArtifact> {
    let mut entries = tokio::fs::read_dir(output_dir)
        .await
        .fs_context("reading output directory", output_dir)?;

    let mut candidates = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .fs_context("reading output directory", output_dir)?
    {
        let path = entry.path();
        let is_archive = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(ARCHIVE_EXTENSION));
        let is_file = entry.file_type().await.is_ok_and(|t| t.is_file());

        if is_archive && is_file {
            log::debug!("  ✓ Artifact: {}", path.display());
            candidates.push(path);
        }
    }

    if candidates.len() != 1 {
        return Err(Error::ArtifactNotFound {
            dir: output_dir.to_path_buf(),
            extension: ARCHIVE_EXTENSION,
            count: candidates.len(),
        });
    }

    let path = candidates.remove(0);
    let size = tokio::fs::metadata(&path)
        .await
        .fs_context("reading artifact metadata", &path)?
        .len();
    let checksum = calculate_sha256(&path).await?;

    log::info!("Package archive {} ({size} bytes, sha256 {checksum})", path.display());
    Ok(PackageArtifact {
        path,
        size,
        checksum,
    })
}

/// Calculates the SHA-256 checksum of a file.
///
/// Reads the file in 8KB chunks to handle large archives.
pub async fn calculate_sha256(file_path: &Path) -> Result<String> {
    let mut file = tokio::fs::File::open(file_path)
        .await
        .fs_context("opening file for hashing", file_path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192];

    loop {
        let n = file
            .read(&mut buffer)
            .await
            .fs_context("reading file for hash calculation", file_path)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn locates_single_archive_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("setup.intunewin"), b"abc").unwrap();
        std::fs::write(dir.path().join("manifest.json"), b"{}").unwrap();

        let artifact = locate(dir.path()).await.unwrap();

        assert_eq!(artifact.path, dir.path().join("setup.intunewin"));
        assert_eq!(artifact.size, 3);
        assert_eq!(
            artifact.checksum,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn zero_or_many_archives_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            locate(dir.path()).await,
            Err(Error::ArtifactNotFound { count: 0, .. })
        ));

        std::fs::write(dir.path().join("a.intunewin"), b"a").unwrap();
        std::fs::write(dir.path().join("b.intunewin"), b"b").unwrap();
        assert!(matches!(
            locate(dir.path()).await,
            Err(Error::ArtifactNotFound { count: 2, .. })
        ));
    }
}
