//! File system utilities for staging.
//!
//! Provides file operations with automatic directory creation and path
//! context on every error.

use crate::packager::error::{Error, ErrorExt, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Creates `path` if needed and fails if it already holds any entry.
///
/// Nothing is written when the directory is not empty.
pub async fn ensure_empty_dir(path: &Path) -> Result<()> {
    match fs::read_dir(path).await {
        Ok(mut entries) => {
            if entries
                .next_entry()
                .await
                .fs_context("listing destination", path)?
                .is_some()
            {
                return Err(Error::DestinationNotEmpty(path.to_path_buf()));
            }
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => fs::create_dir_all(path)
            .await
            .fs_context("creating destination", path),
        Err(e) => Err(Error::Fs {
            context: "opening destination",
            path: path.to_path_buf(),
            error: e,
        }),
    }
}

/// Returns the first path in `paths` that does not exist.
pub async fn first_missing<'a, I>(paths: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = &'a Path>,
{
    for path in paths {
        if !fs::try_exists(path).await.unwrap_or(false) {
            return Some(path.to_path_buf());
        }
    }
    None
}

/// Copies a regular file from one path to another, creating any parent
/// directories of the destination path as necessary.
///
/// Fails if the source path is a directory or doesn't exist.
pub async fn copy_file(from: &Path, to: &Path) -> Result<()> {
    let metadata = fs::metadata(from)
        .await
        .fs_context("reading source file", from)?;
    if !metadata.is_file() {
        return Err(Error::GenericError(format!("{} is not a file", from.display())));
    }
    if let Some(dest_dir) = to.parent() {
        fs::create_dir_all(dest_dir)
            .await
            .fs_context("creating destination directory", dest_dir)?;
    }
    fs::copy(from, to).await.fs_context("copying file", to)?;
    log::debug!("Copied {} -> {}", from.display(), to.display());
    Ok(())
}

/// Recursively copies a directory from one path to another, creating any
/// parent directories of the destination path as necessary.
///
/// Symlinks are followed; the staged tree only contains regular files.
pub async fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    if !from.is_dir() {
        return Err(Error::GenericError(format!("{} is not a directory", from.display())));
    }

    let from = from.to_path_buf();
    let to = to.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<()> {
        for entry in walkdir::WalkDir::new(&from).follow_links(true) {
            let entry = entry.map_err(|e| Error::GenericError(format!("walking {}: {e}", from.display())))?;
            let rel_path = entry
                .path()
                .strip_prefix(&from)
                .map_err(|e| Error::GenericError(e.to_string()))?;
            let dest_path = to.join(rel_path);

            if entry.file_type().is_dir() {
                std::fs::create_dir_all(&dest_path).fs_context("creating directory", &dest_path)?;
            } else {
                if let Some(parent) = dest_path.parent() {
                    std::fs::create_dir_all(parent).fs_context("creating directory", parent)?;
                }
                std::fs::copy(entry.path(), &dest_path).fs_context("copying file", &dest_path)?;
            }
        }
        Ok(())
    })
    .await
    .map_err(|e| Error::GenericError(format!("Directory copy task panicked: {e}")))?
}

/// Copies a file or directory into `dest_dir`, keeping its file name.
pub async fn copy_into(source: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let name = source
        .file_name()
        .ok_or_else(|| Error::GenericError(format!("{} has no file name", source.display())))?;
    let dest = dest_dir.join(name);

    if source.is_dir() {
        copy_dir(source, &dest).await?;
    } else {
        copy_file(source, &dest).await?;
    }
    Ok(dest)
}
