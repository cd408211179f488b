//! Staging tree assembly.

use super::tool::{PackagingRequest, PackagingTool};
use crate::packager::{
    error::{Error, Result},
    settings::{Layout, SupportFiles},
    utils::fs,
};
use std::path::{Path, PathBuf};

/// Inputs of [`assemble`].
#[derive(Debug, Clone)]
pub struct AssembleRequest<'a> {
    /// Staging tree root; must be empty or absent.
    pub staging_dir: &'a Path,
    /// Folder receiving the archive.
    pub output_dir: &'a Path,
    /// Support files copied next to the installer.
    pub support: &'a SupportFiles,
    /// Edited configuration document.
    pub config_document: &'a Path,
    /// Installer binary.
    pub installer: &'a Path,
    /// Staging layout.
    pub layout: Layout,
}

impl AssembleRequest<'_> {
    /// Every input that must exist before staging starts, in check order.
    pub fn required_inputs(&self) -> Vec<&Path> {
        let mut inputs = vec![self.installer, self.config_document];
        inputs.extend(self.support.required_files());
        inputs
    }

    /// Setup file the packaging tool is pointed at, relative to the staging root.
    pub fn setup_file(&self) -> Result<PathBuf> {
        let source = match self.layout {
            Layout::Flat => self.installer,
            Layout::Nested => self.support.wrapper_scripts.first().ok_or_else(|| {
                Error::GenericError("the nested layout needs a wrapper script".into())
            })?,
        };
        let name = source
            .file_name()
            .ok_or_else(|| Error::GenericError(format!("{} has no file name", source.display())))?;

        // Both the flat installer and the nested wrapper sit at the staging root.
        Ok(PathBuf::from(name))
    }
}

/// Result of a successful [`assemble`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedPackage {
    /// Staging tree root handed to the packaging tool.
    pub source_dir: PathBuf,
    /// Setup file relative to `source_dir`.
    pub setup_file: PathBuf,
    /// Folder the archive was written to.
    pub output_dir: PathBuf,
}

/// Checks that every required input exists.
///
/// # Errors
///
/// [`Error::MissingInput`] naming the first missing path.
pub async fn check_inputs(request: &AssembleRequest<'_>) -> Result<()> {
    match fs::first_missing(request.required_inputs()).await {
        Some(missing) => Err(Error::MissingInput(missing)),
        None => Ok(()),
    }
}

/// Stages the package tree and runs the packaging tool over it.
///
/// 1. Checks every input exists
/// 2. Ensures the staging directory is empty (creating it when absent)
/// 3. Copies files according to the layout
/// 4. Runs the packaging tool with overwrite enabled
///
/// Nothing is copied when steps 1 or 2 fail. Files copied before a later
/// failure are left in place.
pub async fn assemble(
    request: &AssembleRequest<'_>,
    tool: &dyn PackagingTool,
) -> Result<StagedPackage> {
    check_inputs(request).await?;
    fs::ensure_empty_dir(request.staging_dir).await?;
    let setup_file = request.setup_file()?;

    log::info!(
        "Staging {:?} layout in {}",
        request.layout,
        request.staging_dir.display()
    );

    let files_dir = request.staging_dir.join(request.layout.files_dir());
    let support_dir = request.staging_dir.join(request.layout.support_dir());

    fs::copy_into(request.installer, &files_dir).await?;
    fs::copy_into(request.config_document, &files_dir).await?;
    fs::copy_into(&request.support.uninstall_config, &files_dir).await?;

    for script in &request.support.wrapper_scripts {
        fs::copy_into(script, request.staging_dir).await?;
    }
    for script in &request.support.cleanup_scripts {
        fs::copy_into(script, &support_dir).await?;
    }
    if let Some(toolkit) = &request.support.toolkit_dir {
        fs::copy_dir(toolkit, request.staging_dir).await?;
    }

    tokio::fs::create_dir_all(request.output_dir)
        .await
        .map_err(|error| Error::Fs {
            context: "creating output directory",
            path: request.output_dir.to_path_buf(),
            error,
        })?;

    tool.package(&PackagingRequest {
        source_dir: request.staging_dir.to_path_buf(),
        setup_file: setup_file.clone(),
        output_dir: request.output_dir.to_path_buf(),
        overwrite: true,
    })
    .await?;

    Ok(StagedPackage {
        source_dir: request.staging_dir.to_path_buf(),
        setup_file,
        output_dir: request.output_dir.to_path_buf(),
    })
}
