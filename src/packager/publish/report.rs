//! Run results.

use super::decision::PublishDecision;
use crate::packager::{
    assembler::PackageArtifact, catalog::PublishedPackageRecord, manifest::PackageManifest,
};
use std::{fmt, path::PathBuf};

/// States a run passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Inputs checked and configuration copy edited.
    Staged,
    /// Package tree staged and archived.
    Assembled,
    /// Manifest built and written.
    ManifestBuilt,
    /// Published versions compared.
    VersionChecked,
    /// New record created.
    Published,
    /// Nothing newer to publish.
    SkippedNoUpdate,
    /// Older records superseded.
    SupersedenceApplied,
    /// Run finished.
    Done,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Staged => "staged",
            Self::Assembled => "assembled",
            Self::ManifestBuilt => "manifest built",
            Self::VersionChecked => "version checked",
            Self::Published => "published",
            Self::SkippedNoUpdate => "skipped (no update)",
            Self::SupersedenceApplied => "supersedence applied",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct PublishReport {
    /// Stages visited, in order.
    pub stages: Vec<PipelineStage>,
    /// Edited configuration copy.
    pub configuration: PathBuf,
    /// Packaged archive.
    pub artifact: PackageArtifact,
    /// Manifest as written.
    pub manifest: PackageManifest,
    /// Where the manifest was written.
    pub manifest_path: PathBuf,
    /// Version-check outcome.
    pub decision: PublishDecision,
    /// Record created by this run.
    pub created: Option<PublishedPackageRecord>,
    /// Records now superseded by `created`.
    pub superseded: Vec<String>,
}

impl PublishReport {
    /// Returns whether a record was created.
    pub fn published(&self) -> bool {
        self.created.is_some()
    }

    /// Returns whether the run stopped because nothing newer was available.
    pub fn skipped(&self) -> bool {
        self.stages.contains(&PipelineStage::SkippedNoUpdate)
    }
}
