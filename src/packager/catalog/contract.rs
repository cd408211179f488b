//! Remote catalog port.

use crate::packager::{
    error::Result,
    manifest::PackageManifest,
    settings::{ClientCredentials, SupersedenceKind},
};
use async_trait::async_trait;
use std::path::Path;

#[cfg(test)]
use mockall::automock;

/// A package record owned by the remote catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishedPackageRecord {
    /// Service-assigned identifier.
    pub id: String,
    /// Name shown in the catalog.
    pub display_name: String,
    /// Free-text notes; carries the tracking token.
    pub notes: String,
    /// Version the record reports. May be empty.
    pub display_version: String,
}

/// Device-management catalog the pipeline publishes to.
///
/// Only the operations the pipeline needs are exposed. Failures are
/// returned as-is; callers never retry.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Signs in with a client-credentials grant.
    async fn authenticate(&self, credentials: &ClientCredentials) -> Result<()>;

    /// Lists records whose display name contains `display_name_filter`.
    async fn list_packages(&self, display_name_filter: &str) -> Result<Vec<PublishedPackageRecord>>;

    /// Creates a record from a manifest and uploads the archive as its content.
    async fn create_package(
        &self,
        manifest: &PackageManifest,
        artifact: &Path,
    ) -> Result<PublishedPackageRecord>;

    /// Marks every record in `superseded_ids` as superseded by `target_id`.
    async fn supersede(
        &self,
        target_id: &str,
        superseded_ids: &[String],
        kind: SupersedenceKind,
    ) -> Result<()>;
}
