//! Microsoft 365 Apps packaging and publishing.
//!
//! Turns an installer configuration, the installer and its support files into
//! a `.intunewin` archive plus manifest, and optionally publishes it to the
//! device-management catalog, superseding older versions of the same package.
//!
//! # Modules
//!
//! - [`config_document`] - installer configuration XML
//! - [`assembler`] - staging and the packaging tool
//! - [`manifest`] - package manifests
//! - [`lookup`] - current channel versions
//! - [`catalog`] - the remote catalog port and its Graph client
//! - [`publish`] - the pipeline and its publish policy
//! - [`settings`] - run configuration

pub mod assembler;
pub mod catalog;
pub mod config_document;
pub mod error;
pub mod installer;
pub mod lookup;
pub mod manifest;
pub mod publish;
pub mod settings;
pub mod utils;
pub mod version;

pub use assembler::{
    CommandPackagingTool, PackageArtifact, PackagingRequest, PackagingTool, resolve_tool,
};
pub use catalog::{
    CatalogClient, GraphCatalogClient, GraphOptions, PublishedPackageRecord, TrackingToken,
};
pub use config_document::ConfigurationDocument;
pub use error::{Error, Operation, Result};
pub use lookup::{ReleaseFeedLookup, StaticVersionLookup, VersionLookup};
pub use manifest::PackageManifest;
pub use publish::{PipelineStage, PublishDecision, PublishReport, Publisher};
pub use settings::{
    Arch, Channel, ClientCredentials, Layout, PublishIntent, Settings, SettingsBuilder,
    SupersedenceKind, SupportFiles,
};
pub use version::PackageVersion;
