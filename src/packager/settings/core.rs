//! Core Settings struct and implementations.

use super::{Channel, ClientCredentials, Layout, SupersedenceKind, SupportFiles};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// File name of the manifest written to the output directory.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Whether a run stops after building or goes on to publish.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum PublishIntent {
    /// Stage, package and write the manifest only.
    #[default]
    BuildOnly,
    /// Also create the remote record and apply supersedence.
    Publish,
}

/// Complete configuration of one packaging run.
///
/// Constructed via [`SettingsBuilder`](super::SettingsBuilder). Everything the
/// pipeline needs is carried here explicitly; nothing is read from process
/// state after construction.
///
/// # Working directory
///
/// ```text
/// <work_dir>/
///   config/<template file name>   edited configuration copy
///   source/                       staging tree handed to the packaging tool
///   output/                       archive and manifest.json
/// ```
#[derive(Clone, Debug)]
pub struct Settings {
    /// Configuration document template in the repository.
    config_template: PathBuf,

    /// Manifest JSON template.
    manifest_template: PathBuf,

    /// Installer binary.
    installer: PathBuf,

    /// Package icon.
    icon: Option<PathBuf>,

    /// Support files staged next to the installer.
    support: SupportFiles,

    /// Root of the working tree.
    work_dir: PathBuf,

    /// Staging layout.
    layout: Layout,

    /// Release channel written into the configuration.
    channel: Channel,

    /// Tenant identifier written into the configuration.
    tenant_id: String,

    /// Organization name written into the configuration.
    company_name: String,

    /// Installer version override.
    ///
    /// None means read it from the installer's version resource.
    installer_version: Option<String>,

    /// Build-only or publish.
    intent: PublishIntent,

    /// Publish even when the catalog already has an equal or newer version.
    force: bool,

    /// Credentials for the remote catalog.
    ///
    /// None means the catalog client is already authenticated.
    credentials: Option<ClientCredentials>,

    /// Display-name pattern used when listing remote records.
    display_name_filter: String,

    /// Relationship created when superseding older records.
    supersedence: SupersedenceKind,

    /// Upper bound on the packaging tool's run time.
    tool_timeout: Duration,
}

impl Settings {
    /// Returns the configuration document template path.
    pub fn config_template(&self) -> &Path {
        &self.config_template
    }

    /// Returns the manifest template path.
    pub fn manifest_template(&self) -> &Path {
        &self.manifest_template
    }

    /// Returns the installer path.
    pub fn installer(&self) -> &Path {
        &self.installer
    }

    /// Returns the icon path.
    pub fn icon(&self) -> Option<&Path> {
        self.icon.as_deref()
    }

    /// Returns the support files.
    pub fn support(&self) -> &SupportFiles {
        &self.support
    }

    /// Returns the working directory root.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Returns the staging tree root.
    pub fn staging_dir(&self) -> PathBuf {
        self.work_dir.join("source")
    }

    /// Returns the directory receiving the archive and manifest.
    pub fn output_dir(&self) -> PathBuf {
        self.work_dir.join("output")
    }

    /// Returns where the edited configuration copy is written.
    ///
    /// Keeps the template's file name so the installer finds the same name
    /// it was authored with.
    pub fn edited_config_path(&self) -> PathBuf {
        let name = self
            .config_template
            .file_name()
            .map(Path::new)
            .unwrap_or_else(|| Path::new("Configuration.xml"));
        self.work_dir.join("config").join(name)
    }

    /// Returns where the manifest is written.
    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir().join(MANIFEST_FILE_NAME)
    }

    /// Returns the staging layout.
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Returns the release channel.
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Returns the tenant identifier.
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Returns the organization name.
    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    /// Returns the installer version override.
    pub fn installer_version(&self) -> Option<&str> {
        self.installer_version.as_deref()
    }

    /// Returns the publish intent.
    pub fn intent(&self) -> PublishIntent {
        self.intent
    }

    /// Returns whether publishing is forced.
    pub fn force(&self) -> bool {
        self.force
    }

    /// Returns the catalog credentials.
    pub fn credentials(&self) -> Option<&ClientCredentials> {
        self.credentials.as_ref()
    }

    /// Returns the display-name pattern for remote listing.
    pub fn display_name_filter(&self) -> &str {
        &self.display_name_filter
    }

    /// Returns the supersedence relationship type.
    pub fn supersedence(&self) -> SupersedenceKind {
        self.supersedence
    }

    /// Returns the packaging tool timeout.
    pub fn tool_timeout(&self) -> Duration {
        self.tool_timeout
    }

    /// Creates a new Settings instance (used by SettingsBuilder).
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        config_template: PathBuf,
        manifest_template: PathBuf,
        installer: PathBuf,
        icon: Option<PathBuf>,
        support: SupportFiles,
        work_dir: PathBuf,
        layout: Layout,
        channel: Channel,
        tenant_id: String,
        company_name: String,
        installer_version: Option<String>,
        intent: PublishIntent,
        force: bool,
        credentials: Option<ClientCredentials>,
        display_name_filter: String,
        supersedence: SupersedenceKind,
        tool_timeout: Duration,
    ) -> Self {
        Self {
            config_template,
            manifest_template,
            installer,
            icon,
            support,
            work_dir,
            layout,
            channel,
            tenant_id,
            company_name,
            installer_version,
            intent,
            force,
            credentials,
            display_name_filter,
            supersedence,
            tool_timeout,
        }
    }
}
