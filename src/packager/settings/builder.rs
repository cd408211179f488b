//! Builder for constructing Settings.

use super::{
    Channel, ClientCredentials, Layout, PublishIntent, Settings, SupersedenceKind, SupportFiles,
};
use crate::packager::error::{Context, Error, Result};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Default display-name pattern for listing remote records.
pub const DEFAULT_DISPLAY_NAME_FILTER: &str = "Microsoft 365 Apps";

/// Default packaging tool timeout (10 minutes).
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(600);

/// Builder for constructing [`Settings`].
///
/// # Examples
///
/// ```no_run
/// use m365_packager::packager::{Channel, SettingsBuilder, SupportFiles};
///
/// # fn example() -> m365_packager::packager::Result<()> {
/// let settings = SettingsBuilder::new()
///     .config_template("configs/O365ProPlus.xml")
///     .manifest_template("templates/App.json")
///     .installer("bin/setup.exe")
///     .support_files(SupportFiles {
///         uninstall_config: "configs/Uninstall.xml".into(),
///         ..Default::default()
///     })
///     .work_dir("build")
///     .channel(Channel::MonthlyEnterprise)
///     .tenant_id("6d9bd6b8-0d0f-4b0e-9a55-2b7c7d35b7e8")
///     .company_name("Contoso")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct SettingsBuilder {
    config_template: Option<PathBuf>,
    manifest_template: Option<PathBuf>,
    installer: Option<PathBuf>,
    icon: Option<PathBuf>,
    support: Option<SupportFiles>,
    work_dir: Option<PathBuf>,
    layout: Layout,
    channel: Option<Channel>,
    tenant_id: Option<String>,
    company_name: Option<String>,
    installer_version: Option<String>,
    intent: PublishIntent,
    force: bool,
    credentials: Option<ClientCredentials>,
    display_name_filter: Option<String>,
    supersedence: SupersedenceKind,
    tool_timeout: Option<Duration>,
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the configuration document template. Required.
    pub fn config_template<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_template = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the manifest template. Required.
    pub fn manifest_template<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.manifest_template = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the installer binary. Required.
    pub fn installer<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.installer = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the package icon.
    pub fn icon<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.icon = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the support files. Required.
    pub fn support_files(mut self, support: SupportFiles) -> Self {
        self.support = Some(support);
        self
    }

    /// Sets the working directory root. Required.
    pub fn work_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.work_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the staging layout.
    ///
    /// Default: [`Layout::Flat`]
    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Sets the release channel. Required.
    pub fn channel(mut self, channel: Channel) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Sets the tenant identifier. Required, must be a GUID.
    pub fn tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Sets the organization name. Required.
    pub fn company_name(mut self, name: impl Into<String>) -> Self {
        self.company_name = Some(name.into());
        self
    }

    /// Overrides the installer version instead of reading the binary.
    pub fn installer_version(mut self, version: impl Into<String>) -> Self {
        self.installer_version = Some(version.into());
        self
    }

    /// Sets whether the run publishes.
    ///
    /// Default: [`PublishIntent::BuildOnly`]
    pub fn intent(mut self, intent: PublishIntent) -> Self {
        self.intent = intent;
        self
    }

    /// Publishes regardless of the version comparison.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Sets catalog credentials.
    pub fn credentials(mut self, credentials: ClientCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Sets the display-name pattern for remote listing.
    ///
    /// Default: [`DEFAULT_DISPLAY_NAME_FILTER`]
    pub fn display_name_filter(mut self, filter: impl Into<String>) -> Self {
        self.display_name_filter = Some(filter.into());
        self
    }

    /// Sets the supersedence relationship type.
    ///
    /// Default: [`SupersedenceKind::Update`]
    pub fn supersedence(mut self, kind: SupersedenceKind) -> Self {
        self.supersedence = kind;
        self
    }

    /// Sets the packaging tool timeout.
    ///
    /// Default: [`DEFAULT_TOOL_TIMEOUT`]
    pub fn tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = Some(timeout);
        self
    }

    /// Builds the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if a required field is missing, the tenant id is not
    /// a GUID, or the nested layout has no wrapper script to use as its setup
    /// file.
    pub fn build(self) -> Result<Settings> {
        let tenant_id = self.tenant_id.context("tenant_id is required")?;
        if uuid::Uuid::parse_str(&tenant_id).is_err() {
            return Err(Error::InvalidIdentifier {
                field: "tenant id",
                value: tenant_id,
            });
        }

        let company_name = self.company_name.context("company_name is required")?;
        if company_name.trim().is_empty() {
            crate::bail!("company_name must not be empty");
        }

        let support = self.support.context("support_files is required")?;
        if self.layout == Layout::Nested && support.wrapper_scripts.is_empty() {
            crate::bail!("the nested layout needs at least one wrapper script as its setup file");
        }

        Ok(Settings::new(
            self.config_template.context("config_template is required")?,
            self.manifest_template
                .context("manifest_template is required")?,
            self.installer.context("installer is required")?,
            self.icon,
            support,
            self.work_dir.context("work_dir is required")?,
            self.layout,
            self.channel.context("channel is required")?,
            tenant_id,
            company_name,
            self.installer_version,
            self.intent,
            self.force,
            self.credentials,
            self.display_name_filter
                .unwrap_or_else(|| DEFAULT_DISPLAY_NAME_FILTER.to_string()),
            self.supersedence,
            self.tool_timeout.unwrap_or(DEFAULT_TOOL_TIMEOUT),
        ))
    }
}
