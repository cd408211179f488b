//! Build-and-publish pipeline.

use super::{
    decision::{self, DecisionReason, PublishDecision},
    report::{PipelineStage, PublishReport},
};
use crate::packager::{
    assembler::{self, AssembleRequest, PackageArtifact, PackagingTool, StagedPackage},
    catalog::{CatalogClient, PublishedPackageRecord},
    config_document::{self, ConfigurationDocument},
    error::{Error, Operation, OperationExt, Result},
    installer,
    lookup::VersionLookup,
    manifest::{self, PackageManifest},
    settings::{PublishIntent, Settings},
    utils::fs,
    version::PackageVersion,
};
use std::path::Path;

/// Runs the packaging pipeline for one configuration.
///
/// Stages run strictly in order and the first failure aborts the run. Files
/// written and records created before a failure are left in place.
///
/// 1. Preflight: inputs exist, staging and output folders are empty
/// 2. Edit a copy of the configuration document
/// 3. Stage the package tree and run the packaging tool
/// 4. Build and write the manifest
/// 5. Compare with the versions already in the catalog
/// 6. Create the record (publish intent only)
/// 7. Supersede older records of the same package
///
/// # Examples
///
/// ```no_run
/// use m365_packager::packager::{
///     CommandPackagingTool, Publisher, Settings, StaticVersionLookup,
/// };
///
/// # async fn example(settings: Settings) -> m365_packager::packager::Result<()> {
/// let tool = CommandPackagingTool::new("IntuneWinAppUtil.exe", settings.tool_timeout());
/// let publisher = Publisher::new(settings, Box::new(tool), Box::new(StaticVersionLookup::default()));
/// let report = publisher.run().await?;
/// println!("{}", report.decision);
/// # Ok(())
/// # }
/// ```
pub struct Publisher {
    settings: Settings,
    tool: Box<dyn PackagingTool>,
    lookup: Box<dyn VersionLookup>,
    catalog: Option<Box<dyn CatalogClient>>,
}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("settings", &self.settings)
            .field("catalog", &self.catalog.as_ref().map(|_| "<CatalogClient>"))
            .finish_non_exhaustive()
    }
}

impl Publisher {
    /// Creates a publisher without a catalog. Only build-only runs succeed.
    pub fn new(
        settings: Settings,
        tool: Box<dyn PackagingTool>,
        lookup: Box<dyn VersionLookup>,
    ) -> Self {
        Self {
            settings,
            tool,
            lookup,
            catalog: None,
        }
    }

    /// Attaches the remote catalog.
    pub fn with_catalog(mut self, catalog: Box<dyn CatalogClient>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Returns the run settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Executes every stage and reports what happened.
    pub async fn run(&self) -> Result<PublishReport> {
        let mut stages = Vec::new();
        let settings = &self.settings;

        log::info!("→ Preflight");
        self.preflight().await.operation(Operation::Preflight)?;

        log::info!("→ Editing configuration");
        let configuration = settings.edited_config_path();
        let document = config_document::edit_copy(
            settings.config_template(),
            &configuration,
            settings.channel().as_str(),
            settings.tenant_id(),
            settings.company_name(),
        )
        .await
        .operation(Operation::EditConfiguration)?;
        stages.push(PipelineStage::Staged);

        log::info!("→ Assembling package");
        let (staged, artifact) = self
            .assemble(&configuration)
            .await
            .operation(Operation::AssemblePackage)?;
        stages.push(PipelineStage::Assembled);

        log::info!("→ Reading installer version");
        let version = self.installer_version().await.operation(Operation::InspectInstaller)?;

        log::info!("→ Building manifest");
        let manifest = self
            .build_manifest(&document, &staged, &version)
            .await
            .operation(Operation::BuildManifest)?;
        let manifest_path = settings.manifest_path();
        stages.push(PipelineStage::ManifestBuilt);

        if let (Some(catalog), Some(credentials)) = (&self.catalog, settings.credentials()) {
            log::info!("→ Signing in");
            catalog
                .authenticate(credentials)
                .await
                .operation(Operation::Authenticate)?;
        }

        let decision = match self.catalog.as_deref() {
            Some(catalog) => {
                log::info!("→ Checking published versions");
                let decision = self
                    .check_version(catalog, &version, &manifest.tracking_guid)
                    .await
                    .operation(Operation::CheckVersion)?;
                stages.push(PipelineStage::VersionChecked);
                decision
            }
            None => PublishDecision::not_checked(),
        };
        log::info!("Decision: {decision}");

        let mut report = PublishReport {
            stages,
            configuration,
            artifact,
            manifest,
            manifest_path,
            decision,
            created: None,
            superseded: Vec::new(),
        };

        if !report.decision.publish {
            if report.decision.reason != DecisionReason::NotChecked {
                report.stages.push(PipelineStage::SkippedNoUpdate);
            }
            report.stages.push(PipelineStage::Done);
            return Ok(report);
        }
        if settings.intent() == PublishIntent::BuildOnly {
            log::info!("Build-only run; not publishing");
            report.stages.push(PipelineStage::Done);
            return Ok(report);
        }

        log::info!("→ Creating package record");
        let created = self
            .create(&report.manifest, &report.artifact)
            .await
            .operation(Operation::CreatePackage)?;
        report.stages.push(PipelineStage::Published);

        log::info!("→ Applying supersedence");
        let superseded = self
            .supersede_older(&created, &report.manifest.tracking_guid)
            .await
            .operation(Operation::ApplySupersedence)?;
        if !superseded.is_empty() {
            report.stages.push(PipelineStage::SupersedenceApplied);
        }

        report.created = Some(created);
        report.superseded = superseded;
        report.stages.push(PipelineStage::Done);
        Ok(report)
    }

    /// Checks inputs and destinations before anything is written.
    async fn preflight(&self) -> Result<()> {
        let settings = &self.settings;
        if settings.intent() == PublishIntent::Publish && self.catalog.is_none() {
            return Err(Error::GenericError("publishing needs a catalog client".into()));
        }

        let mut inputs = vec![
            settings.config_template(),
            settings.manifest_template(),
            settings.installer(),
        ];
        inputs.extend(settings.support().required_files());
        inputs.extend(settings.icon());

        if let Some(missing) = fs::first_missing(inputs).await {
            return Err(Error::MissingInput(missing));
        }

        fs::ensure_empty_dir(&settings.staging_dir()).await?;
        fs::ensure_empty_dir(&settings.output_dir()).await
    }

    async fn assemble(
        &self,
        configuration: &Path,
    ) -> Result<(StagedPackage, PackageArtifact)> {
        let settings = &self.settings;
        let staging_dir = settings.staging_dir();
        let output_dir = settings.output_dir();

        let request = AssembleRequest {
            staging_dir: &staging_dir,
            output_dir: &output_dir,
            support: settings.support(),
            config_document: configuration,
            installer: settings.installer(),
            layout: settings.layout(),
        };
        let staged = assembler::assemble(&request, self.tool.as_ref()).await?;
        let artifact = assembler::locate(&output_dir).await?;
        Ok((staged, artifact))
    }

    async fn installer_version(&self) -> Result<PackageVersion> {
        let raw = match self.settings.installer_version() {
            Some(version) => version.to_string(),
            None => installer::read_file_version(self.settings.installer()).await?,
        };
        PackageVersion::parse(&raw)
    }

    async fn build_manifest(
        &self,
        document: &ConfigurationDocument,
        staged: &StagedPackage,
        version: &PackageVersion,
    ) -> Result<PackageManifest> {
        let settings = &self.settings;
        let template = PackageManifest::load(settings.manifest_template()).await?;

        let mut manifest = manifest::build(
            &template,
            document,
            version.as_str(),
            settings.channel(),
            self.lookup.as_ref(),
        )
        .await?;
        manifest.setup_file = staged.setup_file.to_string_lossy().into_owned();
        if let Some(icon) = settings.icon() {
            manifest.icon = Some(icon.to_string_lossy().into_owned());
        }

        manifest.save(&settings.manifest_path()).await?;
        log::info!("✓ Manifest written to {}", settings.manifest_path().display());
        Ok(manifest)
    }

    async fn check_version(
        &self,
        catalog: &dyn CatalogClient,
        version: &PackageVersion,
        tracking_guid: &str,
    ) -> Result<PublishDecision> {
        let records = catalog
            .list_packages(self.settings.display_name_filter())
            .await?;
        let tracked = decision::tracked(&records, tracking_guid);
        log::debug!("{} record(s) track {tracking_guid}", tracked.len());
        Ok(decision::decide(version, &tracked, self.settings.force()))
    }

    fn catalog(&self) -> Result<&dyn CatalogClient> {
        self.catalog
            .as_deref()
            .ok_or_else(|| Error::GenericError("publishing needs a catalog client".into()))
    }

    async fn create(
        &self,
        manifest: &PackageManifest,
        artifact: &PackageArtifact,
    ) -> Result<PublishedPackageRecord> {
        let record = self.catalog()?.create_package(manifest, &artifact.path).await?;
        log::info!("✓ Published {} as {}", manifest.display_name, record.id);
        Ok(record)
    }

    /// Supersedes every other record tracking the same package with `created`.
    async fn supersede_older(
        &self,
        created: &PublishedPackageRecord,
        tracking_guid: &str,
    ) -> Result<Vec<String>> {
        let catalog = self.catalog()?;
        let records = catalog
            .list_packages(self.settings.display_name_filter())
            .await?;
        let older: Vec<String> = decision::tracked(&records, tracking_guid)
            .into_iter()
            .filter(|r| r.id != created.id)
            .map(|r| r.id.clone())
            .collect();

        if older.is_empty() {
            log::info!("No older records to supersede");
            return Ok(older);
        }

        catalog
            .supersede(&created.id, &older, self.settings.supersedence())
            .await?;
        Ok(older)
    }
}
