//! Command line interface for m365-packager.
//!
//! Merges flags with the optional settings file, wires the packaging tool,
//! version lookup and catalog client into a [`Publisher`], and prints the
//! run report.

mod args;
mod output;
mod settings_file;

pub use args::{Args, RuntimeConfig};
pub use output::OutputManager;
pub use settings_file::{CatalogSection, SettingsFile, VersionsSection};

use crate::{
    error::{CliError, Result},
    packager::{
        ClientCredentials, CommandPackagingTool, GraphCatalogClient, GraphOptions, PublishIntent,
        PublishReport, Publisher, ReleaseFeedLookup, Settings, SettingsBuilder,
        StaticVersionLookup, VersionLookup, publish::DecisionReason, resolve_tool,
    },
};
use anyhow::Context as _;
use std::{path::PathBuf, time::Duration};
use url::Url;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;
    let config = RuntimeConfig::from(&args);

    let file = match &args.settings {
        Some(path) => SettingsFile::load(path).await?,
        None => SettingsFile::default(),
    };

    let settings = build_settings(&args, &file)?;
    let publisher = build_publisher(settings, &file)?;

    let output = config.output();
    output.section(&format!(
        "Packaging {} for channel {}",
        publisher.settings().config_template().display(),
        publisher.settings().channel()
    ))?;

    output.progress("Running pipeline")?;
    let report = publisher.run().await?;
    print_report(output, &report)?;
    Ok(0)
}

fn required<T>(value: Option<T>, argument: &str) -> Result<T> {
    value.ok_or_else(|| {
        CliError::MissingArgument {
            argument: argument.to_string(),
        }
        .into()
    })
}

/// Merges flags over settings-file values.
pub fn build_settings(args: &Args, file: &SettingsFile) -> Result<Settings> {
    let tenant_id = required(
        args.tenant_id.clone().or_else(|| file.tenant_id.clone()),
        "--tenant-id",
    )?;
    let work_dir = args
        .work_dir
        .clone()
        .or_else(|| file.work_dir.clone())
        .unwrap_or_else(|| PathBuf::from("build"));

    if file.support.uninstall_config.as_os_str().is_empty() {
        return Err(CliError::MissingArgument {
            argument: "support.uninstall-config (settings file)".to_string(),
        }
        .into());
    }

    let mut builder = SettingsBuilder::new()
        .config_template(required(
            args.config.clone().or_else(|| file.config.clone()),
            "--config",
        )?)
        .manifest_template(required(
            file.manifest_template.clone(),
            "manifest-template (settings file)",
        )?)
        .installer(required(
            args.installer.clone().or_else(|| file.installer.clone()),
            "--installer",
        )?)
        .support_files(file.support.clone())
        .work_dir(work_dir)
        .layout(args.layout.or(file.layout).unwrap_or_default())
        .channel(required(args.channel.or(file.channel), "--channel")?)
        .company_name(required(
            args.company_name.clone().or_else(|| file.company_name.clone()),
            "--company-name",
        )?)
        .force(args.force)
        .intent(if args.build_only {
            PublishIntent::BuildOnly
        } else {
            PublishIntent::Publish
        });

    if let Some(icon) = &file.icon {
        builder = builder.icon(icon);
    }
    if let Some(version) = &args.installer_version {
        builder = builder.installer_version(version.clone());
    }
    if let Some(filter) = &file.catalog.display_name_filter {
        builder = builder.display_name_filter(filter.clone());
    }
    if let Some(kind) = file.catalog.supersedence {
        builder = builder.supersedence(kind);
    }
    if let Some(secs) = file.tool_timeout_secs {
        builder = builder.tool_timeout(Duration::from_secs(secs));
    }

    let client_id = args.client_id.clone().or_else(|| file.catalog.client_id.clone());
    match (client_id, args.client_secret.clone()) {
        (Some(client_id), Some(client_secret)) => {
            builder = builder.credentials(ClientCredentials {
                tenant_id: tenant_id.clone(),
                client_id,
                client_secret,
            });
        }
        (None, None) if args.build_only => {}
        (None, _) => {
            return Err(CliError::MissingArgument {
                argument: "--client-id".to_string(),
            }
            .into());
        }
        (Some(_), None) => {
            return Err(CliError::MissingArgument {
                argument: "--client-secret".to_string(),
            }
            .into());
        }
    }

    Ok(builder.tenant_id(tenant_id).build()?)
}

/// Wires the ports for a run.
fn build_publisher(settings: Settings, file: &SettingsFile) -> Result<Publisher> {
    let program = resolve_tool(file.tool.as_deref())?;
    let tool = CommandPackagingTool::new(program, settings.tool_timeout());
    let http = reqwest::Client::builder()
        .user_agent(concat!("m365-packager/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("building HTTP client")?;

    let lookup: Box<dyn VersionLookup> = match &file.versions.feed_url {
        Some(feed) => {
            let url = Url::parse(feed).with_context(|| format!("release feed URL {feed}"))?;
            Box::new(ReleaseFeedLookup::new(http.clone(), url))
        }
        None => {
            let pinned = file
                .versions
                .pinned_channels()
                .map_err(|reason| CliError::InvalidArguments { reason })?;
            Box::new(StaticVersionLookup::new(pinned))
        }
    };

    let has_credentials = settings.credentials().is_some();
    let mut publisher = Publisher::new(settings, Box::new(tool), lookup);

    if has_credentials {
        let mut options = GraphOptions::public_cloud()?;
        if let Some(authority) = &file.catalog.authority {
            options.authority = Url::parse(authority).context("catalog authority URL")?;
        }
        if let Some(root) = &file.catalog.graph_root {
            options.graph_root = Url::parse(root).context("catalog API root URL")?;
        }
        publisher = publisher.with_catalog(Box::new(GraphCatalogClient::new(http, options)));
    }
    Ok(publisher)
}

fn print_report(output: &OutputManager, report: &PublishReport) -> std::io::Result<()> {
    output.success(&format!(
        "Package {} ({} bytes)",
        report.artifact.path.display(),
        report.artifact.size
    ))?;
    output.indent(&format!("sha256 {}", report.artifact.checksum))?;
    output.indent(&format!("manifest {}", report.manifest_path.display()))?;
    output.indent(&format!(
        "{} {}",
        report.manifest.display_name, report.manifest.version
    ))?;
    if output.is_verbose() {
        let stages = report
            .stages
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" → ");
        output.verbose(&format!("stages: {stages}"))?;
    }

    if report.decision.reason == DecisionReason::ExistingVersionUnknown {
        output.warn("published record has no readable version")?;
    }
    output.println(&format!("Decision: {}", report.decision))?;
    if let Some(record) = &report.created {
        output.success(&format!("Published as {}", record.id))?;
    }
    if !report.superseded.is_empty() {
        output.success(&format!("Superseded {}", report.superseded.join(", ")))?;
    }
    if report.skipped() {
        output.println("No update needed")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packager::{Channel, SupportFiles};
    use clap::Parser;

    const TENANT: &str = "0f9e8d7c-6b5a-4c3d-2e1f-0a9b8c7d6e5f";

    fn file() -> SettingsFile {
        SettingsFile {
            config: Some("/repo/Configuration.xml".into()),
            manifest_template: Some("/repo/App.json".into()),
            installer: Some("/repo/setup.exe".into()),
            channel: Some(Channel::Current),
            company_name: Some("Contoso".into()),
            tenant_id: Some(TENANT.into()),
            support: SupportFiles {
                uninstall_config: "/repo/Uninstall.xml".into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn args(extra: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("m365-packager").chain(extra.iter().copied())).unwrap()
    }

    #[test]
    fn flags_override_file_values() {
        let settings = build_settings(
            &args(&["--channel", "SemiAnnual", "--build-only", "--work-dir", "/tmp/w"]),
            &file(),
        )
        .unwrap();
        assert_eq!(settings.channel(), Channel::SemiAnnual);
        assert_eq!(settings.company_name(), "Contoso");
        assert_eq!(settings.staging_dir(), PathBuf::from("/tmp/w/source"));
        assert_eq!(settings.intent(), PublishIntent::BuildOnly);
    }

    #[test]
    fn publishing_needs_a_client_secret() {
        let err = build_settings(&args(&["--client-id", "app"]), &file()).unwrap_err();
        assert!(err.to_string().contains("--client-secret"));
    }
}
