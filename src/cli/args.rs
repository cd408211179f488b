//! Command line argument parsing and validation.
//!
//! Flags override values from the optional settings file; see
//! [`SettingsFile`](super::SettingsFile).

use crate::packager::{Channel, Layout};
use clap::Parser;
use std::path::PathBuf;

/// Builds and publishes Microsoft 365 Apps packages
#[derive(Parser, Debug)]
#[command(
    name = "m365-packager",
    version,
    about = "Builds and publishes Microsoft 365 Apps packages",
    long_about = "Edits an Office Deployment Tool configuration, packages it with setup.exe into an
.intunewin archive, writes the package manifest, and publishes the package to Intune when
it is newer than what is already published. Older versions are superseded.

Usage:
  m365-packager --settings packager.toml --channel MonthlyEnterprise --build-only
  m365-packager --config configs/O365ProPlus.xml --tenant-id <GUID> --company-name Contoso \\
                --client-id <APP ID> --client-secret <SECRET>

Exit code 0 = package built (and published, or already up to date)."
)]
pub struct Args {
    /// Configuration document template (Office Deployment Tool XML)
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Release channel: BetaChannel, CurrentPreview, Current, MonthlyEnterprise,
    /// SemiAnnualPreview, SemiAnnual
    #[arg(long, value_name = "CHANNEL")]
    pub channel: Option<Channel>,

    /// Organization name written into the configuration
    #[arg(long, value_name = "NAME")]
    pub company_name: Option<String>,

    /// Directory tenant id (GUID); also the sign-in tenant
    #[arg(long, value_name = "GUID", env = "M365_TENANT_ID")]
    pub tenant_id: Option<String>,

    /// Application (client) id used to sign in
    #[arg(long, value_name = "ID", env = "M365_CLIENT_ID")]
    pub client_id: Option<String>,

    /// Application secret used to sign in
    #[arg(long, value_name = "SECRET", env = "M365_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Settings file (TOML)
    #[arg(short = 's', long, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Working directory for the staged tree, edited configuration and output
    #[arg(short = 'w', long, value_name = "PATH")]
    pub work_dir: Option<PathBuf>,

    /// Installer binary (setup.exe)
    #[arg(long, value_name = "PATH")]
    pub installer: Option<PathBuf>,

    /// Package version to use instead of the installer's file version
    #[arg(long, value_name = "VERSION")]
    pub installer_version: Option<String>,

    /// Staging layout: flat or nested
    #[arg(long, value_name = "LAYOUT")]
    pub layout: Option<Layout>,

    /// Build the package and manifest without publishing
    #[arg(long)]
    pub build_only: bool,

    /// Publish even if the catalog already has this version or newer
    #[arg(long)]
    pub force: bool,

    /// Verbose output
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.company_name.as_ref().is_some_and(|n| n.trim().is_empty()) {
            return Err("Company name cannot be empty".to_string());
        }

        if self.build_only && self.force {
            return Err("--force has no effect with --build-only".to_string());
        }

        if let Some(version) = &self.installer_version {
            crate::packager::PackageVersion::parse(version)
                .map_err(|_| format!("Invalid installer version: {version}"))?;
        }

        Ok(())
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self {
            output: super::OutputManager::new(args.verbose, args.quiet),
        }
    }
}

impl RuntimeConfig {
    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }
}
