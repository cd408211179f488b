//! TOML settings file.
//!
//! Holds the values that rarely change between runs: repository paths,
//! support files, endpoints and pinned versions. Relative paths are
//! resolved against the file's own directory.
//!
//! ```toml
//! config = "configs/O365ProPlus.xml"
//! manifest-template = "templates/App.json"
//! installer = "bin/setup.exe"
//! work-dir = "build"
//! layout = "nested"
//! channel = "MonthlyEnterprise"
//! company-name = "Contoso"
//!
//! [support]
//! uninstall-config = "configs/Uninstall.xml"
//! wrapper-scripts = ["scripts/Deploy-Application.exe"]
//!
//! [catalog]
//! display-name-filter = "Microsoft 365 Apps"
//! supersedence = "update"
//!
//! [versions.pinned]
//! MonthlyEnterprise = "16.0.17928.20392"
//! ```

use crate::{
    error::PackagerError,
    packager::{Channel, Layout, SupersedenceKind, SupportFiles},
};
use path_absolutize::Absolutize;
use serde::Deserialize;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

/// Parsed settings file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SettingsFile {
    /// Configuration document template.
    pub config: Option<PathBuf>,
    /// Manifest template.
    pub manifest_template: Option<PathBuf>,
    /// Installer binary.
    pub installer: Option<PathBuf>,
    /// Package icon.
    pub icon: Option<PathBuf>,
    /// Working directory.
    pub work_dir: Option<PathBuf>,
    /// Staging layout.
    pub layout: Option<Layout>,
    /// Release channel.
    pub channel: Option<Channel>,
    /// Tenant id.
    pub tenant_id: Option<String>,
    /// Organization name.
    pub company_name: Option<String>,
    /// Packaging tool executable; searched on PATH when absent.
    pub tool: Option<PathBuf>,
    /// Packaging tool timeout in seconds.
    pub tool_timeout_secs: Option<u64>,
    /// Support files.
    #[serde(default)]
    pub support: SupportFiles,
    /// Remote catalog options.
    #[serde(default)]
    pub catalog: CatalogSection,
    /// Channel version sources.
    #[serde(default)]
    pub versions: VersionsSection,
}

/// `[catalog]` table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct CatalogSection {
    /// Application (client) id.
    pub client_id: Option<String>,
    /// Sign-in authority.
    pub authority: Option<String>,
    /// API root.
    pub graph_root: Option<String>,
    /// Display-name pattern used when listing records.
    pub display_name_filter: Option<String>,
    /// Supersedence relationship type.
    pub supersedence: Option<SupersedenceKind>,
}

/// `[versions]` table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct VersionsSection {
    /// Release feed URL.
    pub feed_url: Option<String>,
    /// Versions used when no feed is configured, keyed by channel name.
    #[serde(default)]
    pub pinned: HashMap<String, String>,
}

impl VersionsSection {
    /// Pinned versions with their channel names parsed.
    pub fn pinned_channels(&self) -> Result<HashMap<Channel, String>, String> {
        self.pinned
            .iter()
            .map(|(name, version)| Ok((name.parse::<Channel>()?, version.clone())))
            .collect()
    }
}

impl SettingsFile {
    /// Parses settings from TOML text. Paths are left as written.
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Reads a settings file and resolves its paths against its directory.
    pub async fn load(path: &Path) -> crate::error::Result<Self> {
        let text = tokio::fs::read_to_string(path).await?;
        let mut file = Self::parse(&text).map_err(|source| PackagerError::SettingsFile {
            path: path.to_path_buf(),
            source,
        })?;

        let absolute = path.absolutize()?.into_owned();
        let base = absolute.parent().unwrap_or_else(|| Path::new("/"));
        file.resolve_paths(base)?;
        log::debug!("Loaded settings from {}", path.display());
        Ok(file)
    }

    /// Makes every relative path absolute against `base`.
    pub fn resolve_paths(&mut self, base: &Path) -> std::io::Result<()> {
        let resolve = |p: &mut PathBuf| -> std::io::Result<()> {
            *p = p.absolutize_from(base)?.into_owned();
            Ok(())
        };

        for path in [
            &mut self.config,
            &mut self.manifest_template,
            &mut self.installer,
            &mut self.icon,
            &mut self.work_dir,
            &mut self.tool,
            &mut self.support.toolkit_dir,
        ]
        .into_iter()
        .flatten()
        {
            resolve(path)?;
        }

        if !self.support.uninstall_config.as_os_str().is_empty() {
            resolve(&mut self.support.uninstall_config)?;
        }
        for path in self
            .support
            .wrapper_scripts
            .iter_mut()
            .chain(self.support.cleanup_scripts.iter_mut())
        {
            resolve(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETTINGS: &str = r#"
config = "configs/O365ProPlus.xml"
manifest-template = "templates/App.json"
installer = "bin/setup.exe"
work-dir = "build"
layout = "nested"
channel = "MonthlyEnterprise"
company-name = "Contoso"
tool-timeout-secs = 900

[support]
uninstall-config = "configs/Uninstall.xml"
wrapper-scripts = ["scripts/Deploy-Application.exe"]

[catalog]
display-name-filter = "Microsoft 365 Apps"
supersedence = "replace"

[versions.pinned]
MonthlyEnterprise = "16.0.17928.20392"
"#;

    #[test]
    fn parses_every_section() {
        let file = SettingsFile::parse(SETTINGS).unwrap();
        assert_eq!(file.layout, Some(Layout::Nested));
        assert_eq!(file.channel, Some(Channel::MonthlyEnterprise));
        assert_eq!(file.catalog.supersedence, Some(SupersedenceKind::Replace));
        assert_eq!(
            file.versions.pinned_channels().unwrap().get(&Channel::MonthlyEnterprise).map(String::as_str),
            Some("16.0.17928.20392")
        );
        assert_eq!(file.support.wrapper_scripts.len(), 1);
    }

    #[test]
    fn unknown_keys_and_channels_are_rejected() {
        assert!(SettingsFile::parse("confg = \"x.xml\"").is_err());

        let file = SettingsFile::parse("[versions.pinned]\nMonthly = \"16.0\"").unwrap();
        assert!(file.versions.pinned_channels().is_err());
    }

    #[tokio::test]
    async fn relative_paths_resolve_against_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("packager.toml");
        std::fs::write(&path, SETTINGS).unwrap();

        let file = SettingsFile::load(&path).await.unwrap();

        assert_eq!(file.config, Some(dir.path().join("configs/O365ProPlus.xml")));
        assert_eq!(file.support.uninstall_config, dir.path().join("configs/Uninstall.xml"));
        assert_eq!(
            file.support.wrapper_scripts[0],
            dir.path().join("scripts/Deploy-Application.exe")
        );
    }
}
