//! Package manifest document.

use crate::packager::error::{ErrorExt, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Description of a package, used to drive publishing.
///
/// Keys the pipeline does not know are kept in `extra` and written back
/// unchanged, so templates can carry catalog-specific fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    /// Package version (the installer's file version).
    #[serde(default)]
    pub version: String,

    /// Name shown in the catalog.
    #[serde(default)]
    pub display_name: String,

    /// Long description.
    #[serde(default)]
    pub description: String,

    /// Publisher shown in the catalog.
    #[serde(default)]
    pub publisher: String,

    /// Icon file reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// Correlation key shared by every version of the same logical package.
    #[serde(default)]
    pub tracking_guid: String,

    /// Setup file, relative to the packaged source folder.
    #[serde(default)]
    pub setup_file: String,

    /// Install command line.
    #[serde(default)]
    pub install: String,

    /// Uninstall command line.
    #[serde(default)]
    pub uninstall: String,

    /// Rules deciding whether the package is installed on a device.
    #[serde(default)]
    pub detection_rules: Vec<DetectionRule>,

    /// Template keys passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One detection rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionRule {
    /// Rule kind, e.g. `registry`.
    pub kind: String,

    /// Registry key or file path the rule inspects.
    #[serde(default)]
    pub key_path: String,

    /// Value name; also the tag the builder uses to find the rule.
    #[serde(default)]
    pub value_name: String,

    /// Comparison type, e.g. `string` or `version`.
    #[serde(default)]
    pub operation: String,

    /// Comparison operator, e.g. `equal`.
    #[serde(default)]
    pub operator: String,

    /// Value compared against.
    #[serde(default)]
    pub value: String,

    /// Inspect the 32-bit registry view on 64-bit systems.
    #[serde(default, rename = "check32BitOn64System")]
    pub check_32bit_on_64_system: bool,

    /// Rule keys passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PackageManifest {
    /// Parses a manifest from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a manifest (or template) from disk.
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .fs_context("reading manifest", path)?;
        Self::from_json(&text)
    }

    /// Writes the manifest as pretty JSON, replacing any existing file.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .fs_context("creating manifest directory", parent)?;
        }
        tokio::fs::write(path, json)
            .await
            .fs_context("writing manifest", path)
    }

    /// Returns the first detection rule whose value name contains `tag`.
    pub fn rule_by_tag_mut(&mut self, tag: &str) -> Option<&mut DetectionRule> {
        self.detection_rules
            .iter_mut()
            .find(|rule| rule.value_name.contains(tag))
    }

    /// Returns the first detection rule whose value name contains `tag`.
    pub fn rule_by_tag(&self, tag: &str) -> Option<&DetectionRule> {
        self.detection_rules
            .iter()
            .find(|rule| rule.value_name.contains(tag))
    }
}
