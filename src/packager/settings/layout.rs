//! Staging layouts and support-file sets.

use std::path::{Path, PathBuf};

/// How the staging tree is laid out before packaging.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Every file at the staging root; the installer is the setup file.
    #[default]
    Flat,
    /// Wrapper scripts at the root, installer and configuration under
    /// `Files/`, cleanup scripts under `SupportFiles/`; the first wrapper
    /// script is the setup file.
    Nested,
}

impl Layout {
    /// Directory, relative to the staging root, receiving the installer,
    /// configuration and uninstall descriptor.
    pub fn files_dir(self) -> &'static Path {
        match self {
            Self::Flat => Path::new(""),
            Self::Nested => Path::new("Files"),
        }
    }

    /// Directory, relative to the staging root, receiving cleanup scripts.
    pub fn support_dir(self) -> &'static Path {
        match self {
            Self::Flat => Path::new(""),
            Self::Nested => Path::new("SupportFiles"),
        }
    }
}

impl std::str::FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flat" => Ok(Self::Flat),
            "nested" => Ok(Self::Nested),
            other => Err(format!("Invalid layout: {other}. Valid layouts: flat, nested")),
        }
    }
}

/// Support files copied next to the installer.
#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SupportFiles {
    /// Uninstall configuration descriptor.
    pub uninstall_config: PathBuf,

    /// Wrapper/bootstrap scripts placed at the staging root.
    ///
    /// Required (at least one) for [`Layout::Nested`].
    #[serde(default)]
    pub wrapper_scripts: Vec<PathBuf>,

    /// Scripts that remove previously installed products.
    #[serde(default)]
    pub cleanup_scripts: Vec<PathBuf>,

    /// Deployment toolkit directory copied recursively to the staging root.
    #[serde(default)]
    pub toolkit_dir: Option<PathBuf>,
}

impl SupportFiles {
    /// Every file path that must exist before staging starts.
    pub fn required_files(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.uninstall_config.as_path())
            .chain(self.wrapper_scripts.iter().map(PathBuf::as_path))
            .chain(self.cleanup_scripts.iter().map(PathBuf::as_path))
            .chain(self.toolkit_dir.iter().map(PathBuf::as_path))
    }
}
