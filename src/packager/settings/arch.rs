//! CPU architecture of the installed suite.

/// Architecture the installer configuration targets.
///
/// Derived from the `OfficeClientEdition` attribute of the configuration
/// document: `"64"` selects [`Arch::X64`], anything else [`Arch::X86`].
///
/// # Examples
///
/// ```
/// use m365_packager::packager::Arch;
///
/// assert_eq!(Arch::from_edition("64"), Arch::X64);
/// assert_eq!(Arch::from_edition("32").suffix(), "x86");
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// 64-bit edition
    X64,
    /// 32-bit edition
    X86,
}

impl Arch {
    /// Maps an edition code to an architecture.
    pub fn from_edition(code: &str) -> Self {
        if code.trim() == "64" {
            Self::X64
        } else {
            Self::X86
        }
    }

    /// Returns the display suffix used in package names.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::X64 => "x64",
            Self::X86 => "x86",
        }
    }
}
