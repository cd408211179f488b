//! Dotted numeric versions as used by installers and catalog records.

use crate::packager::error::{Error, Result};
use std::{cmp::Ordering, fmt, str::FromStr};

/// A version made of dot-separated numeric components, e.g. `16.0.17928.20114`.
///
/// Ordering is numeric per component and missing trailing components count
/// as zero, so `9.10 > 9.9`, `10.0 > 9.0` and `1.2 == 1.2.0.0`.
#[derive(Debug, Clone, Eq)]
pub struct PackageVersion {
    parts: Vec<u64>,
    raw: String,
}

impl PackageVersion {
    /// Parses a version string.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidVersion`] if the string is empty or any component is
    /// not a non-negative integer.
    pub fn parse(version: &str) -> Result<Self> {
        let trimmed = version.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidVersion(version.to_string()));
        }

        let parts = trimmed
            .split('.')
            .map(|part| part.parse::<u64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| Error::InvalidVersion(version.to_string()))?;

        Ok(Self {
            parts,
            raw: trimmed.to_string(),
        })
    }

    /// Returns the numeric components.
    pub fn parts(&self) -> &[u64] {
        &self.parts
    }

    /// Returns the version as it was written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    fn component(&self, index: usize) -> u64 {
        self.parts.get(index).copied().unwrap_or(0)
    }
}

impl Ord for PackageVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        (0..len)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for PackageVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PackageVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl FromStr for PackageVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> PackageVersion {
        PackageVersion::parse(s).unwrap()
    }

    #[test]
    fn compares_numerically_not_lexically() {
        assert!(v("9.10") > v("9.9"));
        assert!(v("10.0") > v("9.0"));
        assert!(v("16.0.17928.20114") > v("16.0.9999.99999"));
    }

    #[test]
    fn missing_components_are_zero() {
        assert_eq!(v("1.2"), v("1.2.0.0"));
        assert!(v("1.2.0.1") > v("1.2"));
    }

    #[test]
    fn rejects_empty_and_non_numeric() {
        assert!(PackageVersion::parse("").is_err());
        assert!(PackageVersion::parse("  ").is_err());
        assert!(PackageVersion::parse("2409 (Build 18025.20160)").is_err());
        assert!(PackageVersion::parse("1..2").is_err());
    }

    #[test]
    fn keeps_original_text() {
        assert_eq!(v(" 16.0.1 ").to_string(), "16.0.1");
    }
}
