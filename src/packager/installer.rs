//! Installer binary inspection.
//!
//! The package version is the installer's own file version, taken from the
//! `VS_FIXEDFILEINFO` block of its PE version resource.

use crate::packager::error::{Error, ErrorExt, Result};
use goblin::pe::{PE, resource::VersionField};
use std::path::Path;

/// Reads the file version of an installer binary.
///
/// Returns the four-part version, e.g. `16.0.17928.20114`.
///
/// # Errors
///
/// [`Error::InstallerVersion`] if the file is not a PE image or carries no
/// version resource.
pub async fn read_file_version(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .fs_context("reading installer", path)?;

    let version = file_version(&bytes)
        .map_err(|e| Error::InstallerVersion {
            path: path.to_path_buf(),
            reason: format!("failed to parse PE image: {e}"),
        })?
        .ok_or_else(|| Error::InstallerVersion {
            path: path.to_path_buf(),
            reason: "no version resource".into(),
        })?;
    log::info!("Installer {} has file version {version}", path.display());
    Ok(version)
}

/// Extracts the file version from a PE image.
///
/// `Ok(None)` when the image parses but has no fixed file info.
pub fn file_version(bytes: &[u8]) -> std::result::Result<Option<String>, goblin::error::Error> {
    let pe = PE::parse(bytes)?;
    let version = pe
        .resource_data
        .and_then(|resources| resources.version_info)
        .and_then(|info| info.fixed_info)
        .map(|fixed| {
            VersionField::from_ms_ls(fixed.file_version_ms, fixed.file_version_ls).to_string()
        });
    Ok(version)
}

/// Builds a minimal PE32 image whose version resource reports `version`.
#[cfg(test)]
pub(crate) fn fake_installer_bytes(version: [u16; 4]) -> Vec<u8> {
    fixture::pe_image(&[], Some(version))
}

#[cfg(test)]
mod fixture {
    //! Hand-assembled PE32 image: headers, a `.data` section at file offset
    //! 0x200 (RVA 0x1000) and a `.rsrc` section at 0x400 (RVA 0x2000).

    const FILE_ALIGNMENT: u32 = 0x200;
    const DATA_OFFSET: usize = 0x200;
    const RSRC_OFFSET: usize = 0x400;
    const RSRC_RVA: u32 = 0x2000;
    const VERSION_INFO_LEN: usize = 92;
    const VERSION_INFO_AT: usize = 0x58;

    fn put_u16(bytes: &mut [u8], at: usize, value: u16) {
        bytes[at..at + 2].copy_from_slice(&value.to_le_bytes());
    }

    fn put_u32(bytes: &mut [u8], at: usize, value: u32) {
        bytes[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }

    fn section(bytes: &mut [u8], at: usize, name: &[u8], size: u32, rva: u32, raw: usize) {
        bytes[at..at + name.len()].copy_from_slice(name);
        put_u32(bytes, at + 8, size);
        put_u32(bytes, at + 12, rva);
        put_u32(bytes, at + 16, FILE_ALIGNMENT);
        put_u32(bytes, at + 20, raw as u32);
        put_u32(bytes, at + 36, 0x4000_0040);
    }

    /// One-entry resource directory at `at` whose entry is `id` -> `target`.
    fn directory(bytes: &mut [u8], at: usize, id: u32, target: u32) {
        put_u16(bytes, at + 14, 1);
        put_u32(bytes, at + 16, id);
        put_u32(bytes, at + 20, target);
    }

    pub(super) fn pe_image(data: &[u8], version: Option<[u16; 4]>) -> Vec<u8> {
        let mut bytes = vec![0u8; 0x600];

        // DOS header, PE signature at 0x40
        put_u16(&mut bytes, 0, 0x5A4D);
        put_u32(&mut bytes, 0x3C, 0x40);
        put_u32(&mut bytes, 0x40, 0x0000_4550);

        // COFF header
        put_u16(&mut bytes, 0x44, 0x014C);
        put_u16(&mut bytes, 0x46, 2);
        put_u16(&mut bytes, 0x54, 0xE0);
        put_u16(&mut bytes, 0x56, 0x0102);

        // Optional header (PE32)
        put_u16(&mut bytes, 0x58, 0x010B);
        put_u32(&mut bytes, 0x74, 0x0040_0000);
        put_u32(&mut bytes, 0x78, 0x1000);
        put_u32(&mut bytes, 0x7C, FILE_ALIGNMENT);
        put_u32(&mut bytes, 0x90, 0x3000);
        put_u32(&mut bytes, 0x94, 0x200);
        put_u16(&mut bytes, 0x9C, 2);
        put_u32(&mut bytes, 0xB4, 16);

        let rsrc_len = (VERSION_INFO_AT + VERSION_INFO_LEN) as u32;
        section(&mut bytes, 0x138, b".data", 0x200, 0x1000, DATA_OFFSET);
        section(&mut bytes, 0x160, b".rsrc", rsrc_len, RSRC_RVA, RSRC_OFFSET);
        bytes[DATA_OFFSET..DATA_OFFSET + data.len()].copy_from_slice(data);

        let Some([major, minor, build, revision]) = version else {
            return bytes;
        };

        // Resource data directory
        put_u32(&mut bytes, 0xC8, RSRC_RVA);
        put_u32(&mut bytes, 0xCC, rsrc_len);

        // RT_VERSION -> id 1 -> language 0x409 -> data entry
        let r = RSRC_OFFSET;
        directory(&mut bytes, r, 16, 0x8000_0018);
        directory(&mut bytes, r + 0x18, 1, 0x8000_0030);
        directory(&mut bytes, r + 0x30, 0x409, 0x48);
        put_u32(&mut bytes, r + 0x48, RSRC_RVA + VERSION_INFO_AT as u32);
        put_u32(&mut bytes, r + 0x4C, VERSION_INFO_LEN as u32);

        // VS_VERSIONINFO with only the fixed file info
        let v = r + VERSION_INFO_AT;
        put_u16(&mut bytes, v, VERSION_INFO_LEN as u16);
        put_u16(&mut bytes, v + 2, 52);
        for (i, unit) in "VS_VERSION_INFO".encode_utf16().enumerate() {
            put_u16(&mut bytes, v + 6 + i * 2, unit);
        }
        let ms = (u32::from(major) << 16) | u32::from(minor);
        let ls = (u32::from(build) << 16) | u32::from(revision);
        let fixed = v + 40;
        put_u32(&mut bytes, fixed, 0xFEEF_04BD);
        put_u32(&mut bytes, fixed + 4, 0x0001_0000);
        put_u32(&mut bytes, fixed + 8, ms);
        put_u32(&mut bytes, fixed + 12, ls);
        put_u32(&mut bytes, fixed + 16, ms);
        put_u32(&mut bytes, fixed + 20, ls);
        put_u32(&mut bytes, fixed + 24, 0x3F);
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_fixed_file_info() {
        let bytes = fake_installer_bytes([16, 0, 17928, 20114]);
        assert_eq!(
            file_version(&bytes).unwrap().as_deref(),
            Some("16.0.17928.20114")
        );
    }

    #[test]
    fn signature_outside_the_version_resource_is_ignored() {
        let mut data = 0xFEEF_04BDu32.to_le_bytes().to_vec();
        data.extend_from_slice(&[0xAA; 16]);
        let bytes = fixture::pe_image(&data, Some([16, 0, 18025, 20160]));

        assert_eq!(
            file_version(&bytes).unwrap().as_deref(),
            Some("16.0.18025.20160")
        );
    }

    #[test]
    fn image_without_resources_has_no_version() {
        let bytes = fixture::pe_image(&[], None);
        assert_eq!(file_version(&bytes).unwrap(), None);
    }

    #[test]
    fn non_pe_input_is_rejected() {
        assert!(file_version(b"MZ no resources here").is_err());
    }

    #[tokio::test]
    async fn reads_version_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setup.exe");
        std::fs::write(&path, fake_installer_bytes([16, 0, 18025, 20160])).unwrap();
        assert_eq!(read_file_version(&path).await.unwrap(), "16.0.18025.20160");
    }

    #[tokio::test]
    async fn missing_version_resource_names_the_installer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setup.exe");
        std::fs::write(&path, fixture::pe_image(&[], None)).unwrap();

        let err = read_file_version(&path).await.unwrap_err();
        assert!(matches!(&err, Error::InstallerVersion { reason, .. } if reason == "no version resource"));
        assert!(err.to_string().contains("setup.exe"));
    }
}
