//! Archive content upload.
//!
//! A `.intunewin` archive is a zip holding the encrypted payload under
//! `IntuneWinPackage/Contents/` and its encryption metadata in
//! `IntuneWinPackage/Metadata/Detection.xml`. The service receives the
//! payload as block-blob uploads and the metadata on commit.

use crate::packager::error::{Error, ErrorExt, Result};
use base64::Engine;
use serde::Serialize;
use std::{io::Read, path::Path};
use xmltree::Element;

const METADATA_ENTRY: &str = "IntuneWinPackage/Metadata/Detection.xml";
const CONTENTS_DIR: &str = "IntuneWinPackage/Contents/";

/// Upload block size.
pub const BLOCK_SIZE: usize = 6 * 1024 * 1024;

/// Encryption metadata passed to the commit call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEncryptionInfo {
    pub encryption_key: String,
    pub mac_key: String,
    pub initialization_vector: String,
    pub mac: String,
    pub profile_identifier: String,
    pub file_digest: String,
    pub file_digest_algorithm: String,
}

/// Contents of a packaged archive needed for upload.
#[derive(Debug, Clone)]
pub struct PackageContent {
    /// Name of the encrypted payload inside the archive.
    pub file_name: String,
    /// Size of the payload before encryption.
    pub unencrypted_size: u64,
    /// Encrypted payload.
    pub encrypted: Vec<u8>,
    /// Encryption metadata.
    pub encryption: FileEncryptionInfo,
}

/// Parses `Detection.xml`.
pub fn parse_detection(xml: &[u8]) -> Result<(String, u64, FileEncryptionInfo)> {
    let root = Element::parse(xml)?;
    let text = |parent: &Element, name: &str| -> Result<String> {
        parent
            .get_child(name)
            .and_then(|e| e.get_text())
            .map(|t| t.trim().to_string())
            .ok_or_else(|| Error::ArchiveMetadata(format!("Detection.xml has no {name}")))
    };

    let file_name = text(&root, "FileName")?;
    let unencrypted_size = text(&root, "UnencryptedContentSize")?
        .parse::<u64>()
        .map_err(|e| Error::ArchiveMetadata(format!("UnencryptedContentSize: {e}")))?;

    let info = root
        .get_child("EncryptionInfo")
        .ok_or_else(|| Error::ArchiveMetadata("Detection.xml has no EncryptionInfo".into()))?;
    let encryption = FileEncryptionInfo {
        encryption_key: text(info, "EncryptionKey")?,
        mac_key: text(info, "MacKey")?,
        initialization_vector: text(info, "InitializationVector")?,
        mac: text(info, "Mac")?,
        profile_identifier: text(info, "ProfileIdentifier")?,
        file_digest: text(info, "FileDigest")?,
        file_digest_algorithm: text(info, "FileDigestAlgorithm")?,
    };

    Ok((file_name, unencrypted_size, encryption))
}

/// Reads metadata and payload from an archive.
pub async fn read_package(archive: &Path) -> Result<PackageContent> {
    let archive = archive.to_path_buf();
    tokio::task::spawn_blocking(move || read_package_blocking(&archive))
        .await
        .map_err(|e| Error::GenericError(format!("archive read task panicked: {e}")))?
}

fn read_package_blocking(archive: &Path) -> Result<PackageContent> {
    let file = std::fs::File::open(archive).fs_context("opening archive", archive)?;
    let mut zip = zip::ZipArchive::new(file)?;

    let mut metadata = Vec::new();
    zip.by_name(METADATA_ENTRY)?
        .read_to_end(&mut metadata)
        .fs_context("reading archive metadata", archive)?;
    let (file_name, unencrypted_size, encryption) = parse_detection(&metadata)?;

    let mut encrypted = Vec::new();
    zip.by_name(&format!("{CONTENTS_DIR}{file_name}"))?
        .read_to_end(&mut encrypted)
        .fs_context("reading archive payload", archive)?;

    log::debug!(
        "Archive payload {file_name}: {} bytes encrypted, {unencrypted_size} unencrypted",
        encrypted.len()
    );
    Ok(PackageContent {
        file_name,
        unencrypted_size,
        encrypted,
        encryption,
    })
}

/// Block id for the `index`th block. Ids must share one length.
pub fn block_id(index: usize) -> String {
    base64::engine::general_purpose::STANDARD.encode(format!("block-{index:08}"))
}

/// Block list committing `block_ids` in order.
pub fn block_list_xml(block_ids: &[String]) -> String {
    let mut xml = String::from(r#"<?xml version="1.0" encoding="utf-8"?><BlockList>"#);
    for id in block_ids {
        xml.push_str("<Latest>");
        xml.push_str(id);
        xml.push_str("</Latest>");
    }
    xml.push_str("</BlockList>");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DETECTION: &str = r#"<ApplicationInfo xmlns:xsd="http://www.w3.org/2001/XMLSchema" ToolVersion="1.8.6">
  <Name>setup.exe</Name>
  <UnencryptedContentSize>1234</UnencryptedContentSize>
  <FileName>IntunePackage.intunewin</FileName>
  <SetupFile>setup.exe</SetupFile>
  <EncryptionInfo>
    <EncryptionKey>ZW5j</EncryptionKey>
    <MacKey>bWFj</MacKey>
    <InitializationVector>aXY=</InitializationVector>
    <Mac>bWFjdmFs</Mac>
    <ProfileIdentifier>ProfileVersion1</ProfileIdentifier>
    <FileDigest>ZGlnZXN0</FileDigest>
    <FileDigestAlgorithm>SHA256</FileDigestAlgorithm>
  </EncryptionInfo>
</ApplicationInfo>"#;

    fn write_archive(path: &Path, payload: &[u8]) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file(METADATA_ENTRY, options).unwrap();
        zip.write_all(DETECTION.as_bytes()).unwrap();
        zip.start_file(format!("{CONTENTS_DIR}IntunePackage.intunewin"), options)
            .unwrap();
        zip.write_all(payload).unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn detection_metadata_is_parsed() {
        let (name, size, info) = parse_detection(DETECTION.as_bytes()).unwrap();
        assert_eq!(name, "IntunePackage.intunewin");
        assert_eq!(size, 1234);
        assert_eq!(info.profile_identifier, "ProfileVersion1");

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["fileDigestAlgorithm"], "SHA256");
        assert_eq!(json["initializationVector"], "aXY=");
    }

    #[test]
    fn incomplete_detection_metadata_is_an_archive_error() {
        let without_mac = DETECTION.replace("<Mac>bWFjdmFs</Mac>", "");
        let err = parse_detection(without_mac.as_bytes()).unwrap_err();
        assert!(matches!(&err, Error::ArchiveMetadata(field) if field.contains("Mac")));

        let without_info = r#"<ApplicationInfo>
  <UnencryptedContentSize>1</UnencryptedContentSize>
  <FileName>IntunePackage.intunewin</FileName>
</ApplicationInfo>"#;
        let err = parse_detection(without_info.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::ArchiveMetadata(_)));
    }

    #[tokio::test]
    async fn payload_is_read_from_archive() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("setup.intunewin");
        write_archive(&archive, b"encrypted-bytes");

        let content = read_package(&archive).await.unwrap();
        assert_eq!(content.encrypted, b"encrypted-bytes");
        assert_eq!(content.unencrypted_size, 1234);
    }

    #[test]
    fn block_ids_have_equal_length() {
        assert_eq!(block_id(0).len(), block_id(12345).len());
        let xml = block_list_xml(&[block_id(0), block_id(1)]);
        assert!(xml.starts_with("<?xml"));
        assert_eq!(xml.matches("<Latest>").count(), 2);
    }
}
