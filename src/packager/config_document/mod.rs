//! Installer configuration documents.
//!
//! - `document` - parsing, field accessors and persistence
//! - `editor` - the channel/tenant/organization update applied to a staged copy

mod document;
mod editor;

pub use document::{
    COMPANY_SETTING, ConfigurationDocument, Product, ROOT_ELEMENT, SHARED_LICENSING_PROPERTY,
    TENANT_ID_PROPERTY,
};
pub use editor::{edit_copy, update};

#[cfg(test)]
pub(crate) mod fixtures {
    /// Configuration used across unit tests. `TenantId` is deliberately not
    /// the first property.
    pub const CONFIGURATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Configuration ID="3f1c2a4e-8d2b-4f6a-9c1e-5b7d9e0a1f23">
  <Info Description="Microsoft 365 Apps for enterprise" />
  <Add OfficeClientEdition="64" Channel="Current" MigrateArch="TRUE">
    <Product ID="O365ProPlusRetail">
      <Language ID="MatchOS" />
      <ExcludeApp ID="Groove" />
      <ExcludeApp ID="Lync" />
    </Product>
  </Add>
  <Property Name="SharedComputerLicensing" Value="0" />
  <Property Name="FORCEAPPSHUTDOWN" Value="FALSE" />
  <Property Name="TenantId" Value="00000000-0000-0000-0000-000000000000" />
  <Updates Enabled="TRUE" />
  <AppSettings>
    <Setup Name="Company" Value="Placeholder" />
  </AppSettings>
  <Display Level="None" AcceptEULA="TRUE" />
</Configuration>
"#;

    pub const WITHOUT_TENANT: &str = r#"<Configuration ID="3f1c2a4e-8d2b-4f6a-9c1e-5b7d9e0a1f23">
  <Add OfficeClientEdition="32" Channel="Current">
    <Product ID="O365BusinessRetail" />
  </Add>
  <Property Name="SharedComputerLicensing" Value="1" />
</Configuration>
"#;
}

#[cfg(test)]
mod tests {
    use super::fixtures::{CONFIGURATION, WITHOUT_TENANT};
    use super::*;
    use crate::packager::Error;

    const TENANT: &str = "6d9bd6b8-0d0f-4b0e-9a55-2b7c7d35b7e8";

    fn parsed(xml: &str) -> ConfigurationDocument {
        ConfigurationDocument::parse(xml.as_bytes()).unwrap()
    }

    #[test]
    fn reads_fields_by_name() {
        let doc = parsed(CONFIGURATION);
        assert_eq!(doc.id(), "3f1c2a4e-8d2b-4f6a-9c1e-5b7d9e0a1f23");
        assert_eq!(doc.channel(), Some("Current"));
        assert_eq!(doc.edition(), Some("64"));
        assert_eq!(doc.property(SHARED_LICENSING_PROPERTY), Some("0"));
        assert_eq!(doc.company_name(), Some("Placeholder"));
        assert_eq!(
            doc.products(),
            vec![Product {
                id: "O365ProPlusRetail".into(),
                excluded_apps: vec!["Groove".into(), "Lync".into()],
            }]
        );
    }

    #[test]
    fn update_sets_requested_fields_and_keeps_the_rest() {
        let doc = update(parsed(CONFIGURATION), "MonthlyEnterprise", TENANT, "Contoso").unwrap();

        assert_eq!(doc.channel(), Some("MonthlyEnterprise"));
        assert_eq!(doc.property(TENANT_ID_PROPERTY), Some(TENANT));
        assert_eq!(doc.company_name(), Some("Contoso"));

        assert_eq!(doc.description(), Some("Microsoft 365 Apps for enterprise"));
        assert_eq!(doc.property("FORCEAPPSHUTDOWN"), Some("FALSE"));
        assert_eq!(doc.edition(), Some("64"));
        assert_eq!(doc.products().len(), 1);
    }

    #[test]
    fn update_is_idempotent() {
        let once = update(parsed(CONFIGURATION), "SemiAnnual", TENANT, "Contoso").unwrap();
        let once_xml = once.to_xml().unwrap();
        let twice = update(once, "SemiAnnual", TENANT, "Contoso").unwrap();
        assert_eq!(once_xml, twice.to_xml().unwrap());
    }

    #[test]
    fn serialized_update_reads_back() {
        let doc = update(parsed(CONFIGURATION), "Current", TENANT, "Fabrikam").unwrap();
        let reread = ConfigurationDocument::parse(&doc.to_xml().unwrap()).unwrap();
        assert_eq!(reread.property(TENANT_ID_PROPERTY), Some(TENANT));
        assert_eq!(reread.company_name(), Some("Fabrikam"));
    }

    #[test]
    fn missing_tenant_property_is_an_error() {
        let err = update(parsed(WITHOUT_TENANT), "Current", TENANT, "Contoso").unwrap_err();
        assert!(matches!(err, Error::ConfigFieldNotFound(field) if field.contains("TenantId")));
    }

    #[test]
    fn tenant_lookup_is_case_sensitive() {
        let xml = WITHOUT_TENANT.replace(
            "<Property Name=\"SharedComputerLicensing\" Value=\"1\" />",
            "<Property Name=\"tenantid\" Value=\"x\" />",
        );
        assert!(update(parsed(&xml), "Current", TENANT, "Contoso").is_err());
    }

    #[test]
    fn company_setting_is_created_when_absent() {
        let xml = WITHOUT_TENANT.replace(
            "</Configuration>",
            "<Property Name=\"TenantId\" Value=\"\" /></Configuration>",
        );
        let doc = update(parsed(&xml), "Current", TENANT, "Contoso").unwrap();
        assert_eq!(doc.company_name(), Some("Contoso"));
    }

    #[test]
    fn rejects_other_document_types() {
        let err = ConfigurationDocument::parse(b"<Package ID=\"x\" />").unwrap_err();
        assert!(matches!(err, Error::WrongDocumentType { .. }));
    }

    #[test]
    fn rejects_non_guid_identifier() {
        let err = ConfigurationDocument::parse(b"<Configuration ID=\"not-a-guid\" />").unwrap_err();
        assert!(matches!(err, Error::InvalidIdentifier { .. }));
    }

    #[tokio::test]
    async fn failed_edit_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("Configuration.xml");
        std::fs::write(&template, WITHOUT_TENANT).unwrap();
        let destination = dir.path().join("config").join("Configuration.xml");

        let result = edit_copy(&template, &destination, "Current", TENANT, "Contoso").await;

        assert!(matches!(result, Err(Error::ConfigFieldNotFound(_))));
        assert!(!destination.exists());
    }

    #[tokio::test]
    async fn edit_copy_leaves_template_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("Configuration.xml");
        std::fs::write(&template, CONFIGURATION).unwrap();
        let destination = dir.path().join("config").join("Configuration.xml");

        edit_copy(&template, &destination, "Current", TENANT, "Contoso")
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&template).unwrap(), CONFIGURATION);
        let written = ConfigurationDocument::load(&destination).await.unwrap();
        assert_eq!(written.property(TENANT_ID_PROPERTY), Some(TENANT));
    }
}
