//! Installer configuration document model.

use crate::packager::error::{Error, ErrorExt, Result};
use std::path::Path;
use xmltree::{Element, EmitterConfig, XMLNode};

/// Root element of a configuration document.
pub const ROOT_ELEMENT: &str = "Configuration";

/// Property holding the tenant identifier.
pub const TENANT_ID_PROPERTY: &str = "TenantId";

/// Property holding the shared-computer licensing mode.
pub const SHARED_LICENSING_PROPERTY: &str = "SharedComputerLicensing";

/// `AppSettings/Setup` entry holding the organization name.
pub const COMPANY_SETTING: &str = "Company";

/// A product entry of the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// Product identifier, e.g. `O365ProPlusRetail`.
    pub id: String,
    /// Applications excluded from the install.
    pub excluded_apps: Vec<String>,
}

/// Parsed installer configuration document.
///
/// Wraps the XML tree and exposes the handful of fields the pipeline reads
/// or writes. Every lookup matches elements by name and attribute, never by
/// position.
#[derive(Debug, Clone)]
pub struct ConfigurationDocument {
    root: Element,
}

impl ConfigurationDocument {
    /// Parses a document from XML text.
    ///
    /// # Errors
    ///
    /// - [`Error::XmlParse`] if the text is not well-formed
    /// - [`Error::WrongDocumentType`] if the root is not `<Configuration>`
    /// - [`Error::InvalidIdentifier`] if the root `ID` is missing or not a GUID
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let root = Element::parse(xml)?;

        if root.name != ROOT_ELEMENT {
            return Err(Error::WrongDocumentType {
                expected: ROOT_ELEMENT,
                found: root.name,
            });
        }

        let id = root.attributes.get("ID").cloned().unwrap_or_default();
        if uuid::Uuid::parse_str(&id).is_err() {
            return Err(Error::InvalidIdentifier {
                field: "Configuration/@ID",
                value: id,
            });
        }

        Ok(Self { root })
    }

    /// Reads and parses a document from disk.
    pub async fn load(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .fs_context("reading configuration document", path)?;
        Self::parse(&bytes)
    }

    /// Serializes the document as indented XML.
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let config = EmitterConfig::new().perform_indent(true);
        self.root.write_with_config(&mut out, config)?;
        Ok(out)
    }

    /// Writes the document to `path`, replacing any existing file.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let xml = self.to_xml()?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .fs_context("creating configuration output directory", parent)?;
        }
        tokio::fs::write(path, xml)
            .await
            .fs_context("writing configuration document", path)
    }

    /// Returns the document's own identifier (the tracking guid).
    pub fn id(&self) -> &str {
        self.root.attributes.get("ID").map_or("", String::as_str)
    }

    /// Returns the free-text description.
    pub fn description(&self) -> Option<&str> {
        self.root
            .get_child("Info")
            .and_then(|info| info.attributes.get("Description"))
            .map(String::as_str)
    }

    /// Returns the release channel.
    pub fn channel(&self) -> Option<&str> {
        self.add_element()
            .and_then(|add| add.attributes.get("Channel"))
            .map(String::as_str)
    }

    /// Returns the numeric edition code (`"64"` or `"32"`).
    pub fn edition(&self) -> Option<&str> {
        self.add_element()
            .and_then(|add| add.attributes.get("OfficeClientEdition"))
            .map(String::as_str)
    }

    /// Returns the product entries in document order.
    pub fn products(&self) -> Vec<Product> {
        let Some(add) = self.add_element() else {
            return Vec::new();
        };

        child_elements(add, "Product")
            .filter_map(|product| {
                let id = product.attributes.get("ID")?.clone();
                let excluded_apps = child_elements(product, "ExcludeApp")
                    .filter_map(|app| app.attributes.get("ID").cloned())
                    .collect();
                Some(Product { id, excluded_apps })
            })
            .collect()
    }

    /// Returns the product identifiers sorted ascending.
    pub fn sorted_product_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.products().into_iter().map(|p| p.id).collect();
        ids.sort();
        ids
    }

    /// Returns the value of the named property.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.root
            .children
            .iter()
            .filter_map(XMLNode::as_element)
            .find(|e| property_matches(e, name))
            .and_then(|e| e.attributes.get("Value"))
            .map(String::as_str)
    }

    /// Returns the organization name.
    pub fn company_name(&self) -> Option<&str> {
        self.root
            .get_child("AppSettings")
            .and_then(|settings| {
                child_elements(settings, "Setup")
                    .find(|setup| setup.attributes.get("Name").is_some_and(|n| n == COMPANY_SETTING))
            })
            .and_then(|setup| setup.attributes.get("Value"))
            .map(String::as_str)
    }

    /// Sets the release channel on the `<Add>` element.
    ///
    /// # Errors
    ///
    /// [`Error::ConfigFieldNotFound`] if the document has no `<Add>` element.
    pub fn set_channel(&mut self, channel: &str) -> Result<()> {
        let add = self
            .root
            .get_mut_child("Add")
            .ok_or_else(|| Error::ConfigFieldNotFound("Add".into()))?;
        add.attributes.insert("Channel".into(), channel.into());
        Ok(())
    }

    /// Overwrites the `Value` of the named property.
    ///
    /// # Errors
    ///
    /// [`Error::ConfigFieldNotFound`] if no property has that name.
    pub fn set_property(&mut self, name: &str, value: &str) -> Result<()> {
        let property = find_property_mut(&mut self.root, name)
            .ok_or_else(|| Error::ConfigFieldNotFound(format!("Property[@Name={name:?}]")))?;
        property.attributes.insert("Value".into(), value.into());
        Ok(())
    }

    /// Sets the organization name, creating the setting when absent.
    pub fn set_company_name(&mut self, name: &str) {
        if self.root.get_child("AppSettings").is_none() {
            self.root
                .children
                .push(XMLNode::Element(Element::new("AppSettings")));
        }
        let Some(settings) = self.root.get_mut_child("AppSettings") else {
            return;
        };

        let existing = settings
            .children
            .iter_mut()
            .filter_map(XMLNode::as_mut_element)
            .find(|e| e.name == "Setup" && e.attributes.get("Name").is_some_and(|n| n == COMPANY_SETTING));

        match existing {
            Some(setup) => {
                setup.attributes.insert("Value".into(), name.into());
            }
            None => {
                let mut setup = Element::new("Setup");
                setup.attributes.insert("Name".into(), COMPANY_SETTING.into());
                setup.attributes.insert("Value".into(), name.into());
                settings.children.push(XMLNode::Element(setup));
            }
        }
    }

    fn add_element(&self) -> Option<&Element> {
        self.root.get_child("Add")
    }
}

/// Matching rule for `<Property Name="...">` entries: exact, case-sensitive
/// comparison of the `Name` attribute.
fn property_matches(element: &Element, name: &str) -> bool {
    element.name == "Property" && element.attributes.get("Name").is_some_and(|n| n == name)
}

/// Finds the property entry with the given name among the root's children.
fn find_property_mut<'a>(root: &'a mut Element, name: &str) -> Option<&'a mut Element> {
    root.children
        .iter_mut()
        .filter_map(XMLNode::as_mut_element)
        .find(|e| property_matches(e, name))
}

fn child_elements<'a>(parent: &'a Element, name: &'a str) -> impl Iterator<Item = &'a Element> {
    parent
        .children
        .iter()
        .filter_map(XMLNode::as_element)
        .filter(move |e| e.name == name)
}
