//! Win32 app records: listing, creation bodies and relationships.

use crate::packager::{
    catalog::{contract::PublishedPackageRecord, token::TrackingToken},
    error::{Error, Result},
    manifest::{DetectionRule, PackageManifest},
    settings::SupersedenceKind,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};

/// OData type of the records this client manages.
pub const WIN32_APP_TYPE: &str = "#microsoft.graph.win32LobApp";

/// List filter restricting results to win32 apps.
pub const WIN32_APP_FILTER: &str = "isof('microsoft.graph.win32LobApp')";

/// One page of a collection response.
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    /// Items on this page.
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    /// Absolute URL of the next page.
    #[serde(rename = "@odata.nextLink", default)]
    pub next_link: Option<String>,
}

/// Record as returned by the service.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MobileApp {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub display_version: Option<String>,
}

impl From<MobileApp> for PublishedPackageRecord {
    fn from(app: MobileApp) -> Self {
        Self {
            id: app.id,
            display_name: app.display_name.unwrap_or_default(),
            notes: app.notes.unwrap_or_default(),
            display_version: app.display_version.unwrap_or_default(),
        }
    }
}

/// Returns whether a display name passes the listing filter.
///
/// The service's own name filtering is inconsistent across API versions, so
/// names are matched here: case-insensitive substring, empty filter matches all.
pub fn name_matches(display_name: &str, filter: &str) -> bool {
    filter.is_empty() || display_name.to_lowercase().contains(&filter.to_lowercase())
}

/// Builds the creation body for a manifest.
///
/// Unknown manifest keys are merged in last, so a template can set any
/// service field the manifest does not model.
pub fn app_body(
    manifest: &PackageManifest,
    file_name: &str,
    icon: Option<Value>,
) -> Result<Value> {
    let rules = manifest
        .detection_rules
        .iter()
        .map(detection_rule)
        .collect::<Result<Vec<_>>>()?;

    let mut body = json!({
        "@odata.type": WIN32_APP_TYPE,
        "displayName": manifest.display_name,
        "description": manifest.description,
        "publisher": manifest.publisher,
        "displayVersion": manifest.version,
        "notes": TrackingToken::new(&manifest.tracking_guid).to_notes()?,
        "fileName": file_name,
        "setupFilePath": manifest.setup_file,
        "installCommandLine": manifest.install,
        "uninstallCommandLine": manifest.uninstall,
        "isFeatured": false,
        "installExperience": {
            "runAsAccount": "system",
            "deviceRestartBehavior": "suppress",
        },
        "returnCodes": default_return_codes(),
        "rules": rules,
    });

    if let Value::Object(fields) = &mut body {
        if let Some(icon) = icon {
            fields.insert("largeIcon".into(), icon);
        }
        merge(fields, &manifest.extra);
    }
    Ok(body)
}

/// Icon payload for the creation body.
pub fn icon_value(bytes: &[u8], mime_type: &str) -> Value {
    use base64::Engine;
    json!({
        "@odata.type": "#microsoft.graph.mimeContent",
        "type": mime_type,
        "value": base64::engine::general_purpose::STANDARD.encode(bytes),
    })
}

/// MIME type for an icon file name.
pub fn icon_mime_type(file_name: &str) -> &'static str {
    let lower = file_name.to_lowercase();
    if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        "image/jpeg"
    } else {
        "image/png"
    }
}

fn default_return_codes() -> Value {
    json!([
        {"returnCode": 0, "type": "success"},
        {"returnCode": 1707, "type": "success"},
        {"returnCode": 3010, "type": "softReboot"},
        {"returnCode": 1641, "type": "hardReboot"},
        {"returnCode": 1618, "type": "retry"},
    ])
}

fn detection_rule(rule: &DetectionRule) -> Result<Value> {
    let mut value = match rule.kind.to_lowercase().as_str() {
        "registry" => json!({
            "@odata.type": "#microsoft.graph.win32LobAppRegistryRule",
            "ruleType": "detection",
            "check32BitOn64System": rule.check_32bit_on_64_system,
            "keyPath": rule.key_path,
            "valueName": rule.value_name,
            "operationType": rule.operation,
            "operator": rule.operator,
            "comparisonValue": rule.value,
        }),
        "file" => json!({
            "@odata.type": "#microsoft.graph.win32LobAppFileSystemRule",
            "ruleType": "detection",
            "check32BitOn64System": rule.check_32bit_on_64_system,
            "path": rule.key_path,
            "fileOrFolderName": rule.value_name,
            "operationType": rule.operation,
            "operator": rule.operator,
            "comparisonValue": rule.value,
        }),
        other => {
            return Err(Error::GenericError(format!(
                "unsupported detection rule kind {other:?} ({})",
                rule.value_name
            )));
        }
    };

    if let Value::Object(fields) = &mut value {
        merge(fields, &rule.extra);
    }
    Ok(value)
}

fn merge(fields: &mut Map<String, Value>, extra: &Map<String, Value>) {
    for (key, value) in extra {
        fields.insert(key.clone(), value.clone());
    }
}

/// Body of the relationship update marking `superseded_ids` as superseded.
pub fn supersedence_body(superseded_ids: &[String], kind: SupersedenceKind) -> Value {
    let relationships: Vec<Value> = superseded_ids
        .iter()
        .map(|id| {
            json!({
                "@odata.type": "#microsoft.graph.mobileAppSupersedence",
                "targetId": id,
                "supersedenceType": kind.as_str(),
            })
        })
        .collect();
    json!({ "relationships": relationships })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> PackageManifest {
        let mut extra = Map::new();
        extra.insert("minimumSupportedWindowsRelease".into(), json!("21H2"));
        PackageManifest {
            version: "16.0.18025.20160".into(),
            display_name: "Microsoft 365 Apps for enterprise, Current, x64".into(),
            publisher: "Microsoft".into(),
            tracking_guid: "3f1c2a4e-8d2b-4f6a-9c1e-5b7d9e0a1f23".into(),
            setup_file: "setup.exe".into(),
            detection_rules: vec![DetectionRule {
                kind: "registry".into(),
                key_path: r"HKLM\SOFTWARE\Microsoft\Office\ClickToRun\Configuration".into(),
                value_name: "VersionToReport".into(),
                operation: "version".into(),
                operator: "greaterThanOrEqual".into(),
                value: "16.0.18025.20160".into(),
                ..Default::default()
            }],
            extra,
            ..Default::default()
        }
    }

    #[test]
    fn body_carries_token_rules_and_template_extras() {
        let body = app_body(&manifest(), "setup.intunewin", None).unwrap();

        assert_eq!(body["@odata.type"], WIN32_APP_TYPE);
        assert_eq!(body["displayVersion"], "16.0.18025.20160");
        assert_eq!(body["notes"], "{\"Guid\":\"3f1c2a4e-8d2b-4f6a-9c1e-5b7d9e0a1f23\"}");
        assert_eq!(body["minimumSupportedWindowsRelease"], "21H2");
        assert_eq!(body["rules"][0]["comparisonValue"], "16.0.18025.20160");
        assert_eq!(body["rules"][0]["operationType"], "version");
        assert!(body.get("largeIcon").is_none());
    }

    #[test]
    fn unknown_rule_kind_is_rejected() {
        let mut manifest = manifest();
        manifest.detection_rules[0].kind = "script".into();
        assert!(app_body(&manifest, "setup.intunewin", None).is_err());
    }

    #[test]
    fn supersedence_lists_every_old_record() {
        let body = supersedence_body(&["a".into(), "b".into()], SupersedenceKind::Replace);
        let relationships = body["relationships"].as_array().unwrap();
        assert_eq!(relationships.len(), 2);
        assert_eq!(relationships[1]["targetId"], "b");
        assert_eq!(relationships[0]["supersedenceType"], "replace");
    }

    #[test]
    fn page_parses_next_link_and_missing_fields() {
        let page: Page<MobileApp> = serde_json::from_str(
            r#"{"value":[{"id":"1","displayName":"Microsoft 365 Apps"}],"@odata.nextLink":"https://next"}"#,
        )
        .unwrap();
        assert_eq!(page.next_link.as_deref(), Some("https://next"));
        let record = PublishedPackageRecord::from(page.value[0].clone());
        assert_eq!(record.display_version, "");
        assert!(name_matches(&record.display_name, "microsoft 365 apps"));
        assert!(!name_matches("Visio", "Microsoft 365 Apps"));
    }
}
