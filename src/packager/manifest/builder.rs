//! Manifest generation from a template and a configuration document.

use super::{
    PackageManifest,
    labels::{exclusion_suffix, product_label},
};
use crate::packager::{
    config_document::{ConfigurationDocument, SHARED_LICENSING_PROPERTY},
    error::{Error, Result},
    lookup::VersionLookup,
    settings::{Arch, Channel},
};

/// Detection rule tag: installed product ids.
pub const PRODUCT_IDS_RULE: &str = "ProductReleaseIds";

/// Detection rule tag: version reported by the installed suite.
pub const VERSION_RULE: &str = "VersionToReport";

/// Detection rule tag: shared-computer licensing mode.
pub const SHARED_LICENSING_RULE: &str = "SharedComputerLicensing";

/// Text placed between the configuration description and the product ids.
pub const DESCRIPTION_SUFFIX: &str = "This package installs the following product IDs:";

/// Builds the manifest for one run.
///
/// Starts from a copy of `template` and fills in:
/// - `version` from `installer_version`
/// - `displayName` from [`display_name`]
/// - `description` from [`description`]
/// - `trackingGuid` from the configuration's own `ID`
/// - the product-ids, version-to-report and shared-licensing detection rules
///
/// The rules are located before anything is fetched, so a template missing
/// one fails without a network round-trip.
///
/// # Errors
///
/// [`Error::DetectionRuleNotFound`] if any of the three rules is absent, or
/// the lookup's error if the channel version cannot be obtained.
pub async fn build(
    template: &PackageManifest,
    config: &ConfigurationDocument,
    installer_version: &str,
    channel: Channel,
    lookup: &dyn VersionLookup,
) -> Result<PackageManifest> {
    for tag in [PRODUCT_IDS_RULE, VERSION_RULE, SHARED_LICENSING_RULE] {
        if template.rule_by_tag(tag).is_none() {
            return Err(Error::DetectionRuleNotFound(tag));
        }
    }

    let mut manifest = template.clone();
    manifest.version = installer_version.to_string();
    manifest.display_name = display_name(config, channel);
    manifest.description = description(config);
    manifest.tracking_guid = config.id().to_string();

    let product_ids = config.sorted_product_ids().join(",");
    let channel_version = lookup.current_version(channel).await?;
    let shared_licensing = config
        .property(SHARED_LICENSING_PROPERTY)
        .unwrap_or("0")
        .to_string();

    for (tag, value) in [
        (PRODUCT_IDS_RULE, product_ids),
        (VERSION_RULE, channel_version),
        (SHARED_LICENSING_RULE, shared_licensing),
    ] {
        let rule = manifest
            .rule_by_tag_mut(tag)
            .ok_or(Error::DetectionRuleNotFound(tag))?;
        log::debug!("Detection rule {tag} = {value}");
        rule.value = value;
    }

    log::info!(
        "Built manifest {:?} version {} (tracking {})",
        manifest.display_name,
        manifest.version,
        manifest.tracking_guid
    );
    Ok(manifest)
}

/// Composes the display name.
///
/// Order: product labels (document order, unknown ids skipped), exclusion
/// suffixes, channel name, architecture suffix; joined with `", "`.
pub fn display_name(config: &ConfigurationDocument, channel: Channel) -> String {
    let products = config.products();
    let mut parts: Vec<&str> = Vec::new();

    for product in &products {
        match product_label(&product.id) {
            Some(label) if !parts.contains(&label) => parts.push(label),
            Some(_) => {}
            None => log::debug!("No display label for product {}; skipping", product.id),
        }
    }

    for product in &products {
        for app in &product.excluded_apps {
            if let Some(suffix) = exclusion_suffix(app).filter(|s| !parts.contains(s)) {
                parts.push(suffix);
            }
        }
    }

    parts.push(channel.as_str());
    parts.push(Arch::from_edition(config.edition().unwrap_or_default()).suffix());
    parts.join(", ")
}

/// Composes the description from the configuration's own description and
/// its sorted product ids.
pub fn description(config: &ConfigurationDocument) -> String {
    let ids = config.sorted_product_ids().join(", ");
    let own = config.description().unwrap_or_default().trim();
    let own = own.trim_end_matches('.');

    if own.is_empty() {
        format!("{DESCRIPTION_SUFFIX} {ids}")
    } else {
        format!("{own}. {DESCRIPTION_SUFFIX} {ids}")
    }
}
