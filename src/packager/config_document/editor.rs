//! Field updates applied to a staged configuration copy.

use super::{ConfigurationDocument, TENANT_ID_PROPERTY};
use crate::packager::error::Result;
use std::path::Path;

/// Applies channel, tenant and organization values to a document.
///
/// The channel is written verbatim; callers validate it against
/// [`Channel`](crate::packager::Channel) first. The tenant id goes into the
/// `Value` of the existing `TenantId` property.
///
/// # Errors
///
/// [`Error::ConfigFieldNotFound`](crate::packager::Error::ConfigFieldNotFound)
/// when the document has no `<Add>` element or no `TenantId` property. The
/// document is consumed, so a failed update leaves nothing half-applied
/// behind.
pub fn update(
    mut document: ConfigurationDocument,
    channel: &str,
    tenant_id: &str,
    organization_name: &str,
) -> Result<ConfigurationDocument> {
    document.set_channel(channel)?;
    document.set_property(TENANT_ID_PROPERTY, tenant_id)?;
    document.set_company_name(organization_name);
    Ok(document)
}

/// Loads `template`, applies [`update`], and writes the result to `destination`.
///
/// The template is only read. `destination` is overwritten, and only once
/// every field has been updated successfully.
pub async fn edit_copy(
    template: &Path,
    destination: &Path,
    channel: &str,
    tenant_id: &str,
    organization_name: &str,
) -> Result<ConfigurationDocument> {
    log::info!(
        "Editing configuration {} -> {}",
        template.display(),
        destination.display()
    );

    let document = ConfigurationDocument::load(template).await?;
    let document = update(document, channel, tenant_id, organization_name)?;
    document.save(destination).await?;

    log::debug!(
        "Configuration {} set to channel {channel}, tenant {tenant_id}",
        document.id()
    );
    Ok(document)
}
