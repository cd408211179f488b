//! Human-readable labels for display names.

/// Product id → label. Ids not listed here are left out of display names.
pub const PRODUCT_LABELS: [(&str, &str); 5] = [
    ("O365ProPlusRetail", "Microsoft 365 Apps for enterprise"),
    ("O365BusinessRetail", "Microsoft 365 Apps for business"),
    ("VisioProRetail", "Visio Plan 2"),
    ("ProjectProRetail", "Project Online Desktop Client"),
    ("AccessRuntimeRetail", "Access Runtime"),
];

/// Excluded app id → display-name suffix.
pub const EXCLUSION_SUFFIXES: [(&str, &str); 2] = [
    ("Outlook", "no Outlook (classic)"),
    ("OutlookForWindows", "no Outlook (new)"),
];

/// Returns the label for a product id.
pub fn product_label(id: &str) -> Option<&'static str> {
    PRODUCT_LABELS
        .iter()
        .find(|(known, _)| *known == id)
        .map(|(_, label)| *label)
}

/// Returns the suffix for an excluded app id.
pub fn exclusion_suffix(app: &str) -> Option<&'static str> {
    EXCLUSION_SUFFIXES
        .iter()
        .find(|(known, _)| *known == app)
        .map(|(_, suffix)| *suffix)
}
