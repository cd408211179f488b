//! Package manifests.
//!
//! - `model` - the manifest document and its detection rules
//! - `labels` - product and exclusion labels used in display names
//! - `builder` - merging a template with computed values

mod builder;
mod labels;
mod model;

pub use builder::{
    DESCRIPTION_SUFFIX, PRODUCT_IDS_RULE, SHARED_LICENSING_RULE, VERSION_RULE, build,
    description, display_name,
};
pub use labels::{EXCLUSION_SUFFIXES, PRODUCT_LABELS, exclusion_suffix, product_label};
pub use model::{DetectionRule, PackageManifest};
