//! Publish-or-skip policy.

use crate::packager::{
    catalog::{notes_track, PublishedPackageRecord},
    version::PackageVersion,
};
use std::fmt;

/// Why a run publishes or skips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionReason {
    /// Publishing was forced.
    Forced,
    /// No record tracks this package yet.
    FirstPublish,
    /// The manifest version is newer than the highest published one.
    Newer {
        /// Highest published version.
        existing: String,
    },
    /// A record exists but none reports a usable version.
    ExistingVersionUnknown,
    /// The highest published version is equal or newer.
    UpToDate {
        /// Highest published version.
        existing: String,
    },
    /// No catalog was attached, so nothing was compared.
    NotChecked,
}

/// Outcome of the version check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishDecision {
    /// Whether to create a new record.
    pub publish: bool,
    /// Why.
    pub reason: DecisionReason,
}

impl PublishDecision {
    fn publish(reason: DecisionReason) -> Self {
        Self {
            publish: true,
            reason,
        }
    }

    fn skip(reason: DecisionReason) -> Self {
        Self {
            publish: false,
            reason,
        }
    }

    /// Outcome of a run without a catalog.
    pub fn not_checked() -> Self {
        Self::skip(DecisionReason::NotChecked)
    }
}

impl fmt::Display for PublishDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            DecisionReason::Forced => f.write_str("publish (forced)"),
            DecisionReason::FirstPublish => f.write_str("publish (no published version)"),
            DecisionReason::Newer { existing } => write!(f, "publish (newer than {existing})"),
            DecisionReason::ExistingVersionUnknown => {
                f.write_str("skip (published record has no readable version)")
            }
            DecisionReason::UpToDate { existing } => write!(f, "skip (already at {existing})"),
            DecisionReason::NotChecked => f.write_str("not checked (no catalog)"),
        }
    }
}

/// Records whose tracking token matches `tracking_guid`.
pub fn tracked<'a>(
    records: &'a [PublishedPackageRecord],
    tracking_guid: &str,
) -> Vec<&'a PublishedPackageRecord> {
    records
        .iter()
        .filter(|r| notes_track(&r.notes, tracking_guid))
        .collect()
}

/// Decides whether `manifest_version` should be published.
///
/// In order:
/// 1. `force` publishes
/// 2. no tracked record publishes
/// 3. tracked records without a parseable version skip
/// 4. a manifest version not above the highest published version skips
/// 5. otherwise publish
///
/// Unparseable record versions are ignored when at least one record has a
/// usable version.
pub fn decide(
    manifest_version: &PackageVersion,
    tracked: &[&PublishedPackageRecord],
    force: bool,
) -> PublishDecision {
    if force {
        return PublishDecision::publish(DecisionReason::Forced);
    }
    if tracked.is_empty() {
        return PublishDecision::publish(DecisionReason::FirstPublish);
    }

    let highest = tracked
        .iter()
        .filter_map(|r| PackageVersion::parse(&r.display_version).ok())
        .max();

    match highest {
        None => PublishDecision::skip(DecisionReason::ExistingVersionUnknown),
        Some(existing) if *manifest_version <= existing => {
            PublishDecision::skip(DecisionReason::UpToDate {
                existing: existing.to_string(),
            })
        }
        Some(existing) => PublishDecision::publish(DecisionReason::Newer {
            existing: existing.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUID: &str = "3f1c2a4e-8d2b-4f6a-9c1e-5b7d9e0a1f23";

    fn record(id: &str, version: &str, guid: &str) -> PublishedPackageRecord {
        PublishedPackageRecord {
            id: id.into(),
            display_name: "Microsoft 365 Apps for enterprise".into(),
            notes: format!("{{\"Guid\":\"{guid}\"}}"),
            display_version: version.into(),
        }
    }

    fn v(s: &str) -> PackageVersion {
        PackageVersion::parse(s).unwrap()
    }

    #[test]
    fn numeric_comparison_publishes_nine_ten_over_nine_nine() {
        let records = [record("old", "9.9", GUID)];
        let decision = decide(&v("9.10"), &tracked(&records, GUID), false);
        assert!(decision.publish);
        assert_eq!(decision.reason, DecisionReason::Newer { existing: "9.9".into() });

        let decision = decide(&v("9.9"), &tracked(&[record("new", "9.10", GUID)], GUID), false);
        assert!(!decision.publish);
    }

    #[test]
    fn highest_of_several_records_wins() {
        let records = [
            record("a", "9.0", GUID),
            record("b", "10.0", GUID),
            record("c", "", GUID),
        ];
        let decision = decide(&v("9.5"), &tracked(&records, GUID), false);
        assert_eq!(decision.reason, DecisionReason::UpToDate { existing: "10.0".into() });
    }

    #[test]
    fn equal_version_skips() {
        let records = [record("a", "16.0.1.2", GUID)];
        assert!(!decide(&v("16.0.1.2"), &tracked(&records, GUID), false).publish);
    }

    #[test]
    fn force_always_publishes() {
        let records = [record("a", "99.0", GUID)];
        let decision = decide(&v("1.0"), &tracked(&records, GUID), true);
        assert!(decision.publish);
        assert_eq!(decision.reason, DecisionReason::Forced);
    }

    #[test]
    fn records_for_other_packages_are_ignored() {
        let records = [record("a", "99.0", "11111111-2222-3333-4444-555555555555")];
        let matched = tracked(&records, GUID);
        assert!(matched.is_empty());
        assert_eq!(decide(&v("1.0"), &matched, false).reason, DecisionReason::FirstPublish);
    }

    #[test]
    fn unchecked_decision_says_so() {
        let decision = PublishDecision::not_checked();
        assert!(!decision.publish);
        assert_eq!(decision.to_string(), "not checked (no catalog)");
    }

    #[test]
    fn empty_existing_version_skips() {
        let records = [record("a", "", GUID)];
        let decision = decide(&v("1.0"), &tracked(&records, GUID), false);
        assert!(!decision.publish);
        assert_eq!(decision.reason, DecisionReason::ExistingVersionUnknown);
    }
}
