//! Current-version lookup for release channels.
//!
//! The manifest's version-to-report detection rule carries the version a
//! channel is currently shipping. Where that comes from is injected through
//! [`VersionLookup`]:
//!
//! - [`ReleaseFeedLookup`] reads a JSON release feed over HTTP
//! - [`StaticVersionLookup`] answers from pinned values

mod feed;

pub use feed::{ChannelRelease, ReleaseFeedLookup};

use crate::packager::{
    error::{Error, Result},
    settings::Channel,
};
use async_trait::async_trait;
use std::collections::HashMap;

#[cfg(test)]
use mockall::automock;

/// Source of the currently shipping version of a channel.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait VersionLookup: Send + Sync {
    /// Returns the current version string for `channel`.
    async fn current_version(&self, channel: Channel) -> Result<String>;
}

/// Version lookup answering from a fixed table.
#[derive(Debug, Clone, Default)]
pub struct StaticVersionLookup {
    versions: HashMap<Channel, String>,
}

impl StaticVersionLookup {
    /// Creates a lookup from pinned channel versions.
    pub fn new(versions: HashMap<Channel, String>) -> Self {
        Self { versions }
    }

    /// Adds or replaces a pinned version.
    pub fn with(mut self, channel: Channel, version: impl Into<String>) -> Self {
        self.versions.insert(channel, version.into());
        self
    }
}

#[async_trait]
impl VersionLookup for StaticVersionLookup {
    async fn current_version(&self, channel: Channel) -> Result<String> {
        self.versions
            .get(&channel)
            .cloned()
            .ok_or_else(|| Error::ChannelVersionNotFound(channel.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_lookup_answers_pinned_channels_only() {
        let lookup = StaticVersionLookup::default().with(Channel::Current, "16.0.18025.20160");

        assert_eq!(
            lookup.current_version(Channel::Current).await.unwrap(),
            "16.0.18025.20160"
        );
        assert!(matches!(
            lookup.current_version(Channel::SemiAnnual).await,
            Err(Error::ChannelVersionNotFound(_))
        ));
    }
}
