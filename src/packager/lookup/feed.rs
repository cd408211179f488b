//! HTTP release feed lookup.

use super::VersionLookup;
use crate::packager::{
    error::{Error, Result},
    settings::Channel,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

/// One channel entry of a release feed.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ChannelRelease {
    /// Channel name, e.g. `MonthlyEnterprise`.
    #[serde(alias = "channelId", alias = "Channel")]
    pub channel: String,

    /// Currently shipping version, e.g. `16.0.18025.20160`.
    #[serde(rename = "latestVersion", alias = "version", alias = "Version")]
    pub latest_version: String,
}

/// Looks up channel versions from a JSON feed.
///
/// The feed is an array of [`ChannelRelease`] entries. It is fetched on every
/// call; a run asks for one channel.
#[derive(Debug, Clone)]
pub struct ReleaseFeedLookup {
    client: reqwest::Client,
    url: Url,
}

impl ReleaseFeedLookup {
    /// Creates a lookup reading from `url`.
    pub fn new(client: reqwest::Client, url: Url) -> Self {
        Self { client, url }
    }

    /// Finds the entry for `channel` in a parsed feed.
    pub fn select(releases: &[ChannelRelease], channel: Channel) -> Option<&ChannelRelease> {
        releases.iter().find(|r| r.channel == channel.as_str())
    }
}

/// Interprets a feed response.
///
/// Non-2xx statuses become [`Error::Remote`] carrying the response body.
pub fn parse_feed(status: StatusCode, body: &str) -> Result<Vec<ChannelRelease>> {
    if !status.is_success() {
        return Err(Error::Remote {
            status: status.to_string(),
            message: body.trim().to_string(),
        });
    }
    Ok(serde_json::from_str(body)?)
}

#[async_trait]
impl VersionLookup for ReleaseFeedLookup {
    async fn current_version(&self, channel: Channel) -> Result<String> {
        log::debug!("Fetching release feed {}", self.url);

        let response = self.client.get(self.url.clone()).send().await?;
        let status = response.status();
        let body = response.text().await?;
        let releases = parse_feed(status, &body)?;
        let release = Self::select(&releases, channel)
            .ok_or_else(|| Error::ChannelVersionNotFound(channel.to_string()))?;

        log::info!("Channel {channel} is at {}", release.latest_version);
        Ok(release.latest_version.clone())
    }
}
