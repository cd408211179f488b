//! Client-credentials sign-in.

use crate::packager::{
    error::{Error, Result},
    settings::ClientCredentials,
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::fmt;
use url::Url;

/// Scope requested for the catalog API.
pub const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Tokens are refreshed this long before they expire.
const EXPIRY_MARGIN_SECS: i64 = 120;

/// Bearer token and its expiry.
#[derive(Clone)]
pub struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Wraps an existing token.
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// Returns the bearer value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns whether the token must be renewed at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) >= self.expires_at
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Deserialize)]
struct TokenError {
    error: String,
    #[serde(default)]
    error_description: String,
}

/// Token endpoint of `tenant` under `authority`.
pub fn token_endpoint(authority: &Url, tenant: &str) -> Result<Url> {
    Ok(authority.join(&format!("{tenant}/oauth2/v2.0/token"))?)
}

/// Requests a token with a client-credentials grant.
pub async fn request_token(
    client: &reqwest::Client,
    authority: &Url,
    credentials: &ClientCredentials,
) -> Result<AccessToken> {
    let endpoint = token_endpoint(authority, &credentials.tenant_id)?;
    log::info!(
        "Signing in to tenant {} as {}",
        credentials.tenant_id,
        credentials.client_id
    );

    let response = client
        .post(endpoint)
        .form(&[
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("scope", GRAPH_SCOPE),
            ("grant_type", "client_credentials"),
        ])
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        let message = serde_json::from_str::<TokenError>(&body)
            .map(|e| format!("{}: {}", e.error, e.error_description))
            .unwrap_or(body);
        return Err(Error::Remote {
            status: status.to_string(),
            message,
        });
    }

    let token: TokenResponse = serde_json::from_str(&body)?;
    let expires_at = Utc::now() + Duration::seconds(token.expires_in);
    log::debug!("Token valid until {expires_at}");
    Ok(AccessToken::new(token.access_token, expires_at))
}
