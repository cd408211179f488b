//! Remote catalog credentials.

use std::fmt;

/// Client-credentials grant for the remote catalog.
///
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    /// Directory tenant to sign in to.
    pub tenant_id: String,
    /// Application (client) id.
    pub client_id: String,
    /// Application secret.
    pub client_secret: String,
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// How the new record relates to the records it supersedes.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupersedenceKind {
    /// Devices with the old package are updated in place.
    #[default]
    Update,
    /// The old package is uninstalled before the new one installs.
    Replace,
}

impl SupersedenceKind {
    /// Returns the service's name for this relationship type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::Replace => "replace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_secret() {
        let creds = ClientCredentials {
            tenant_id: "tenant".into(),
            client_id: "client".into(),
            client_secret: "hunter2".into(),
        };
        let printed = format!("{creds:?}");
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("<redacted>"));
    }
}
