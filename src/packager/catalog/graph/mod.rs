//! Microsoft Graph catalog client.
//!
//! Implements [`CatalogClient`] over the `deviceAppManagement/mobileApps`
//! endpoints. Creating a record is a multi-call exchange:
//!
//! 1. Create the win32 app record
//! 2. Create a content version and a file entry sized from the archive
//! 3. Wait for the blob storage URI, upload the payload in blocks
//! 4. Commit with the archive's encryption metadata and wait for success
//! 5. Point the record at the committed content version

mod apps;
mod auth;
mod content;

pub use apps::{name_matches, supersedence_body, WIN32_APP_FILTER, WIN32_APP_TYPE};
pub use auth::{AccessToken, GRAPH_SCOPE};

use super::contract::{CatalogClient, PublishedPackageRecord};
use crate::packager::{
    error::{Error, ErrorExt, Result},
    manifest::PackageManifest,
    settings::{ClientCredentials, SupersedenceKind},
};
use apps::{MobileApp, Page};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use std::{path::Path, time::Duration};
use tokio::sync::Mutex;
use url::Url;

/// Default sign-in authority.
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com/";

/// Default API root. Supersedence is only exposed on the beta surface.
pub const DEFAULT_GRAPH_ROOT: &str = "https://graph.microsoft.com/beta/";

/// Endpoints and polling behaviour of a [`GraphCatalogClient`].
#[derive(Debug, Clone)]
pub struct GraphOptions {
    /// Sign-in authority; the tenant is appended.
    pub authority: Url,
    /// API root, ending with `/`.
    pub graph_root: Url,
    /// Delay between upload-state polls.
    pub poll_interval: Duration,
    /// Polls before giving up on an upload state.
    pub poll_attempts: u32,
}

impl GraphOptions {
    /// Options for the given endpoints with default polling.
    pub fn new(authority: Url, graph_root: Url) -> Self {
        Self {
            authority,
            graph_root,
            poll_interval: Duration::from_secs(5),
            poll_attempts: 120,
        }
    }

    /// Options for the public cloud endpoints.
    pub fn public_cloud() -> Result<Self> {
        Ok(Self::new(
            Url::parse(DEFAULT_AUTHORITY)?,
            Url::parse(DEFAULT_GRAPH_ROOT)?,
        ))
    }
}

#[derive(Debug, Default)]
struct Session {
    credentials: Option<ClientCredentials>,
    token: Option<AccessToken>,
}

#[derive(Deserialize)]
struct Created {
    id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentFile {
    #[serde(default)]
    upload_state: String,
    #[serde(default)]
    azure_storage_uri: Option<String>,
}

/// [`CatalogClient`] backed by Microsoft Graph.
#[derive(Debug)]
pub struct GraphCatalogClient {
    http: reqwest::Client,
    options: GraphOptions,
    session: Mutex<Session>,
}

impl GraphCatalogClient {
    /// Creates a client that must [`authenticate`](CatalogClient::authenticate) before use.
    pub fn new(http: reqwest::Client, options: GraphOptions) -> Self {
        Self {
            http,
            options,
            session: Mutex::new(Session::default()),
        }
    }

    /// Creates a client using an already issued token.
    pub fn with_token(http: reqwest::Client, options: GraphOptions, token: AccessToken) -> Self {
        Self {
            http,
            options,
            session: Mutex::new(Session {
                credentials: None,
                token: Some(token),
            }),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.options.graph_root.join(path)?)
    }

    fn app_path(id: &str) -> String {
        format!("deviceAppManagement/mobileApps/{id}")
    }

    /// Current bearer value, renewed when it is about to expire.
    async fn bearer(&self) -> Result<String> {
        let mut session = self.session.lock().await;
        let now = Utc::now();

        if let Some(token) = session.token.as_ref().filter(|t| !t.is_expired(now)) {
            return Ok(token.value().to_string());
        }

        let credentials = session.credentials.clone().ok_or_else(|| {
            Error::GenericError("catalog client is not authenticated".into())
        })?;
        log::debug!("Access token missing or expiring; signing in again");
        let token =
            auth::request_token(&self.http, &self.options.authority, &credentials).await?;
        let value = token.value().to_string();
        session.token = Some(token);
        Ok(value)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request.bearer_auth(self.bearer().await?).send().await?;
        check(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        Ok(self.send(self.http.get(url)).await?.json().await?)
    }

    async fn post_json<T: DeserializeOwned>(&self, url: Url, body: &Value) -> Result<T> {
        Ok(self.send(self.http.post(url).json(body)).await?.json().await?)
    }

    async fn load_icon(manifest: &PackageManifest) -> Result<Option<Value>> {
        let Some(icon) = manifest.icon.as_deref().filter(|i| !i.is_empty()) else {
            return Ok(None);
        };
        let path = Path::new(icon);
        let bytes = tokio::fs::read(path).await.fs_context("reading icon", path)?;
        Ok(Some(apps::icon_value(&bytes, apps::icon_mime_type(icon))))
    }

    /// Polls a content file until it reaches `wanted`, failing on any `*Failed` state.
    async fn wait_for_state(&self, file_url: &Url, wanted: &str) -> Result<ContentFile> {
        for attempt in 1..=self.options.poll_attempts {
            let file: ContentFile = self.get_json(file_url.clone()).await?;
            if upload_reached(&file.upload_state, wanted)? {
                return Ok(file);
            }
            log::debug!(
                "Upload state {} (waiting for {wanted}, poll {attempt})",
                file.upload_state
            );
            tokio::time::sleep(self.options.poll_interval).await;
        }
        Err(Error::Remote {
            status: "timeout".into(),
            message: format!("content file did not reach {wanted}"),
        })
    }

    async fn upload_blocks(&self, storage_uri: &str, payload: &[u8]) -> Result<()> {
        let mut block_ids = Vec::new();
        for (index, chunk) in payload.chunks(content::BLOCK_SIZE).enumerate() {
            let id = content::block_id(index);
            let url = format!("{storage_uri}&comp=block&blockid={id}");
            log::debug!("Uploading block {index} ({} bytes)", chunk.len());
            let response = self
                .http
                .put(url)
                .header("x-ms-blob-type", "BlockBlob")
                .body(chunk.to_vec())
                .send()
                .await?;
            check(response).await?;
            block_ids.push(id);
        }

        let response = self
            .http
            .put(format!("{storage_uri}&comp=blocklist"))
            .body(content::block_list_xml(&block_ids))
            .send()
            .await?;
        check(response).await?;
        log::info!("Uploaded {} block(s)", block_ids.len());
        Ok(())
    }
}

/// Turns an unsuccessful response into [`Error::Remote`] with the service message.
async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(remote_error(status, &body))
}

/// Builds the error for a failed call, preferring `error.message` from a JSON body.
fn remote_error(status: StatusCode, body: &str) -> Error {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string());
    Error::Remote {
        status: status.to_string(),
        message,
    }
}

/// Whether a polled upload state is `wanted`. `*Failed` and `*TimedOut` states end the wait.
fn upload_reached(state: &str, wanted: &str) -> Result<bool> {
    if state == wanted {
        return Ok(true);
    }
    if state.ends_with("Failed") || state.ends_with("TimedOut") {
        return Err(Error::Remote {
            status: state.to_string(),
            message: format!("content file did not reach {wanted}"),
        });
    }
    Ok(false)
}

/// Appends the matching records of one listing page and returns the next page, if any.
fn collect_page(
    page: Page<MobileApp>,
    display_name_filter: &str,
    records: &mut Vec<PublishedPackageRecord>,
) -> Result<Option<Url>> {
    records.extend(
        page.value
            .into_iter()
            .map(PublishedPackageRecord::from)
            .filter(|r| name_matches(&r.display_name, display_name_filter)),
    );
    Ok(page.next_link.as_deref().map(Url::parse).transpose()?)
}

#[async_trait]
impl CatalogClient for GraphCatalogClient {
    async fn authenticate(&self, credentials: &ClientCredentials) -> Result<()> {
        let token =
            auth::request_token(&self.http, &self.options.authority, credentials).await?;
        let mut session = self.session.lock().await;
        session.credentials = Some(credentials.clone());
        session.token = Some(token);
        log::info!("✓ Signed in");
        Ok(())
    }

    async fn list_packages(&self, display_name_filter: &str) -> Result<Vec<PublishedPackageRecord>> {
        let mut url = self.endpoint("deviceAppManagement/mobileApps")?;
        url.query_pairs_mut().append_pair("$filter", WIN32_APP_FILTER);

        let mut records = Vec::new();
        let mut next = Some(url);
        while let Some(url) = next.take() {
            let page: Page<MobileApp> = self.get_json(url).await?;
            next = collect_page(page, display_name_filter, &mut records)?;
        }

        log::info!(
            "Found {} record(s) matching {display_name_filter:?}",
            records.len()
        );
        Ok(records)
    }

    async fn create_package(
        &self,
        manifest: &PackageManifest,
        artifact: &Path,
    ) -> Result<PublishedPackageRecord> {
        let package = content::read_package(artifact).await?;
        let file_name = artifact
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| package.file_name.clone());

        let body = apps::app_body(manifest, &file_name, Self::load_icon(manifest).await?)?;
        let app: Created = self
            .post_json(self.endpoint("deviceAppManagement/mobileApps")?, &body)
            .await?;
        log::info!("Created record {} ({})", app.id, manifest.display_name);

        let versions_path = format!(
            "{}/microsoft.graph.win32LobApp/contentVersions",
            Self::app_path(&app.id)
        );
        let version: Created = self
            .post_json(self.endpoint(&versions_path)?, &json!({}))
            .await?;

        let files_path = format!("{versions_path}/{}/files", version.id);
        let file: Created = self
            .post_json(
                self.endpoint(&files_path)?,
                &json!({
                    "@odata.type": "#microsoft.graph.mobileAppContentFile",
                    "name": file_name,
                    "size": package.unencrypted_size,
                    "sizeEncrypted": package.encrypted.len(),
                    "manifest": null,
                    "isDependency": false,
                }),
            )
            .await?;
        let file_url = self.endpoint(&format!("{files_path}/{}", file.id))?;

        let ready = self
            .wait_for_state(&file_url, "azureStorageUriRequestSuccess")
            .await?;
        let storage_uri = ready.azure_storage_uri.ok_or_else(|| Error::Remote {
            status: ready.upload_state.clone(),
            message: "no storage URI returned".into(),
        })?;
        self.upload_blocks(&storage_uri, &package.encrypted).await?;

        let commit_url = self.endpoint(&format!("{files_path}/{}/commit", file.id))?;
        self.send(
            self.http
                .post(commit_url)
                .json(&json!({ "fileEncryptionInfo": package.encryption })),
        )
        .await?;
        self.wait_for_state(&file_url, "commitFileSuccess").await?;

        self.send(self.http.patch(self.endpoint(&Self::app_path(&app.id))?).json(&json!({
            "@odata.type": WIN32_APP_TYPE,
            "committedContentVersion": version.id,
        })))
        .await?;
        log::info!("✓ Content version {} committed", version.id);

        Ok(PublishedPackageRecord {
            id: app.id,
            display_name: manifest.display_name.clone(),
            notes: body["notes"].as_str().unwrap_or_default().to_string(),
            display_version: manifest.version.clone(),
        })
    }

    async fn supersede(
        &self,
        target_id: &str,
        superseded_ids: &[String],
        kind: SupersedenceKind,
    ) -> Result<()> {
        let url = self.endpoint(&format!("{}/updateRelationships", Self::app_path(target_id)))?;
        self.send(
            self.http
                .post(url)
                .json(&supersedence_body(superseded_ids, kind)),
        )
        .await?;
        log::info!(
            "✓ {target_id} supersedes {} record(s) ({})",
            superseded_ids.len(),
            kind.as_str()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_cloud_endpoints_join_relative_paths() {
        let options = GraphOptions::public_cloud().unwrap();
        let client = GraphCatalogClient::new(reqwest::Client::new(), options);
        let url = client
            .endpoint(&GraphCatalogClient::app_path("abc"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://graph.microsoft.com/beta/deviceAppManagement/mobileApps/abc"
        );
    }

    #[tokio::test]
    async fn unauthenticated_client_refuses_requests() {
        let client = GraphCatalogClient::new(
            reqwest::Client::new(),
            GraphOptions::public_cloud().unwrap(),
        );
        let err = client.bearer().await.unwrap_err();
        assert!(err.to_string().contains("not authenticated"));
    }

    #[tokio::test]
    async fn issued_token_is_used_until_expiry() {
        let token = AccessToken::new("issued", Utc::now() + chrono::Duration::hours(1));
        let client = GraphCatalogClient::with_token(
            reqwest::Client::new(),
            GraphOptions::public_cloud().unwrap(),
            token,
        );
        assert_eq!(client.bearer().await.unwrap(), "issued");
    }

    #[test]
    fn service_error_message_is_extracted_from_json_body() {
        let err = remote_error(
            StatusCode::BAD_REQUEST,
            r#"{"error":{"code":"BadRequest","message":"displayName is required"}}"#,
        );
        assert!(matches!(
            &err,
            Error::Remote { status, message }
                if status == "400 Bad Request" && message == "displayName is required"
        ));
    }

    #[test]
    fn non_json_error_body_is_kept_verbatim() {
        let err = remote_error(StatusCode::FORBIDDEN, "AuthorizationFailure");
        assert_eq!(
            err.to_string(),
            "remote catalog error (403 Forbidden): AuthorizationFailure"
        );
    }

    #[test]
    fn upload_polling_stops_on_wanted_or_terminal_state() {
        assert!(upload_reached("commitFileSuccess", "commitFileSuccess").unwrap());
        assert!(!upload_reached("commitFilePending", "commitFileSuccess").unwrap());
        assert!(
            !upload_reached("azureStorageUriRequestPending", "azureStorageUriRequestSuccess")
                .unwrap()
        );

        for state in ["commitFileFailed", "azureStorageUriRequestTimedOut"] {
            let err = upload_reached(state, "commitFileSuccess").unwrap_err();
            assert!(matches!(&err, Error::Remote { status, .. } if status == state));
        }
    }

    #[test]
    fn listing_pages_are_filtered_and_followed() {
        let mut records = Vec::new();
        let first: Page<MobileApp> = serde_json::from_str(
            r#"{"value":[
                {"id":"1","displayName":"Microsoft 365 Apps, Current"},
                {"id":"2","displayName":"Contoso VPN"}
            ],"@odata.nextLink":"https://graph.microsoft.com/beta/deviceAppManagement/mobileApps?$skiptoken=2"}"#,
        )
        .unwrap();
        let next = collect_page(first, "microsoft 365", &mut records).unwrap();
        assert_eq!(
            next.map(|u| u.query().map(str::to_string)),
            Some(Some("$skiptoken=2".to_string()))
        );

        let last: Page<MobileApp> = serde_json::from_str(
            r#"{"value":[{"id":"3","displayName":"Microsoft 365 Apps, SemiAnnual"}]}"#,
        )
        .unwrap();
        assert!(collect_page(last, "microsoft 365", &mut records).unwrap().is_none());

        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["1", "3"]);
    }

    #[test]
    fn malformed_next_link_is_an_error() {
        let page: Page<MobileApp> =
            serde_json::from_str(r#"{"value":[],"@odata.nextLink":"not a url"}"#).unwrap();
        let err = collect_page(page, "", &mut Vec::new()).unwrap_err();
        assert!(matches!(err, Error::Url(_)));
    }
}
