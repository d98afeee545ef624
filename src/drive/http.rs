//! Google Drive v3 REST client.

use std::path::Path;

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;

use super::types::{FilePage, RemoteFile};
use super::{DownloadProgress, DriveClient, DriveError};

const API_BASE: &str = "https://www.googleapis.com/drive/v3";
const PAGE_SIZE: usize = 100;

/// Drive client using a stored bearer token over HTTPS.
pub struct HttpDriveClient {
    client: reqwest::Client,
    drive_name: String,
    token: String,
}

/// Stored credential file: either raw token text or a JSON object carrying
/// an `access_token` field (the shape OAuth tooling typically writes).
#[derive(Deserialize)]
struct StoredCredentials {
    access_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    files: Vec<ApiFile>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiFile {
    id: String,
    name: String,
    mime_type: String,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    modified_time: Option<String>,
    #[serde(default)]
    web_view_link: Option<String>,
}

impl HttpDriveClient {
    /// Build a client for one named drive from its credential file.
    pub fn from_credentials_file(drive_name: &str, path: &Path) -> Result<Self, DriveError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DriveError::Credentials(format!("cannot read {}: {}", path.display(), e))
        })?;
        let token = match serde_json::from_str::<StoredCredentials>(&raw) {
            Ok(creds) => creds.access_token,
            Err(_) => raw.trim().to_string(),
        };
        if token.is_empty() {
            return Err(DriveError::Credentials(format!(
                "{} contains no token",
                path.display()
            )));
        }
        Ok(Self::with_token(drive_name, token))
    }

    pub fn with_token(drive_name: &str, token: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .expect("Failed to create HTTP client"),
            drive_name: drive_name.to_string(),
            token,
        }
    }

    /// Build the files.list query for a folder scope.
    fn list_query(folder_id: Option<&str>) -> String {
        match folder_id {
            Some(id) => format!("trashed = false and '{}' in parents", id),
            None => "trashed = false".to_string(),
        }
    }

    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response, DriveError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if matches!(status.as_u16(), 401 | 403) {
            return Err(DriveError::NotAuthenticated(self.drive_name.clone()));
        }
        let body = response.text().await.unwrap_or_default();
        Err(DriveError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl DriveClient for HttpDriveClient {
    async fn authenticate(&self) -> Result<bool, DriveError> {
        // A one-item listing doubles as a token validity probe.
        let response = self
            .client
            .get(format!("{}/files", API_BASE))
            .bearer_auth(&self.token)
            .query(&[("pageSize", "1"), ("fields", "files(id)")])
            .send()
            .await?;
        match response.status().as_u16() {
            200 => Ok(true),
            401 | 403 => {
                tracing::warn!("drive '{}' token rejected by API", self.drive_name);
                Ok(false)
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(DriveError::Api { status, body })
            }
        }
    }

    async fn list_page(
        &self,
        folder_id: Option<&str>,
        page_token: Option<&str>,
    ) -> Result<FilePage, DriveError> {
        let query = Self::list_query(folder_id);
        let page_size = PAGE_SIZE.to_string();
        let mut request = self
            .client
            .get(format!("{}/files", API_BASE))
            .bearer_auth(&self.token)
            .query(&[
                ("q", query.as_str()),
                ("pageSize", page_size.as_str()),
                (
                    "fields",
                    "nextPageToken, files(id, name, mimeType, size, modifiedTime, webViewLink)",
                ),
            ]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = self.check_status(request.send().await?).await?;
        let listing: ListResponse = response.json().await?;

        let files = listing
            .files
            .into_iter()
            .map(|f| RemoteFile {
                id: f.id,
                name: f.name,
                mime_type: f.mime_type,
                size: f.size.and_then(|s| s.parse().ok()).unwrap_or(0),
                modified_time: f.modified_time.unwrap_or_default(),
                web_view_link: f.web_view_link.unwrap_or_default(),
                drive_name: self.drive_name.clone(),
            })
            .collect();

        Ok(FilePage {
            files,
            next_page_token: listing.next_page_token,
        })
    }

    async fn download(
        &self,
        file: &RemoteFile,
        progress: DownloadProgress<'_>,
    ) -> Result<Vec<u8>, DriveError> {
        let request = match file.export_mime_type() {
            Some(export_mime) => self
                .client
                .get(format!("{}/files/{}/export", API_BASE, file.id))
                .query(&[("mimeType", export_mime)]),
            None => self
                .client
                .get(format!("{}/files/{}", API_BASE, file.id))
                .query(&[("alt", "media")]),
        };

        let response = self.check_status(request.bearer_auth(&self.token).send().await?).await?;
        let total = response.content_length().unwrap_or(file.size);

        let mut content = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            content.extend_from_slice(&chunk);
            progress(content.len() as u64, total.max(content.len() as u64));
        }
        Ok(content)
    }
}
