//! Remote drive client abstraction.
//!
//! The pipeline only depends on the narrow [`DriveClient`] trait: paginated
//! folder listing and content download/export. [`HttpDriveClient`] implements
//! it against the Google Drive v3 REST API using a stored bearer token;
//! credential acquisition (the OAuth dance) happens outside this crate.

mod http;
mod types;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use http::HttpDriveClient;
pub use types::{FilePage, RemoteFile, FOLDER_MIME};

/// Configuration for one named remote drive source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveSourceConfig {
    /// Friendly name, e.g. "personal" or "work".
    pub name: String,
    /// Optional folder id scoping enumeration to a subtree.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_folder_id: Option<String>,
    /// Path to the stored credential/token file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_file: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// Errors from the remote drive transport.
#[derive(Debug, Error)]
pub enum DriveError {
    #[error("drive '{0}' is not authenticated")]
    NotAuthenticated(String),

    #[error("credential file error: {0}")]
    Credentials(String),

    #[error("drive API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Progress callback for downloads: (bytes_downloaded, total_bytes).
pub type DownloadProgress<'a> = &'a (dyn Fn(u64, u64) + Send + Sync);

/// Narrow client interface to a remote drive.
#[async_trait]
pub trait DriveClient: Send + Sync {
    /// Verify stored credentials against the API. Returns `false` (not an
    /// error) when the drive is simply not usable.
    async fn authenticate(&self) -> Result<bool, DriveError>;

    /// Fetch one page of the listing under `folder_id` (drive root when
    /// `None`). Folders are included so callers can recurse.
    async fn list_page(
        &self,
        folder_id: Option<&str>,
        page_token: Option<&str>,
    ) -> Result<FilePage, DriveError>;

    /// Download file content, exporting google-native formats as needed.
    /// Emits progress proportional to bytes transferred.
    async fn download(
        &self,
        file: &RemoteFile,
        progress: DownloadProgress<'_>,
    ) -> Result<Vec<u8>, DriveError>;
}
